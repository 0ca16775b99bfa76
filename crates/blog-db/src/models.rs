use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Row, postgres::PgRow};

/// Writer model - the author of articles, read-only in this layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Writer {
    /// Unique writer identifier
    pub id: i32,
    /// Display name
    pub name: String,
}

/// Article model - the persisted columns of an article and nothing else
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Article {
    /// Unique article identifier, assigned by the store on create
    pub id: i32,
    pub title: String,
    pub body: String,
    /// When the article was created, stamped once by the store
    pub created: DateTime<Utc>,
    /// When the article was last updated, stamped by the store
    pub updated: DateTime<Utc>,
    /// Owning writer, immutable once the article exists
    pub writer_id: Option<i32>,
}

impl Article {
    /// Build an unsaved article. `id` and timestamps are placeholders until
    /// the store stamps them.
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: 0,
            title: title.into(),
            body: body.into(),
            created: DateTime::default(),
            updated: DateTime::default(),
            writer_id: None,
        }
    }

    /// Link the unsaved article to a writer.
    pub fn with_writer(mut self, writer_id: i32) -> Self {
        self.writer_id = Some(writer_id);
        self
    }
}

/// Tag model - linked to articles through `article_tags`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Tag {
    /// Unique tag identifier
    pub id: i32,
    /// Tag label
    pub name: String,
}

/// One row of the article/tag join, keyed by the owning article
#[derive(Debug, Clone, FromRow)]
pub(crate) struct ArticleTagRow {
    pub(crate) article_id: i32,
    pub(crate) id: i32,
    pub(crate) name: String,
}

impl ArticleTagRow {
    pub(crate) fn into_keyed(self) -> (i32, Tag) {
        (
            self.article_id,
            Tag {
                id: self.id,
                name: self.name,
            },
        )
    }
}

/// Article projected with its writer's display name.
///
/// Only produced by an inner join, so an article without a writer never
/// yields one of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ArticleWithWriterName {
    pub id: i32,
    pub title: String,
    /// `''` when the joined name is NULL
    pub writer_name: String,
}

/// Article projected with its nested writer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleWithWriter {
    pub id: i32,
    pub title: String,
    pub writer: Writer,
}

impl<'r> FromRow<'r, PgRow> for ArticleWithWriter {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            writer: Writer {
                id: row.try_get("writer_id")?,
                name: row.try_get("writer_name")?,
            },
        })
    }
}

/// Full article plus the tags linked to it at read time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleWithTags {
    #[serde(flatten)]
    pub article: Article,
    pub tags: Vec<Tag>,
}

/// Narrow article projection used by list views
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ArticleSummary {
    pub id: i32,
    pub title: String,
}

/// Narrow article projection with its tags attached
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleSummaryWithTags {
    pub id: i32,
    pub title: String,
    pub tags: Vec<Tag>,
}

impl ArticleSummary {
    pub fn with_tags(self, tags: Vec<Tag>) -> ArticleSummaryWithTags {
        ArticleSummaryWithTags {
            id: self.id,
            title: self.title,
            tags,
        }
    }
}

/// Writer plus every article it owns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriterWithArticles {
    #[serde(flatten)]
    pub writer: Writer,
    pub articles: Vec<Article>,
}

/// Outcome of a mutation: the generated id (inserts only) and affected rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteResult {
    pub id: Option<i32>,
    pub rows_affected: u64,
}

/// Current time at the precision Postgres stores (microseconds), so a stamped
/// value compares equal to what is read back.
pub fn db_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_now_has_microsecond_precision() {
        let now = db_now();
        assert_eq!(now.timestamp_subsec_nanos() % 1_000, 0);
    }

    #[test]
    fn test_new_article_is_unsaved() {
        let article = Article::new("Title", "Body").with_writer(7);
        assert_eq!(article.id, 0);
        assert_eq!(article.writer_id, Some(7));
        assert_eq!(article.title, "Title");
    }

    #[test]
    fn test_summary_with_tags() {
        let summary = ArticleSummary {
            id: 3,
            title: "Hello".to_string(),
        };
        let tag = Tag {
            id: 1,
            name: "rust".to_string(),
        };
        let tagged = summary.with_tags(vec![tag.clone()]);
        assert_eq!(tagged.id, 3);
        assert_eq!(tagged.tags, vec![tag]);
    }

    #[test]
    fn test_writer_with_articles_serializes_flat() {
        let value = WriterWithArticles {
            writer: Writer {
                id: 1,
                name: "alice".to_string(),
            },
            articles: vec![],
        };
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["name"], "alice");
        assert!(json["articles"].as_array().unwrap().is_empty());
    }
}
