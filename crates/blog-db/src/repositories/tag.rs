use std::{collections::HashMap, future::Future};

use sqlx::{Executor, PgPool, Postgres};

use crate::{
    error::StoreResult,
    models::{ArticleTagRow, Tag, WriteResult},
    repositories::batch,
};

/// Tag lookups the article store composes against.
///
/// [`PgTagStore`] is the database-backed implementation; tests substitute
/// wrappers to observe how often each lookup runs.
pub trait TagSource {
    /// Tags linked to one article, possibly none.
    fn list_by_article_id(&self, article_id: i32)
    -> impl Future<Output = StoreResult<Vec<Tag>>> + Send;

    /// Tags for every given article in a single round trip. Each requested id
    /// has an entry, empty when the article has no tags.
    fn list_map_by_article_ids(
        &self,
        article_ids: &[i32],
    ) -> impl Future<Output = StoreResult<HashMap<i32, Vec<Tag>>>> + Send;
}

#[derive(Clone, Debug)]
pub struct PgTagStore {
    pool: PgPool,
}

impl PgTagStore {
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl TagSource for PgTagStore {
    async fn list_by_article_id(&self, article_id: i32) -> StoreResult<Vec<Tag>> {
        list_by_article_id(&self.pool, article_id).await
    }

    async fn list_map_by_article_ids(
        &self,
        article_ids: &[i32],
    ) -> StoreResult<HashMap<i32, Vec<Tag>>> {
        list_map_by_article_ids(&self.pool, article_ids).await
    }
}

#[tracing::instrument(skip(executor))]
pub async fn list_by_article_id<'e, E>(executor: E, article_id: i32) -> StoreResult<Vec<Tag>>
where
    E: Executor<'e, Database = Postgres>,
{
    let tags = sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT t.id, t.name
            FROM tags t
            JOIN article_tags atg ON atg.tag_id = t.id
            WHERE atg.article_id = $1
            ORDER BY t.id
        "#,
    )
    .bind(article_id)
    .fetch_all(executor)
    .await?;
    Ok(tags)
}

#[tracing::instrument(skip(executor, article_ids), fields(count = article_ids.len()))]
pub async fn list_map_by_article_ids<'e, E>(
    executor: E,
    article_ids: &[i32],
) -> StoreResult<HashMap<i32, Vec<Tag>>>
where
    E: Executor<'e, Database = Postgres>,
{
    let rows: Vec<ArticleTagRow> = sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT atg.article_id, t.id, t.name
            FROM article_tags atg
            JOIN tags t ON t.id = atg.tag_id
            WHERE atg.article_id = ANY($1)
            ORDER BY atg.article_id, t.id
        "#,
    )
    .bind(article_ids)
    .fetch_all(executor)
    .await?;

    tracing::debug!(rows = rows.len(), "Fetched article tags");

    Ok(batch::group_by_key(
        article_ids,
        rows.into_iter().map(ArticleTagRow::into_keyed),
    ))
}

#[tracing::instrument(skip(executor))]
pub async fn create<'e, E>(executor: E, name: &str) -> StoreResult<Tag>
where
    E: Executor<'e, Database = Postgres>,
{
    let tag = sqlx::query_as(
        // language=PostgreSQL
        r#"
            INSERT INTO tags (name)
            VALUES ($1)
            RETURNING id, name
        "#,
    )
    .bind(name)
    .fetch_one(executor)
    .await?;
    Ok(tag)
}

/// Link a tag to an article. Linking an existing pair affects zero rows.
#[tracing::instrument(skip(executor))]
pub async fn attach<'e, E>(executor: E, article_id: i32, tag_id: i32) -> StoreResult<WriteResult>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            INSERT INTO article_tags (article_id, tag_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
        "#,
    )
    .bind(article_id)
    .bind(tag_id)
    .execute(executor)
    .await?;
    Ok(WriteResult {
        id: None,
        rows_affected: result.rows_affected(),
    })
}
