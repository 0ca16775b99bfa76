use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};

use crate::{
    error::{StoreError, StoreResult},
    models::{
        Article, ArticleSummary, ArticleSummaryWithTags, ArticleWithTags, ArticleWithWriter,
        ArticleWithWriterName, Tag, WriteResult, db_now,
    },
    repositories::{batch, tag::TagSource},
};

/// Maximum number of articles returned by [`list_by_cursor`].
pub const PAGE_SIZE: i64 = 10;

const ENTITY: &str = "article";

/// Keyset cursor for [`list_by_cursor`]. Zero or negative means "first page".
pub const fn normalize_cursor(cursor: i32) -> i32 {
    if cursor <= 0 { i32::MAX } else { cursor }
}

/// Cursor for the page after `page`: the smallest id it contains.
pub fn next_cursor(page: &[Article]) -> Option<i32> {
    page.iter().map(|article| article.id).min()
}

/// Insert a new article, stamping `created` and `updated` with the same
/// instant. On success the caller's value carries the generated id and the
/// stamped timestamps.
#[tracing::instrument(skip(pool, article), fields(title = %article.title))]
pub async fn create(pool: &PgPool, article: &mut Article) -> StoreResult<WriteResult> {
    let now = db_now();

    // Dropping the transaction without commit rolls it back
    let mut tx = pool.begin().await?;

    let id: i32 = sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            INSERT INTO articles (title, body, created, updated, writer_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
        "#,
    )
    .bind(&article.title)
    .bind(&article.body)
    .bind(now)
    .bind(now)
    .bind(article.writer_id)
    .fetch_one(&mut *tx)
    .await
    .inspect_err(|e| tracing::warn!("Article insert failed, rolling back: {e}"))?;

    tx.commit().await?;

    article.id = id;
    article.created = now;
    article.updated = now;
    tracing::debug!(id, "Article created");

    Ok(WriteResult {
        id: Some(id),
        rows_affected: 1,
    })
}

#[tracing::instrument(skip(executor))]
pub async fn get_by_id<'e, E>(executor: E, id: i32) -> StoreResult<Article>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, title, body, created, updated, writer_id
            FROM articles
            WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?
    .ok_or(StoreError::not_found(ENTITY, id))
}

/// Persist title and body for `article.id` and advance `updated`.
///
/// `updated` never moves backwards: if the stored value is not older than
/// now, it is bumped by one microsecond instead. The stored value is written
/// back into `article`. An unknown id affects zero rows and leaves `article`
/// untouched.
#[tracing::instrument(skip(pool, article), fields(id = article.id))]
pub async fn update(pool: &PgPool, article: &mut Article) -> StoreResult<WriteResult> {
    let now = db_now();

    let mut tx = pool.begin().await?;

    let updated: Option<DateTime<Utc>> = sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            UPDATE articles
            SET title = $1,
                body = $2,
                updated = GREATEST($3, updated + INTERVAL '1 microsecond')
            WHERE id = $4
            RETURNING updated
        "#,
    )
    .bind(&article.title)
    .bind(&article.body)
    .bind(now)
    .bind(article.id)
    .fetch_optional(&mut *tx)
    .await
    .inspect_err(|e| tracing::warn!("Article update failed, rolling back: {e}"))?;

    tx.commit().await?;

    let rows_affected = match updated {
        Some(updated) => {
            article.updated = updated;
            1
        }
        None => 0,
    };

    Ok(WriteResult {
        id: None,
        rows_affected,
    })
}

/// Hard delete. Deleting an unknown id is not an error; it affects zero rows.
#[tracing::instrument(skip(pool))]
pub async fn delete(pool: &PgPool, id: i32) -> StoreResult<WriteResult> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            DELETE FROM articles
            WHERE id = $1
        "#,
    )
    .bind(id)
    .execute(&mut *tx)
    .await
    .inspect_err(|e| tracing::warn!("Article delete failed, rolling back: {e}"))?;

    tx.commit().await?;

    Ok(WriteResult {
        id: None,
        rows_affected: result.rows_affected(),
    })
}

/// Up to [`PAGE_SIZE`] articles with `id < cursor`, newest id first.
///
/// Pass the smallest id of the previous page (see [`next_cursor`]) to get the
/// next one. Rows inserted meanwhile get larger ids, so they never shift
/// pages already reached.
#[tracing::instrument(skip(executor))]
pub async fn list_by_cursor<'e, E>(executor: E, cursor: i32) -> StoreResult<Vec<Article>>
where
    E: Executor<'e, Database = Postgres>,
{
    let articles = sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, title, body, created, updated, writer_id
            FROM articles
            WHERE id < $1
            ORDER BY id DESC
            LIMIT $2
        "#,
    )
    .bind(normalize_cursor(cursor))
    .bind(PAGE_SIZE)
    .fetch_all(executor)
    .await?;
    Ok(articles)
}

/// Article with its writer's name. Uses an inner join: an article without a
/// writer is reported as not found, unlike [`get_by_id`].
#[tracing::instrument(skip(executor))]
pub async fn get_with_writer_name<'e, E>(executor: E, id: i32) -> StoreResult<ArticleWithWriterName>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT
                articles.id AS id,
                articles.title AS title,
                COALESCE(writers.name, '') AS writer_name
            FROM articles
            INNER JOIN writers ON writers.id = articles.writer_id
            WHERE articles.id = $1 AND articles.writer_id IS NOT NULL
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?
    .ok_or(StoreError::not_found(ENTITY, id))
}

/// Article with its nested writer. Inner join, same asymmetry as
/// [`get_with_writer_name`].
#[tracing::instrument(skip(executor))]
pub async fn get_with_writer<'e, E>(executor: E, id: i32) -> StoreResult<ArticleWithWriter>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT
                articles.id AS id,
                articles.title AS title,
                writers.id AS writer_id,
                writers.name AS writer_name
            FROM articles
            INNER JOIN writers ON writers.id = articles.writer_id
            WHERE articles.id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?
    .ok_or(StoreError::not_found(ENTITY, id))
}

#[tracing::instrument(skip(executor))]
pub async fn list_by_writer_id<'e, E>(executor: E, writer_id: i32) -> StoreResult<Vec<Article>>
where
    E: Executor<'e, Database = Postgres>,
{
    let articles = sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, title, body, created, updated, writer_id
            FROM articles
            WHERE writer_id = $1
        "#,
    )
    .bind(writer_id)
    .fetch_all(executor)
    .await?;
    Ok(articles)
}

/// The article and its tags.
///
/// The article is read through `executor` but the tags through `tags`, which
/// uses its own connection. Given a transaction as `executor`, the two reads
/// are not part of the same snapshot, and tags committed or removed between
/// them will show up in the result.
#[tracing::instrument(skip(executor, tags))]
pub async fn get_with_tags<'e, E, T>(executor: E, tags: &T, id: i32) -> StoreResult<ArticleWithTags>
where
    E: Executor<'e, Database = Postgres>,
    T: TagSource,
{
    let article = get_by_id(executor, id).await?;
    let tags = tags.list_by_article_id(id).await?;
    Ok(ArticleWithTags { article, tags })
}

/// Every article (id and title only) with its tags.
///
/// Two queries regardless of how many articles exist: one for the articles,
/// one batch lookup for all of their tags.
#[tracing::instrument(skip(executor, tags))]
pub async fn list_with_tags<'e, E, T>(
    executor: E,
    tags: &T,
) -> StoreResult<Vec<ArticleSummaryWithTags>>
where
    E: Executor<'e, Database = Postgres>,
    T: TagSource,
{
    let summaries: Vec<ArticleSummary> = sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, title
            FROM articles
            ORDER BY id
        "#,
    )
    .fetch_all(executor)
    .await?;

    let ids: Vec<i32> = summaries.iter().map(|summary| summary.id).collect();
    let tag_map = tags.list_map_by_article_ids(&ids).await?;

    Ok(attach_tags(summaries, tag_map))
}

fn attach_tags(
    summaries: Vec<ArticleSummary>,
    mut tag_map: HashMap<i32, Vec<Tag>>,
) -> Vec<ArticleSummaryWithTags> {
    summaries
        .into_iter()
        .map(|summary| {
            let tags = batch::take_or_empty(&mut tag_map, &summary.id);
            summary.with_tags(tags)
        })
        .collect()
}
