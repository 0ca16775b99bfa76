use sqlx::{Executor, PgPool, Postgres};

use crate::{
    error::{StoreError, StoreResult},
    models::{Writer, WriterWithArticles},
    repositories::article,
};

#[tracing::instrument(skip(executor))]
pub async fn get_by_id<'e, E>(executor: E, id: i32) -> StoreResult<Writer>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, name
            FROM writers
            WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?
    .ok_or(StoreError::not_found("writer", id))
}

/// Writer with every article it owns, possibly none.
#[tracing::instrument(skip(pool))]
pub async fn get_with_articles(pool: &PgPool, id: i32) -> StoreResult<WriterWithArticles> {
    let writer = get_by_id(pool, id).await?;
    let articles = article::list_by_writer_id(pool, id).await?;
    Ok(WriterWithArticles { writer, articles })
}

/// Writers are read-only to the rest of the layer; this exists to seed them.
#[tracing::instrument(skip(executor))]
pub async fn create<'e, E>(executor: E, name: &str) -> StoreResult<Writer>
where
    E: Executor<'e, Database = Postgres>,
{
    let writer = sqlx::query_as(
        // language=PostgreSQL
        r#"
            INSERT INTO writers (name)
            VALUES ($1)
            RETURNING id, name
        "#,
    )
    .bind(name)
    .fetch_one(executor)
    .await?;
    Ok(writer)
}
