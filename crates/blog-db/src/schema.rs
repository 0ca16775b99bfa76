//! Table definitions for the blog store.
//!
//! Every statement is idempotent (`IF NOT EXISTS`), so [`create_schema`] can
//! bootstrap a fresh database or a per-test schema. Evolving an existing
//! schema is left to whatever owns the deployment.

use sqlx::PgPool;

/// SQL schema for writers table
pub const WRITERS_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS writers (
    id SERIAL PRIMARY KEY,
    name TEXT NOT NULL
);
"#;

/// SQL schema for articles table
///
/// `writer_id` is nullable: an article may exist without a writer.
pub const ARTICLES_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS articles (
    id SERIAL PRIMARY KEY,
    title TEXT NOT NULL,
    body TEXT NOT NULL,
    created TIMESTAMPTZ NOT NULL,
    updated TIMESTAMPTZ NOT NULL,
    writer_id INTEGER NULL,
    CONSTRAINT fk_articles_writer FOREIGN KEY (writer_id) REFERENCES writers(id) ON DELETE SET NULL
);

-- Lookups by owner
CREATE INDEX IF NOT EXISTS idx_articles_writer_id ON articles(writer_id) WHERE writer_id IS NOT NULL;
"#;

/// SQL schema for tags table
pub const TAGS_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS tags (
    id SERIAL PRIMARY KEY,
    name TEXT NOT NULL
);
"#;

/// SQL schema for the article/tag link table
pub const ARTICLE_TAGS_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS article_tags (
    article_id INTEGER NOT NULL,
    tag_id INTEGER NOT NULL,
    PRIMARY KEY (article_id, tag_id),
    CONSTRAINT fk_article_tags_article FOREIGN KEY (article_id) REFERENCES articles(id) ON DELETE CASCADE,
    CONSTRAINT fk_article_tags_tag FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE
);

-- The primary key covers article_id lookups; this one covers the tag side
CREATE INDEX IF NOT EXISTS idx_article_tags_tag_id ON article_tags(tag_id);
"#;

/// Full database schema with all tables, in dependency order
pub fn full_schema() -> String {
    format!(
        "{}\n\n{}\n\n{}\n\n{}",
        WRITERS_SCHEMA, ARTICLES_SCHEMA, TAGS_SCHEMA, ARTICLE_TAGS_SCHEMA
    )
}

/// Create every table in the connection's current search path.
pub async fn create_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    let schema = full_schema();
    sqlx::raw_sql(&schema).execute(pool).await?;
    tracing::debug!("Blog schema ensured");
    Ok(())
}
