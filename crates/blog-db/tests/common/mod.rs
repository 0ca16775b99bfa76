use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use blog_db::{
    StoreResult,
    models::{Article, Tag},
    repositories::{
        article,
        tag::{PgTagStore, TagSource},
    },
    schema,
};
use sqlx::{PgPool, postgres::PgPoolOptions};
use uuid::Uuid;

pub fn database_url() -> Option<String> {
    let url = std::env::var("TEST_DATABASE_URL").ok();
    if url.is_none() {
        eprintln!("TEST_DATABASE_URL not set, skipping database test");
    }
    url
}

/// A pool bound to a freshly created Postgres schema.
///
/// Every connection of the pool has its `search_path` pointed at the schema,
/// so each test sees empty tables and sequences starting at 1.
pub struct TestDb {
    pub pool: PgPool,
    admin: PgPool,
    schema: String,
}

impl TestDb {
    /// `None` when no test database is configured.
    pub async fn connect() -> Option<Self> {
        let database_url = database_url()?;
        let schema = format!("blog_test_{}", Uuid::new_v4().simple());

        let admin = PgPoolOptions::new()
            .max_connections(1)
            .connect(&database_url)
            .await
            .expect("Failed to connect to test database");

        sqlx::query(&format!("CREATE SCHEMA {schema}"))
            .execute(&admin)
            .await
            .expect("Failed to create test schema");

        let search_path = schema.clone();
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .after_connect(move |conn, _meta| {
                let search_path = search_path.clone();
                Box::pin(async move {
                    sqlx::query(&format!("SET search_path TO {search_path}"))
                        .execute(conn)
                        .await?;
                    Ok(())
                })
            })
            .connect(&database_url)
            .await
            .expect("Failed to connect test pool");

        schema::create_schema(&pool)
            .await
            .expect("Failed to create tables");

        Some(Self {
            pool,
            admin,
            schema,
        })
    }

    pub fn tags(&self) -> PgTagStore {
        PgTagStore::new(self.pool.clone())
    }

    pub async fn cleanup(self) {
        self.pool.close().await;
        sqlx::query(&format!("DROP SCHEMA {} CASCADE", self.schema))
            .execute(&self.admin)
            .await
            .expect("Failed to drop test schema");
        self.admin.close().await;
    }
}

/// Create and return a persisted article.
pub async fn create_article(pool: &PgPool, title: &str, writer_id: Option<i32>) -> Article {
    let mut new = Article::new(title, format!("{title} body"));
    new.writer_id = writer_id;
    article::create(pool, &mut new)
        .await
        .expect("Failed to create article");
    new
}

/// Tag source that records how it is called before delegating to Postgres.
pub struct CountingTags {
    inner: PgTagStore,
    single_calls: AtomicUsize,
    batch_calls: AtomicUsize,
    last_batch: Mutex<Vec<i32>>,
}

impl CountingTags {
    pub fn new(inner: PgTagStore) -> Self {
        Self {
            inner,
            single_calls: AtomicUsize::new(0),
            batch_calls: AtomicUsize::new(0),
            last_batch: Mutex::new(Vec::new()),
        }
    }

    pub fn single_calls(&self) -> usize {
        self.single_calls.load(Ordering::SeqCst)
    }

    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    pub fn last_batch(&self) -> Vec<i32> {
        self.last_batch.lock().unwrap().clone()
    }
}

impl TagSource for CountingTags {
    async fn list_by_article_id(&self, article_id: i32) -> StoreResult<Vec<Tag>> {
        self.single_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.list_by_article_id(article_id).await
    }

    async fn list_map_by_article_ids(
        &self,
        article_ids: &[i32],
    ) -> StoreResult<HashMap<i32, Vec<Tag>>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_batch.lock().unwrap() = article_ids.to_vec();
        self.inner.list_map_by_article_ids(article_ids).await
    }
}
