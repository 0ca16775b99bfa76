// Single-query functions are generic over `E: Executor<'e, Database = Postgres>`
// so they accept both a `&PgPool` and a `&mut PgConnection` borrowed from a
// transaction. Mutations and multi-query reads take the `&PgPool` itself.

pub mod article;
pub mod batch;
pub mod tag;
pub mod writer;
