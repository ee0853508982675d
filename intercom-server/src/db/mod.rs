//! Catalog repository
//!
//! Explicit lookups by identifier against the catalog database. Lookups
//! return `Option` so a record deleted concurrently is an ordinary outcome
//! for callers, not an error.

pub mod commands;
pub mod intercoms;
pub mod saved;
pub mod sounds;

#[cfg(test)]
pub(crate) mod test_support {
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::SqlitePool;

    /// Single-connection in-memory catalog with the full schema
    pub async fn memory_db() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        intercom_common::db::create_schema(&pool).await.unwrap();
        pool
    }
}
