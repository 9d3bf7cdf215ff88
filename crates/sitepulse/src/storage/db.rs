//! Process-wide database handle.

use std::sync::Arc;

use sitepulse_core::storage::{RepositoryError, Result};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tokio::sync::OnceCell;

use super::sqlite::{map_sqlx_error, CREATE_TABLES};

const MAX_CONNECTIONS: u32 = 5;

/// Lazily connected SQLite pool, shared by every repository.
///
/// The pool is created on first use. Concurrent first uses wait on the same
/// connection attempt; a failed attempt is retried by the next caller.
#[derive(Clone)]
pub struct Database {
    url: Option<Arc<str>>,
    pool: Arc<OnceCell<SqlitePool>>,
}

impl Database {
    /// Handle for `url`. `None` yields a handle whose every use fails with
    /// `RepositoryError::Unavailable`.
    pub fn new(url: Option<String>) -> Self {
        if url.is_none() {
            tracing::warn!("DATABASE_URL is not set, running without a database");
        }

        Self {
            url: url.map(Arc::from),
            pool: Arc::new(OnceCell::new()),
        }
    }

    /// Handle around an already connected pool.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self {
            url: None,
            pool: Arc::new(OnceCell::new_with(Some(pool))),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.url.is_some() || self.pool.initialized()
    }

    /// Returns the pool, connecting on first use.
    pub async fn pool(&self) -> Result<&SqlitePool> {
        if let Some(pool) = self.pool.get() {
            return Ok(pool);
        }

        let Some(url) = self.url.as_deref() else {
            return Err(RepositoryError::Unavailable);
        };

        self.pool
            .get_or_try_init(|| async move {
                tracing::info!("Connecting to database");
                SqlitePoolOptions::new()
                    .max_connections(MAX_CONNECTIONS)
                    .connect(url)
                    .await
                    .map_err(|e| {
                        tracing::warn!(error = %e, "Failed to connect to database");
                        RepositoryError::ConnectionFailed(e.to_string())
                    })
            })
            .await
    }

    /// Creates the tables if they do not exist.
    pub async fn migrate(&self) -> Result<()> {
        let pool = self.pool().await?;
        sqlx::query(CREATE_TABLES)
            .execute(pool)
            .await
            .map_err(|e| map_sqlx_error(e, "schema"))?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) async fn memory_database() -> Database {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    let db = Database::from_pool(pool);
    db.migrate().await.unwrap();
    db
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_database_is_unavailable() {
        let db = Database::new(None);

        assert!(!db.is_configured());
        assert!(matches!(db.pool().await, Err(RepositoryError::Unavailable)));
        assert!(matches!(db.migrate().await, Err(RepositoryError::Unavailable)));
    }

    #[tokio::test]
    async fn concurrent_first_use_connects_once() {
        let db = Database::new(Some("sqlite::memory:".to_string()));

        let (a, b) = tokio::join!(db.pool(), db.pool());
        let (a, b) = (a.unwrap(), b.unwrap());

        assert!(std::ptr::eq(a, b));
    }

    #[tokio::test]
    async fn migrate_is_idempotent() {
        let db = memory_database().await;
        db.migrate().await.unwrap();
    }
}
