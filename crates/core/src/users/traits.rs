use async_trait::async_trait;

use crate::storage::Result;

use super::{UpsertUser, User};

/// Repository for local user records.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Atomically inserts or updates the user keyed by `open_id`.
    ///
    /// Returns `RepositoryError::Unavailable` when no backing store is
    /// configured, so callers can tell "nothing to write to" from a failed write.
    async fn upsert_user(&self, user: &UpsertUser) -> Result<()>;

    /// Gets a user by their external identity. Not found is `Ok(None)`.
    async fn get_user_by_open_id(&self, open_id: &str) -> Result<Option<User>>;
}
