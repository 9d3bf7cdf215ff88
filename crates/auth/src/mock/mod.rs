//! In-memory test doubles for the identity provider and the user store.
//!
//! Both count their calls so tests can assert which paths were taken.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use sitepulse_core::auth::{
    decode_state, AuthError, Identity, IdentityProvider, Result, TokenResponse,
};
use sitepulse_core::storage::{self, RepositoryError};
use sitepulse_core::users::{apply_upsert, plan_upsert, UpsertUser, User, UserRepository};

/// Access token handed out by [`MockIdentityProvider::exchange_code`].
pub const MOCK_ACCESS_TOKEN: &str = "tok";

/// Identity provider answering every lookup with a fixed outcome.
pub struct MockIdentityProvider {
    outcome: std::result::Result<Identity, AuthError>,
    exchange_calls: AtomicUsize,
    info_calls: AtomicUsize,
    jwt_calls: AtomicUsize,
    redirect_uris: Mutex<Vec<String>>,
}

impl MockIdentityProvider {
    pub fn returning(identity: Identity) -> Self {
        Self::with_outcome(Ok(identity))
    }

    pub fn failing(error: AuthError) -> Self {
        Self::with_outcome(Err(error))
    }

    fn with_outcome(outcome: std::result::Result<Identity, AuthError>) -> Self {
        Self {
            outcome,
            exchange_calls: AtomicUsize::new(0),
            info_calls: AtomicUsize::new(0),
            jwt_calls: AtomicUsize::new(0),
            redirect_uris: Mutex::new(Vec::new()),
        }
    }

    pub fn exchange_calls(&self) -> usize {
        self.exchange_calls.load(Ordering::SeqCst)
    }

    pub fn info_calls(&self) -> usize {
        self.info_calls.load(Ordering::SeqCst)
    }

    pub fn jwt_calls(&self) -> usize {
        self.jwt_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.exchange_calls() + self.info_calls() + self.jwt_calls()
    }

    /// Redirect URIs decoded from the `state` of each code exchange.
    pub async fn redirect_uris(&self) -> Vec<String> {
        self.redirect_uris.lock().await.clone()
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn exchange_code(&self, _code: &str, state: &str) -> Result<TokenResponse> {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);
        let redirect_uri = decode_state(state)?;
        self.redirect_uris.lock().await.push(redirect_uri);

        Ok(TokenResponse {
            access_token: MOCK_ACCESS_TOKEN.to_string(),
            token_type: Some("Bearer".to_string()),
            expires_in: None,
            refresh_token: None,
            scope: None,
            id_token: None,
        })
    }

    async fn get_user_info(&self, _access_token: &str) -> Result<Identity> {
        self.info_calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }

    async fn get_user_info_by_jwt(&self, _jwt_token: &str) -> Result<Identity> {
        self.jwt_calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}

/// User store backed by a `HashMap`, with the same upsert rules as the
/// SQLite repository.
#[derive(Clone, Default)]
pub struct InMemoryUserRepository {
    owner_open_id: Option<String>,
    users: Arc<RwLock<HashMap<String, User>>>,
    upserts: Arc<StdMutex<Vec<UpsertUser>>>,
    lookup_calls: Arc<AtomicUsize>,
    unavailable: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
    drop_writes: Arc<AtomicBool>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that promotes `owner_open_id` to admin on first insert.
    pub fn with_owner(owner_open_id: impl Into<String>) -> Self {
        Self {
            owner_open_id: Some(owner_open_id.into()),
            ..Self::default()
        }
    }

    /// Behave like a deployment without a database.
    pub fn set_unavailable(&self, value: bool) {
        self.unavailable.store(value, Ordering::SeqCst);
    }

    /// Make every upsert fail with a query error.
    pub fn fail_writes(&self, value: bool) {
        self.fail_writes.store(value, Ordering::SeqCst);
    }

    /// Accept upserts without storing them.
    pub fn drop_writes(&self, value: bool) {
        self.drop_writes.store(value, Ordering::SeqCst);
    }

    pub fn upsert_calls(&self) -> usize {
        self.recorded().len()
    }

    /// Upserts received so far, in call order.
    pub fn upserts(&self) -> Vec<UpsertUser> {
        self.recorded().clone()
    }

    fn recorded(&self) -> MutexGuard<'_, Vec<UpsertUser>> {
        self.upserts.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn lookup_calls(&self) -> usize {
        self.lookup_calls.load(Ordering::SeqCst)
    }

    pub fn reset_counters(&self) {
        self.recorded().clear();
        self.lookup_calls.store(0, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.users
            .read()
            .map(|users| users.len())
            .unwrap_or_else(|poisoned| poisoned.into_inner().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_available(&self) -> storage::Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable);
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn upsert_user(&self, user: &UpsertUser) -> storage::Result<()> {
        self.recorded().push(user.clone());
        self.check_available()?;

        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RepositoryError::QueryFailed("write rejected".to_string()));
        }
        if self.drop_writes.load(Ordering::SeqCst) {
            return Ok(());
        }

        let plan = plan_upsert(user, self.owner_open_id.as_deref(), Utc::now())?;
        let mut users = self
            .users
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let next_id = users.len() as i64 + 1;
        let stored = apply_upsert(users.get(&plan.open_id), &plan, next_id);
        users.insert(plan.open_id, stored);

        Ok(())
    }

    async fn get_user_by_open_id(&self, open_id: &str) -> storage::Result<Option<User>> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let users = self
            .users
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(users.get(open_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitepulse_core::users::Role;

    #[tokio::test]
    async fn repeated_upsert_keeps_one_row_and_bumps_last_signed_in() {
        let repo = InMemoryUserRepository::new();

        repo.upsert_user(&UpsertUser::new("u1")).await.unwrap();
        let first = repo.get_user_by_open_id("u1").await.unwrap().unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        repo.upsert_user(&UpsertUser::new("u1")).await.unwrap();
        let second = repo.get_user_by_open_id("u1").await.unwrap().unwrap();

        assert_eq!(repo.len(), 1);
        assert_eq!(first.id, second.id);
        assert!(second.last_signed_in > first.last_signed_in);
    }

    #[tokio::test]
    async fn owner_is_admin_on_first_insert() {
        let repo = InMemoryUserRepository::with_owner("owner");

        repo.upsert_user(&UpsertUser::new("owner")).await.unwrap();
        repo.upsert_user(&UpsertUser::new("someone")).await.unwrap();

        let owner = repo.get_user_by_open_id("owner").await.unwrap().unwrap();
        let someone = repo.get_user_by_open_id("someone").await.unwrap().unwrap();
        assert_eq!(owner.role, Role::Admin);
        assert_eq!(someone.role, Role::User);
    }

    #[tokio::test]
    async fn unavailable_store_is_distinguishable() {
        let repo = InMemoryUserRepository::new();
        repo.set_unavailable(true);

        let write = repo.upsert_user(&UpsertUser::new("u1")).await;
        let read = repo.get_user_by_open_id("u1").await;

        assert!(matches!(write, Err(RepositoryError::Unavailable)));
        assert!(matches!(read, Err(RepositoryError::Unavailable)));
    }

    #[tokio::test]
    async fn mock_provider_decodes_state() {
        let provider = MockIdentityProvider::failing(AuthError::MissingOpenId);
        let state = sitepulse_core::auth::encode_state("/dashboard");

        let token = provider.exchange_code("abc", &state).await.unwrap();

        assert_eq!(token.access_token, MOCK_ACCESS_TOKEN);
        assert_eq!(provider.redirect_uris().await, vec!["/dashboard".to_string()]);
        assert_eq!(provider.get_user_info("tok").await, Err(AuthError::MissingOpenId));
    }
}
