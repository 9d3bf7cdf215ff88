use std::sync::Arc;

use sitepulse_auth::{AuthConfig, AuthState};
use sitepulse_core::analytics::AnalyticsRepository;
use sitepulse_core::users::UserRepository;

use crate::config::Config;
use crate::notify::OwnerNotifier;
use crate::storage::sqlite::{AnalyticsStore, UserStore};
use crate::storage::Database;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Database,
    pub analytics: Arc<dyn AnalyticsRepository>,
    pub notifier: OwnerNotifier,
    pub auth: AuthState,
}

impl AppState {
    /// Wires the SQLite repositories and the HTTP identity provider.
    pub fn from_config(config: Config, auth_config: AuthConfig) -> anyhow::Result<Self> {
        let db = Database::new(config.database_url.clone());
        let users: Arc<dyn UserRepository> = Arc::new(UserStore::new(
            db.clone(),
            auth_config.owner_open_id.clone(),
        ));
        let auth = AuthState::with_http_provider(auth_config, users)?;

        Self::new(config, db, auth)
    }

    /// Builds the state around an existing database handle and auth state.
    pub fn new(config: Config, db: Database, auth: AuthState) -> anyhow::Result<Self> {
        let notifier =
            OwnerNotifier::new(config.forge_api_url.clone(), config.forge_api_key.clone())?;

        Ok(Self {
            analytics: Arc::new(AnalyticsStore::new(db.clone())),
            config: Arc::new(config),
            db,
            notifier,
            auth,
        })
    }
}

impl AsRef<AuthState> for AppState {
    fn as_ref(&self) -> &AuthState {
        &self.auth
    }
}
