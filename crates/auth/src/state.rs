//! Application state for auth.

use axum::extract::FromRef;
use sitepulse_core::auth::IdentityProvider;
use sitepulse_core::users::UserRepository;
use std::sync::Arc;

use crate::authenticator::Authenticator;
use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::provider::HttpIdentityProvider;
use crate::token::TokenCodec;

/// Shared state for auth handlers and extractors.
#[derive(Clone)]
pub struct AuthState {
    pub config: Arc<AuthConfig>,
    pub tokens: TokenCodec,
    pub provider: Arc<dyn IdentityProvider>,
    pub users: Arc<dyn UserRepository>,
    pub authenticator: Authenticator,
}

impl AuthState {
    /// Creates the state from explicit collaborators.
    pub fn new(
        config: AuthConfig,
        provider: Arc<dyn IdentityProvider>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        let tokens = TokenCodec::from_config(&config);
        let authenticator = Authenticator::new(
            config.cookie_name.clone(),
            tokens.clone(),
            provider.clone(),
            users.clone(),
        );

        Self {
            config: Arc::new(config),
            tokens,
            provider,
            users,
            authenticator,
        }
    }

    /// Creates the state with the HTTP identity provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_http_provider(
        config: AuthConfig,
        users: Arc<dyn UserRepository>,
    ) -> Result<Self, AuthError> {
        let provider = Arc::new(HttpIdentityProvider::new(&config)?);
        Ok(Self::new(config, provider, users))
    }
}

/// Allows AuthState to be extracted from a parent state.
impl<S> FromRef<S> for AuthState
where
    S: AsRef<AuthState>,
{
    fn from_ref(state: &S) -> Self {
        state.as_ref().clone()
    }
}
