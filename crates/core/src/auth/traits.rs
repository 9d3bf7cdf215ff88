use async_trait::async_trait;

use super::{AuthError, Identity, TokenResponse};

/// Result type for auth operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Client for the external OAuth authorization server.
///
/// Transport failures come back as [`AuthError::Transport`] and are never
/// retried.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchanges an authorization code for an access token.
    ///
    /// `state` encodes the redirect URI originally sent to the provider.
    async fn exchange_code(&self, code: &str, state: &str) -> Result<TokenResponse>;

    /// Looks up the identity behind an access token.
    async fn get_user_info(&self, access_token: &str) -> Result<Identity>;

    /// Looks up the identity behind one of our own session tokens.
    async fn get_user_info_by_jwt(&self, jwt_token: &str) -> Result<Identity>;
}
