use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Auth errors for the sitepulse_auth crate.
///
/// This wraps the core `AuthError` and adds crate-specific error variants
/// for the HTTP layer.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Error from the core auth module (session taxonomy, provider, storage).
    #[error(transparent)]
    Core(#[from] sitepulse_core::auth::AuthError),

    /// OAuth callback called without `code` or `state`.
    #[error("code and state are required")]
    MissingParams,

    /// Session token could not be signed.
    #[error("token signing failed: {0}")]
    Token(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        use sitepulse_core::auth::AuthError as CoreError;

        let (status, message) = match &self {
            AuthError::MissingParams => (StatusCode::BAD_REQUEST, self.to_string()),
            AuthError::Core(CoreError::MissingOpenId) => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            AuthError::Core(_) | AuthError::Token(_) | AuthError::Config(_) => {
                tracing::error!(error = %self, "OAuth callback failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "OAuth callback failed".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
