//! OAuth login and cookie sessions for sitepulse.
//!
//! This crate provides:
//! - A signed session token codec (HS256)
//! - The identity provider HTTP client (code exchange, identity lookup)
//! - The session authenticator with lazy user provisioning
//! - Axum extractors and the OAuth callback / logout / me routes

mod authenticator;
mod config;
mod cookies;
mod error;
mod extractors;
mod handlers;
mod provider;
mod state;
mod token;

pub use authenticator::Authenticator;
pub use config::AuthConfig;
pub use cookies::{clear_session_cookie, is_secure_request, session_cookie};
pub use error::AuthError;
pub use extractors::{AdminUser, CurrentUser, OptionalUser, NOT_ADMIN_ERR_MSG, UNAUTHED_ERR_MSG};
pub use handlers::auth_routes;
pub use provider::HttpIdentityProvider;
pub use state::AuthState;
pub use token::TokenCodec;

#[cfg(any(test, feature = "mock"))]
pub mod mock;
