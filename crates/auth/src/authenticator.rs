//! Session authentication with lazy user provisioning.

use std::sync::Arc;

use axum::http::HeaderMap;
use axum_extra::extract::CookieJar;
use chrono::{DateTime, Utc};
use sitepulse_core::auth::{AuthError, IdentityProvider};
use sitepulse_core::storage::RepositoryError;
use sitepulse_core::users::{UpsertUser, User, UserRepository};

use crate::token::TokenCodec;

/// Resolves the session cookie of a request to a local user record.
///
/// Stateless across calls. A user already in the store is resolved without
/// talking to the identity provider; a valid token whose user is missing is
/// reconciled by asking the provider who the token belongs to.
#[derive(Clone)]
pub struct Authenticator {
    cookie_name: String,
    tokens: TokenCodec,
    provider: Arc<dyn IdentityProvider>,
    users: Arc<dyn UserRepository>,
}

impl Authenticator {
    pub fn new(
        cookie_name: impl Into<String>,
        tokens: TokenCodec,
        provider: Arc<dyn IdentityProvider>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            cookie_name: cookie_name.into(),
            tokens,
            provider,
            users,
        }
    }

    /// Authenticates a request from its headers.
    ///
    /// # Errors
    ///
    /// - `NoSession`: the session cookie is absent
    /// - `InvalidSession`: the cookie is not a valid session token
    /// - `SyncFailed`: the token is valid but the user could not be provisioned
    /// - `UserNotFound`: provisioning succeeded yet no record exists
    /// - `StoreUnavailable`: no user store is configured
    /// - `Storage`: the store failed a lookup or the activity refresh
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<User, AuthError> {
        let jar = CookieJar::from_headers(headers);
        let token = jar
            .get(&self.cookie_name)
            .map(|cookie| cookie.value().to_string())
            .ok_or(AuthError::NoSession)?;

        let session = self
            .tokens
            .verify(Some(&token))
            .ok_or(AuthError::InvalidSession)?;

        let now = Utc::now();
        let user = match self
            .users
            .get_user_by_open_id(&session.open_id)
            .await
            .map_err(store_error)?
        {
            Some(user) => Some(user),
            None => self.sync_user(&token, now).await?,
        };

        let user = user.ok_or(AuthError::UserNotFound)?;

        self.users
            .upsert_user(&UpsertUser::touch(user.open_id.clone(), now))
            .await
            .map_err(store_error)?;

        Ok(user)
    }

    /// Provisions the user behind `token` from the identity provider.
    async fn sync_user(&self, token: &str, now: DateTime<Utc>) -> Result<Option<User>, AuthError> {
        tracing::info!("Session user missing from store, syncing from identity provider");

        let identity = self
            .provider
            .get_user_info_by_jwt(token)
            .await
            .map_err(|e| AuthError::SyncFailed(e.to_string()))?;

        let upsert = UpsertUser::new(identity.open_id.clone())
            .with_name(identity.name)
            .with_email(identity.email)
            .with_login_method(identity.login_method)
            .with_last_signed_in(now);

        self.users
            .upsert_user(&upsert)
            .await
            .map_err(|e| AuthError::SyncFailed(e.to_string()))?;

        self.users
            .get_user_by_open_id(&identity.open_id)
            .await
            .map_err(|e| AuthError::SyncFailed(e.to_string()))
    }
}

fn store_error(error: RepositoryError) -> AuthError {
    match error {
        RepositoryError::Unavailable => AuthError::StoreUnavailable,
        other => AuthError::Storage(other.to_string()),
    }
}
