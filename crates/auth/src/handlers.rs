//! HTTP handlers for auth routes.

use axum::{
    extract::{FromRef, Query, State},
    http::{header::LOCATION, HeaderMap, StatusCode, Uri},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::CookieJar;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use sitepulse_core::auth::AuthError as CoreError;
use sitepulse_core::serde::deserialize_optional_string;
use sitepulse_core::storage::RepositoryError;
use sitepulse_core::users::UpsertUser;

use crate::cookies::{clear_session_cookie, is_secure_request, session_cookie};
use crate::error::AuthError;
use crate::extractors::OptionalUser;
use crate::AuthState;

/// Query parameters for OAuth callback.
#[derive(Deserialize)]
pub struct CallbackQuery {
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub code: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub state: Option<String>,
}

/// Creates the auth router.
///
/// Routes:
/// - `GET /api/oauth/callback` - Exchange the OAuth code and start a session
/// - `GET /api/auth/me` - Current user, or `null` when anonymous
/// - `POST /api/auth/logout` - Clear the session cookie
pub fn auth_routes<S>() -> Router<S>
where
    AuthState: FromRef<S>,
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/api/oauth/callback", get(oauth_callback))
        .route("/api/auth/me", get(me))
        .route("/api/auth/logout", post(logout))
}

async fn oauth_callback(
    State(state): State<AuthState>,
    Query(query): Query<CallbackQuery>,
    headers: HeaderMap,
    uri: Uri,
    jar: CookieJar,
) -> Result<impl IntoResponse, AuthError> {
    let (Some(code), Some(oauth_state)) = (query.code, query.state) else {
        return Err(AuthError::MissingParams);
    };
    if !state.config.can_issue_sessions() {
        return Err(AuthError::Config("session secret is not configured".to_string()));
    }

    let token = state.provider.exchange_code(&code, &oauth_state).await?;
    let identity = state.provider.get_user_info(&token.access_token).await?;

    let upsert = UpsertUser::new(identity.open_id.clone())
        .with_name(identity.name.clone())
        .with_email(identity.email.clone())
        .with_login_method(identity.login_method.clone())
        .with_last_signed_in(Utc::now());

    match state.users.upsert_user(&upsert).await {
        Ok(()) => {}
        Err(RepositoryError::Unavailable) => {
            tracing::warn!(open_id = %identity.open_id, "Cannot persist user: database not available");
        }
        Err(e) => return Err(CoreError::Storage(e.to_string()).into()),
    }

    let ttl = chrono::Duration::from_std(state.config.session_ttl)
        .map_err(|e| AuthError::Config(format!("session ttl: {e}")))?;
    let session_token = state.tokens.create_session_token(
        &identity.open_id,
        identity.name.as_deref().unwrap_or_default(),
        ttl,
    )?;

    let secure = is_secure_request(&headers, &uri);
    let cookie = session_cookie(
        &state.config.cookie_name,
        session_token,
        secure,
        state.config.session_ttl,
    );

    tracing::info!(open_id = %identity.open_id, "User signed in");

    Ok((StatusCode::FOUND, jar.add(cookie), [(LOCATION, "/")]))
}

async fn me(OptionalUser(user): OptionalUser) -> impl IntoResponse {
    Json(user)
}

async fn logout(
    State(state): State<AuthState>,
    headers: HeaderMap,
    uri: Uri,
    jar: CookieJar,
) -> impl IntoResponse {
    let secure = is_secure_request(&headers, &uri);
    let jar = jar.add(clear_session_cookie(&state.config.cookie_name, secure));
    (jar, Json(json!({ "success": true })))
}
