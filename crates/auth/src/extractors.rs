//! Axum extractors for authentication.
//!
//! [`OptionalUser`] is the request context: it runs the authenticator once per
//! request and collapses every failure into "anonymous". [`CurrentUser`] and
//! [`AdminUser`] gate on its result.

use std::convert::Infallible;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
};
use sitepulse_core::auth::AuthError;
use sitepulse_core::users::User;

use crate::AuthState;

pub const UNAUTHED_ERR_MSG: &str = "Please login (10001)";
pub const NOT_ADMIN_ERR_MSG: &str = "You do not have required permission (10002)";

/// Authentication outcome cached in request extensions.
#[derive(Clone)]
struct ResolvedUser(Option<User>);

/// Extractor for optionally authenticated user. Never rejects.
pub struct OptionalUser(pub Option<User>);

impl<S> FromRequestParts<S> for OptionalUser
where
    AuthState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(ResolvedUser(user)) = parts.extensions.get::<ResolvedUser>() {
            return Ok(OptionalUser(user.clone()));
        }

        let auth_state = AuthState::from_ref(state);
        let user = match auth_state.authenticator.authenticate(&parts.headers).await {
            Ok(user) => Some(user),
            Err(error) => {
                log_anonymous(&error);
                None
            }
        };

        parts.extensions.insert(ResolvedUser(user.clone()));
        Ok(OptionalUser(user))
    }
}

fn log_anonymous(error: &AuthError) {
    match error {
        AuthError::NoSession => tracing::debug!("Anonymous request"),
        other => tracing::warn!(kind = other.kind(), error = %other, "Authentication failed"),
    }
}

/// Extractor for authenticated user. Returns 401 if not authenticated.
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<S> for CurrentUser
where
    AuthState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let OptionalUser(user) = match OptionalUser::from_request_parts(parts, state).await {
            Ok(user) => user,
            Err(never) => match never {},
        };
        user.map(CurrentUser)
            .ok_or((StatusCode::UNAUTHORIZED, UNAUTHED_ERR_MSG))
    }
}

/// Extractor for an admin user. Returns 401 if not authenticated and 403 if
/// the user is not an admin.
pub struct AdminUser(pub User);

impl<S> FromRequestParts<S> for AdminUser
where
    AuthState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !user.role.is_admin() {
            return Err((StatusCode::FORBIDDEN, NOT_ADMIN_ERR_MSG));
        }
        Ok(AdminUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{InMemoryUserRepository, MockIdentityProvider};
    use crate::AuthConfig;
    use axum::{body::Body, http::Request, routing::get, Router};
    use http_body_util::BodyExt;
    use sitepulse_core::auth::Identity;
    use sitepulse_core::users::{Role, UpsertUser, UserRepository};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn config() -> AuthConfig {
        AuthConfig {
            app_id: "app-1".to_string(),
            session_secret: "secret".to_string(),
            oauth_server_url: String::new(),
            owner_open_id: None,
            is_production: false,
            cookie_name: "app_session_id".to_string(),
            session_ttl: std::time::Duration::from_secs(3600),
            provider_timeout: std::time::Duration::from_secs(30),
        }
    }

    fn state(users: Arc<InMemoryUserRepository>) -> AuthState {
        let provider = Arc::new(MockIdentityProvider::returning(Identity {
            open_id: "u1".to_string(),
            name: None,
            email: None,
            login_method: None,
        }));
        AuthState::new(config(), provider, users)
    }

    fn app(state: AuthState) -> Router {
        Router::new()
            .route(
                "/whoami",
                get(|OptionalUser(user): OptionalUser| async move {
                    user.map(|u| u.open_id).unwrap_or_else(|| "anonymous".to_string())
                }),
            )
            .route(
                "/private",
                get(|CurrentUser(user): CurrentUser| async move { user.open_id }),
            )
            .route(
                "/admin",
                get(|AdminUser(user): AdminUser| async move { user.open_id }),
            )
            .with_state(state)
    }

    fn cookie_for(state: &AuthState, open_id: &str) -> String {
        let token = state
            .tokens
            .create_session_token(open_id, "", chrono::Duration::hours(1))
            .unwrap();
        format!("app_session_id={token}")
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn no_cookie_is_anonymous() {
        let app = app(state(Arc::new(InMemoryUserRepository::new())));

        let response = app
            .oneshot(Request::get("/whoami").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "anonymous");
    }

    #[tokio::test]
    async fn garbage_cookie_is_anonymous() {
        let app = app(state(Arc::new(InMemoryUserRepository::new())));

        let response = app
            .oneshot(
                Request::get("/whoami")
                    .header("cookie", "app_session_id=not-a-token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "anonymous");
    }

    #[tokio::test]
    async fn unavailable_store_is_anonymous() {
        let users = Arc::new(InMemoryUserRepository::new());
        users.set_unavailable(true);
        let state = state(users);
        let cookie = cookie_for(&state, "u1");

        let response = app(state)
            .oneshot(
                Request::get("/whoami")
                    .header("cookie", cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(body_text(response).await, "anonymous");
    }

    #[tokio::test]
    async fn valid_cookie_resolves_user() {
        let users = Arc::new(InMemoryUserRepository::new());
        users.upsert_user(&UpsertUser::new("u1")).await.unwrap();
        let state = state(users);
        let cookie = cookie_for(&state, "u1");

        let response = app(state)
            .oneshot(
                Request::get("/whoami")
                    .header("cookie", cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(body_text(response).await, "u1");
    }

    #[tokio::test]
    async fn private_route_requires_login() {
        let app = app(state(Arc::new(InMemoryUserRepository::new())));

        let response = app
            .oneshot(Request::get("/private").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_text(response).await, UNAUTHED_ERR_MSG);
    }

    #[tokio::test]
    async fn admin_route_rejects_regular_user() {
        let users = Arc::new(InMemoryUserRepository::new());
        users.upsert_user(&UpsertUser::new("u1")).await.unwrap();
        let state = state(users);
        let cookie = cookie_for(&state, "u1");

        let response = app(state)
            .oneshot(
                Request::get("/admin")
                    .header("cookie", cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_text(response).await, NOT_ADMIN_ERR_MSG);
    }

    #[tokio::test]
    async fn admin_route_accepts_admin() {
        let users = Arc::new(InMemoryUserRepository::new());
        users
            .upsert_user(&UpsertUser::new("boss").with_role(Role::Admin))
            .await
            .unwrap();
        let state = state(users);
        let cookie = cookie_for(&state, "boss");

        let response = app(state)
            .oneshot(
                Request::get("/admin")
                    .header("cookie", cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "boss");
    }
}
