//! Axum extractor for RequestContext.

use std::convert::Infallible;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use sitepulse_auth::{AuthState, OptionalUser};

use super::types::{RequestContext, RequestId};

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Caller-supplied id when it is a valid UUID, otherwise a fresh one.
fn extract_request_id(headers: &HeaderMap) -> RequestId {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(RequestId::generate)
}

impl<S> FromRequestParts<S> for RequestContext
where
    AuthState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let OptionalUser(user) = OptionalUser::from_request_parts(parts, state).await?;
        let request_id = extract_request_id(&parts.headers);

        Ok(RequestContext { user, request_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, routing::get, Json, Router};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use sitepulse_auth::{
        mock::{InMemoryUserRepository, MockIdentityProvider},
        AuthConfig,
    };
    use sitepulse_core::auth::AuthError;
    use sitepulse_core::users::{UpsertUser, UserRepository};
    use std::sync::Arc;
    use tower::ServiceExt;

    const ID: &str = "550e8400-e29b-41d4-a716-446655440000";

    #[test]
    fn request_id_header_is_kept_only_when_valid() {
        let cases = [
            (ID, true),
            (" 550e8400-e29b-41d4-a716-446655440000 ", true),
            ("not-a-uuid", false),
            ("", false),
        ];

        for (value, kept) in cases {
            let mut headers = HeaderMap::new();
            headers.insert(REQUEST_ID_HEADER, value.parse().unwrap());

            let request_id = extract_request_id(&headers).to_string();

            assert_eq!(request_id == ID, kept, "{value:?}");
            assert!(request_id.parse::<RequestId>().is_ok());
        }
    }

    async fn describe(ctx: RequestContext) -> Json<Value> {
        Json(json!({
            "userId": ctx.user_id(),
            "openId": ctx.user.map(|user| user.open_id),
            "requestId": ctx.request_id.to_string(),
        }))
    }

    /// Router echoing the resolved context, plus a cookie for a stored user.
    async fn setup() -> (Router, Arc<MockIdentityProvider>, String) {
        let users = Arc::new(InMemoryUserRepository::new());
        users.upsert_user(&UpsertUser::new("u1")).await.unwrap();

        let provider = Arc::new(MockIdentityProvider::failing(AuthError::Transport(
            "unreachable".to_string(),
        )));
        let config = AuthConfig {
            session_secret: "secret".to_string(),
            app_id: "app-1".to_string(),
            ..AuthConfig::from_lookup(|_| None)
        };
        let state = AuthState::new(config, provider.clone(), users);

        let token = state
            .tokens
            .create_session_token("u1", "", chrono::Duration::hours(1))
            .unwrap();
        let app = Router::new().route("/", get(describe)).with_state(state);

        (app, provider, format!("app_session_id={token}"))
    }

    async fn context_for(app: Router, cookie: Option<&str>) -> Value {
        let mut request = Request::get("/").header(REQUEST_ID_HEADER, ID);
        if let Some(cookie) = cookie {
            request = request.header("cookie", cookie);
        }

        let response = app
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn session_cookie_resolves_the_stored_user() {
        let (app, provider, cookie) = setup().await;

        let ctx = context_for(app, Some(&cookie)).await;

        assert_eq!(ctx["openId"], "u1");
        assert!(ctx["userId"].as_i64().is_some());
        assert_eq!(ctx["requestId"], ID);
        assert_eq!(provider.total_calls(), 0);
    }

    #[tokio::test]
    async fn missing_or_garbage_cookie_is_anonymous() {
        for cookie in [None, Some("app_session_id=garbage")] {
            let (app, _, _) = setup().await;

            let ctx = context_for(app, cookie).await;

            assert_eq!(ctx["openId"], Value::Null, "{cookie:?}");
            assert_eq!(ctx["userId"], Value::Null);
            assert_eq!(ctx["requestId"], ID);
        }
    }
}
