//! Owner notifications over the notification service.

use std::time::Duration;

use reqwest::{header, Client};
use sitepulse_core::notification::{notification_endpoint, Notification, NotificationError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Sends notifications to the deployment owner.
#[derive(Clone)]
pub struct OwnerNotifier {
    client: Client,
    base_url: Option<String>,
    api_key: Option<String>,
}

impl OwnerNotifier {
    pub fn new(base_url: Option<String>, api_key: Option<String>) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    /// Delivers `notification`.
    ///
    /// Returns `Ok(false)` when the service could not be reached or rejected
    /// the request; configuration problems are errors.
    pub async fn notify(&self, notification: &Notification) -> Result<bool, NotificationError> {
        let base_url = self
            .base_url
            .as_deref()
            .ok_or(NotificationError::UrlNotConfigured)?;
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(NotificationError::KeyNotConfigured)?;
        let endpoint = notification_endpoint(base_url)?;

        let response = self
            .client
            .post(endpoint)
            .header(header::ACCEPT, "application/json")
            .header(header::AUTHORIZATION, format!("Bearer {api_key}"))
            .header("connect-protocol-version", "1")
            .json(notification)
            .send()
            .await;

        match response {
            Ok(response) if response.status().is_success() => Ok(true),
            Ok(response) => {
                let status = response.status();
                let detail = response.text().await.unwrap_or_default();
                tracing::warn!(%status, detail = %detail, "Failed to notify owner");
                Ok(false)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Error calling notification service");
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::HeaderMap, http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};
    use tokio::net::TcpListener;

    type Captured = Arc<Mutex<Vec<(HeaderMap, Value)>>>;

    async fn spawn_service(status: StatusCode, captured: Captured) -> String {
        let app = Router::new().route(
            "/webdevtoken.v1.WebDevService/SendNotification",
            post(move |headers: HeaderMap, Json(body): Json<Value>| async move {
                captured.lock().unwrap().push((headers, body));
                status
            }),
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn notification() -> Notification {
        Notification::new("New signup", "Ann joined").unwrap()
    }

    #[tokio::test]
    async fn delivers_with_bearer_key() {
        let captured = Captured::default();
        let base = spawn_service(StatusCode::OK, captured.clone()).await;
        let notifier = OwnerNotifier::new(Some(base), Some("key-1".to_string())).unwrap();

        assert_eq!(notifier.notify(&notification()).await, Ok(true));

        let (headers, body) = captured.lock().unwrap().remove(0);
        assert_eq!(headers["authorization"], "Bearer key-1");
        assert_eq!(headers["connect-protocol-version"], "1");
        assert_eq!(body, json!({ "title": "New signup", "content": "Ann joined" }));
    }

    #[tokio::test]
    async fn rejected_request_is_not_delivered() {
        let base = spawn_service(StatusCode::BAD_GATEWAY, Captured::default()).await;
        let notifier = OwnerNotifier::new(Some(base), Some("key-1".to_string())).unwrap();

        assert_eq!(notifier.notify(&notification()).await, Ok(false));
    }

    #[tokio::test]
    async fn unreachable_service_is_not_delivered() {
        let notifier = OwnerNotifier::new(
            Some("http://127.0.0.1:9".to_string()),
            Some("key-1".to_string()),
        )
        .unwrap();

        assert_eq!(notifier.notify(&notification()).await, Ok(false));
    }

    #[tokio::test]
    async fn missing_configuration_is_an_error() {
        let no_url = OwnerNotifier::new(None, Some("key".to_string())).unwrap();
        let no_key = OwnerNotifier::new(Some("http://localhost".to_string()), None).unwrap();

        assert_eq!(
            no_url.notify(&notification()).await,
            Err(NotificationError::UrlNotConfigured)
        );
        assert_eq!(
            no_key.notify(&notification()).await,
            Err(NotificationError::KeyNotConfigured)
        );
    }
}
