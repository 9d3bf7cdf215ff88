//! Owner notifications: payload validation and endpoint resolution.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

pub const TITLE_MAX_LENGTH: usize = 1200;
pub const CONTENT_MAX_LENGTH: usize = 20_000;

const SEND_NOTIFICATION_PATH: &str = "webdevtoken.v1.WebDevService/SendNotification";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotificationError {
    #[error("Notification title is required.")]
    MissingTitle,

    #[error("Notification content is required.")]
    MissingContent,

    #[error("Notification title must be at most {max} characters.", max = TITLE_MAX_LENGTH)]
    TitleTooLong,

    #[error("Notification content must be at most {max} characters.", max = CONTENT_MAX_LENGTH)]
    ContentTooLong,

    #[error("Notification service URL is not configured.")]
    UrlNotConfigured,

    #[error("Notification service API key is not configured.")]
    KeyNotConfigured,

    #[error("Invalid notification service URL: {0}")]
    InvalidUrl(String),
}

impl NotificationError {
    /// Whether the caller sent a bad payload, as opposed to a server-side
    /// configuration problem.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MissingTitle | Self::MissingContent | Self::TitleTooLong | Self::ContentTooLong
        )
    }
}

/// Validated notification, trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub content: String,
}

impl Notification {
    /// Trims and validates a raw title and content.
    pub fn new(title: &str, content: &str) -> Result<Self, NotificationError> {
        let title = title.trim();
        let content = content.trim();

        if title.is_empty() {
            return Err(NotificationError::MissingTitle);
        }
        if content.is_empty() {
            return Err(NotificationError::MissingContent);
        }
        if title.chars().count() > TITLE_MAX_LENGTH {
            return Err(NotificationError::TitleTooLong);
        }
        if content.chars().count() > CONTENT_MAX_LENGTH {
            return Err(NotificationError::ContentTooLong);
        }

        Ok(Self {
            title: title.to_string(),
            content: content.to_string(),
        })
    }
}

/// Resolves the send endpoint relative to the configured base URL.
pub fn notification_endpoint(base_url: &str) -> Result<Url, NotificationError> {
    let normalized = if base_url.ends_with('/') {
        base_url.to_string()
    } else {
        format!("{base_url}/")
    };

    Url::parse(&normalized)
        .and_then(|base| base.join(SEND_NOTIFICATION_PATH))
        .map_err(|e| NotificationError::InvalidUrl(e.to_string()))
}
