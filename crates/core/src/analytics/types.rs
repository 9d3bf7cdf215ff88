use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::RepositoryError;

/// Event type the tracker sends for visitors seen before.
pub const EVENT_RETURNING_VISITOR: &str = "returning_visitor";
/// Event type carrying `{campaign, source, medium}` metadata.
pub const EVENT_UTM_TRACKING: &str = "utm_tracking";
/// Event type carrying `{seconds}` metadata.
pub const EVENT_TIME_MILESTONE: &str = "time_milestone";

fn check_len(field: &str, value: Option<&str>, max: usize) -> Result<(), RepositoryError> {
    match value {
        Some(v) if v.chars().count() > max => Err(RepositoryError::InvalidData(format!(
            "{field} must be at most {max} characters"
        ))),
        _ => Ok(()),
    }
}

fn check_required(field: &str, value: &str, max: usize) -> Result<(), RepositoryError> {
    if value.is_empty() {
        return Err(RepositoryError::InvalidData(format!("{field} is required")));
    }
    check_len(field, Some(value), max)
}

/// Payload for a new visitor session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVisitorSession {
    pub session_id: String,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub device: Option<String>,
    #[serde(default)]
    pub browser: Option<String>,
    #[serde(default)]
    pub os: Option<String>,
    #[serde(default)]
    pub referrer: Option<String>,
    #[serde(default)]
    pub landing_page: Option<String>,
}

impl NewVisitorSession {
    pub fn validate(&self) -> Result<(), RepositoryError> {
        check_required("sessionId", &self.session_id, 64)?;
        check_len("ipAddress", self.ip_address.as_deref(), 45)?;
        check_len("country", self.country.as_deref(), 2)?;
        check_len("city", self.city.as_deref(), 100)?;
        check_len("device", self.device.as_deref(), 50)?;
        check_len("browser", self.browser.as_deref(), 50)?;
        check_len("os", self.os.as_deref(), 50)
    }
}

/// Payload for a pageview.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPageview {
    pub session_id: String,
    pub path: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub referrer: Option<String>,
    /// Seconds spent on the page.
    #[serde(default)]
    pub duration: Option<i64>,
}

impl NewPageview {
    pub fn validate(&self) -> Result<(), RepositoryError> {
        check_required("sessionId", &self.session_id, 64)
    }
}

/// Payload for an interaction event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub session_id: String,
    pub event_type: String,
    #[serde(default)]
    pub event_name: Option<String>,
    #[serde(default)]
    pub element_id: Option<String>,
    #[serde(default)]
    pub element_class: Option<String>,
    #[serde(default)]
    pub element_text: Option<String>,
    pub path: String,
    /// JSON document encoded as a string.
    #[serde(default)]
    pub metadata: Option<String>,
}

impl NewEvent {
    pub fn validate(&self) -> Result<(), RepositoryError> {
        check_required("sessionId", &self.session_id, 64)?;
        check_required("eventType", &self.event_type, 50)?;
        check_len("eventName", self.event_name.as_deref(), 100)?;
        check_len("elementId", self.element_id.as_deref(), 100)
    }
}

/// Payload for a heatmap point.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewHeatmapPoint {
    pub session_id: String,
    pub path: String,
    pub event_type: String,
    #[serde(default)]
    pub x: Option<i64>,
    #[serde(default)]
    pub y: Option<i64>,
    /// Percentage of the page scrolled.
    #[serde(default)]
    pub scroll_depth: Option<i64>,
    #[serde(default)]
    pub viewport_width: Option<i64>,
    #[serde(default)]
    pub viewport_height: Option<i64>,
}

impl NewHeatmapPoint {
    pub fn validate(&self) -> Result<(), RepositoryError> {
        check_required("sessionId", &self.session_id, 64)?;
        check_required("eventType", &self.event_type, 20)
    }
}

/// A stored visitor session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorSession {
    pub id: i64,
    pub session_id: String,
    pub user_id: Option<i64>,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub device: Option<String>,
    pub browser: Option<String>,
    pub os: Option<String>,
    pub referrer: Option<String>,
    pub landing_page: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

/// A stored heatmap point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapPoint {
    pub id: i64,
    pub session_id: String,
    pub path: String,
    pub event_type: String,
    pub x: Option<i64>,
    pub y: Option<i64>,
    pub scroll_depth: Option<i64>,
    pub viewport_width: Option<i64>,
    pub viewport_height: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_sessions: i64,
    pub total_pageviews: i64,
    pub total_events: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathViews {
    pub path: String,
    pub views: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceCount {
    pub device: Option<String>,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrowserCount {
    pub browser: Option<String>,
    pub count: i64,
}

/// Raw metadata string with the number of events carrying it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataCount {
    pub metadata: Option<String>,
    pub count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorSplit {
    pub returning_visitors: i64,
    pub new_visitors: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UtmPerformance {
    pub campaign: Option<String>,
    pub source: Option<String>,
    pub medium: Option<String>,
    pub sessions: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeOnPageBucket {
    pub time_range: String,
    pub count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementMilestone {
    /// Seconds on page.
    pub milestone: i64,
    pub user_count: i64,
}
