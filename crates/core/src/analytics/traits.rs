use async_trait::async_trait;

use crate::storage::{Result, TimeRange};

use super::{
    BrowserCount, DeviceCount, HeatmapPoint, MetadataCount, NewEvent, NewHeatmapPoint,
    NewPageview, NewVisitorSession, PathViews, Summary, VisitorSession,
};

/// Repository for analytics tracking and reporting queries.
///
/// Implementations only run queries; shaping of JSON metadata and bucketing
/// lives in the pure functions of this module.
#[async_trait]
pub trait AnalyticsRepository: Send + Sync {
    /// Records a new visitor session, linked to a signed-in user if any.
    async fn create_session(&self, session: &NewVisitorSession, user_id: Option<i64>)
        -> Result<()>;

    /// Records a pageview and bumps the session's last activity.
    async fn track_pageview(&self, pageview: &NewPageview) -> Result<()>;

    /// Records an interaction event and bumps the session's last activity.
    async fn track_event(&self, event: &NewEvent) -> Result<()>;

    /// Records a heatmap point.
    async fn track_heatmap(&self, point: &NewHeatmapPoint) -> Result<()>;

    /// Session, pageview and event totals within the range.
    async fn summary(&self, range: TimeRange) -> Result<Summary>;

    /// Most viewed paths, most views first.
    async fn top_pages(&self, limit: i64, range: TimeRange) -> Result<Vec<PathViews>>;

    /// Heatmap points for one path and event type (capped at 10 000).
    async fn heatmap(&self, path: &str, event_type: &str) -> Result<Vec<HeatmapPoint>>;

    /// Newest sessions first.
    async fn recent_sessions(&self, limit: i64) -> Result<Vec<VisitorSession>>;

    async fn device_counts(&self, range: TimeRange) -> Result<Vec<DeviceCount>>;

    async fn browser_counts(&self, range: TimeRange) -> Result<Vec<BrowserCount>>;

    /// Number of sessions created within the range.
    async fn count_sessions(&self, range: TimeRange) -> Result<i64>;

    /// Number of events of one type within the range.
    async fn count_events(&self, event_type: &str, range: TimeRange) -> Result<i64>;

    /// Events of one type grouped by their raw metadata string.
    async fn event_metadata_counts(
        &self,
        event_type: &str,
        range: TimeRange,
    ) -> Result<Vec<MetadataCount>>;

    /// Durations (seconds) of pageviews that recorded one.
    async fn pageview_durations(&self, range: TimeRange) -> Result<Vec<i64>>;
}
