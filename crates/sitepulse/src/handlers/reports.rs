//! Admin-only analytics reports.
//!
//! Every report accepts optional `start` / `end` RFC 3339 bounds.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sitepulse_auth::AdminUser;
use sitepulse_core::analytics::{
    bucket_durations, engagement_milestones, utm_performance, visitor_split, BrowserCount,
    DeviceCount, EngagementMilestone, HeatmapPoint, PathViews, Summary, TimeOnPageBucket,
    UtmPerformance, VisitorSession, VisitorSplit, EVENT_RETURNING_VISITOR, EVENT_TIME_MILESTONE,
    EVENT_UTM_TRACKING,
};
use sitepulse_core::serde::deserialize_optional_datetime;
use sitepulse_core::storage::TimeRange;

use crate::{handlers::AppError, state::AppState};

const DEFAULT_TOP_PAGES: i64 = 10;
const DEFAULT_RECENT_SESSIONS: i64 = 50;

/// Query parameters for range-filtered reports.
#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    #[serde(default, deserialize_with = "deserialize_optional_datetime")]
    pub start: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_optional_datetime")]
    pub end: Option<DateTime<Utc>>,
}

impl RangeQuery {
    fn range(&self) -> Result<TimeRange, AppError> {
        time_range(self.start, self.end)
    }
}

#[derive(Debug, Deserialize)]
pub struct TopPagesQuery {
    pub limit: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_optional_datetime")]
    pub start: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_optional_datetime")]
    pub end: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapQuery {
    pub path: String,
    #[serde(default = "default_heatmap_event")]
    pub event_type: String,
}

fn default_heatmap_event() -> String {
    "click".to_string()
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

fn time_range(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<TimeRange, AppError> {
    TimeRange::new(start, end).map_err(|e| AppError::bad_request(e.to_string()))
}

fn positive_limit(limit: Option<i64>, default: i64) -> Result<i64, AppError> {
    match limit {
        None => Ok(default),
        Some(limit) if limit > 0 => Ok(limit),
        Some(_) => Err(AppError::bad_request("limit must be positive")),
    }
}

/// Totals (GET /api/analytics/summary).
pub async fn summary(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<RangeQuery>,
) -> Result<Json<Summary>, AppError> {
    Ok(Json(state.analytics.summary(query.range()?).await?))
}

/// Most viewed paths (GET /api/analytics/top-pages).
pub async fn top_pages(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<TopPagesQuery>,
) -> Result<Json<Vec<PathViews>>, AppError> {
    let limit = positive_limit(query.limit, DEFAULT_TOP_PAGES)?;
    let range = time_range(query.start, query.end)?;
    Ok(Json(state.analytics.top_pages(limit, range).await?))
}

/// Heatmap points for one page (GET /api/analytics/heatmap).
pub async fn heatmap(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<HeatmapQuery>,
) -> Result<Json<Vec<HeatmapPoint>>, AppError> {
    Ok(Json(
        state
            .analytics
            .heatmap(&query.path, &query.event_type)
            .await?,
    ))
}

/// Newest sessions (GET /api/analytics/recent-sessions).
pub async fn recent_sessions(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<VisitorSession>>, AppError> {
    let limit = positive_limit(query.limit, DEFAULT_RECENT_SESSIONS)?;
    Ok(Json(state.analytics.recent_sessions(limit).await?))
}

/// Sessions per device (GET /api/analytics/devices).
pub async fn devices(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<RangeQuery>,
) -> Result<Json<Vec<DeviceCount>>, AppError> {
    Ok(Json(state.analytics.device_counts(query.range()?).await?))
}

/// Sessions per browser (GET /api/analytics/browsers).
pub async fn browsers(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<RangeQuery>,
) -> Result<Json<Vec<BrowserCount>>, AppError> {
    Ok(Json(state.analytics.browser_counts(query.range()?).await?))
}

/// Returning versus new visitors (GET /api/analytics/returning-visitors).
pub async fn returning_visitors(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<RangeQuery>,
) -> Result<Json<VisitorSplit>, AppError> {
    let range = query.range()?;
    let (returning, total) = tokio::try_join!(
        state.analytics.count_events(EVENT_RETURNING_VISITOR, range),
        state.analytics.count_sessions(range),
    )?;
    Ok(Json(visitor_split(returning, total)))
}

/// Sessions per campaign (GET /api/analytics/utm).
pub async fn utm(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<RangeQuery>,
) -> Result<Json<Vec<UtmPerformance>>, AppError> {
    let rows = state
        .analytics
        .event_metadata_counts(EVENT_UTM_TRACKING, query.range()?)
        .await?;
    Ok(Json(utm_performance(&rows)))
}

/// Pageview duration histogram (GET /api/analytics/time-on-page).
pub async fn time_on_page(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<RangeQuery>,
) -> Result<Json<Vec<TimeOnPageBucket>>, AppError> {
    let durations = state.analytics.pageview_durations(query.range()?).await?;
    Ok(Json(bucket_durations(&durations)))
}

/// Users reaching each time milestone (GET /api/analytics/milestones).
pub async fn milestones(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<RangeQuery>,
) -> Result<Json<Vec<EngagementMilestone>>, AppError> {
    let rows = state
        .analytics
        .event_metadata_counts(EVENT_TIME_MILESTONE, query.range()?)
        .await?;
    Ok(Json(engagement_milestones(&rows)))
}
