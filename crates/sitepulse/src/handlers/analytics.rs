//! Public tracking endpoints called by the tracked site.

use axum::{extract::State, Json};
use serde_json::{json, Value};
use sitepulse_core::analytics::{NewEvent, NewHeatmapPoint, NewPageview, NewVisitorSession};

use crate::{context::RequestContext, handlers::AppError, state::AppState};

fn success() -> Json<Value> {
    Json(json!({ "success": true }))
}

/// Start a visitor session (POST /api/analytics/sessions).
pub async fn create_session(
    State(state): State<AppState>,
    ctx: RequestContext,
    Json(payload): Json<NewVisitorSession>,
) -> Result<Json<Value>, AppError> {
    state
        .analytics
        .create_session(&payload, ctx.user_id())
        .await?;

    tracing::debug!(
        request_id = %ctx.request_id,
        session_id = %payload.session_id,
        "Visitor session started"
    );

    Ok(success())
}

/// Record a pageview (POST /api/analytics/pageviews).
pub async fn track_pageview(
    State(state): State<AppState>,
    Json(payload): Json<NewPageview>,
) -> Result<Json<Value>, AppError> {
    state.analytics.track_pageview(&payload).await?;
    Ok(success())
}

/// Record an interaction event (POST /api/analytics/events).
pub async fn track_event(
    State(state): State<AppState>,
    Json(payload): Json<NewEvent>,
) -> Result<Json<Value>, AppError> {
    state.analytics.track_event(&payload).await?;
    Ok(success())
}

/// Record a heatmap point (POST /api/analytics/heatmap).
pub async fn track_heatmap(
    State(state): State<AppState>,
    Json(payload): Json<NewHeatmapPoint>,
) -> Result<Json<Value>, AppError> {
    state.analytics.track_heatmap(&payload).await?;
    Ok(success())
}
