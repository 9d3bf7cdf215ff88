use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use sitepulse_auth::AdminUser;
use sitepulse_core::notification::Notification;

use crate::{handlers::AppError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct HealthQuery {
    pub timestamp: i64,
}

#[derive(Debug, Deserialize)]
pub struct NotifyOwnerRequest {
    pub title: String,
    pub content: String,
}

/// Liveness check (GET /api/system/health).
pub async fn health(Query(query): Query<HealthQuery>) -> Result<Json<Value>, AppError> {
    if query.timestamp < 0 {
        return Err(AppError::bad_request("timestamp cannot be negative"));
    }
    Ok(Json(json!({ "ok": true })))
}

/// Send a notification to the owner (POST /api/system/notify-owner).
pub async fn notify_owner(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(payload): Json<NotifyOwnerRequest>,
) -> Result<Json<Value>, AppError> {
    let notification = Notification::new(&payload.title, &payload.content)?;
    let delivered = state.notifier.notify(&notification).await?;

    tracing::info!(open_id = %admin.open_id, delivered, "Owner notification sent");

    Ok(Json(json!({ "success": delivered })))
}
