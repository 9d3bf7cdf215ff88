use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    routing::{get, post},
    Router,
};
use sitepulse_auth::auth_routes;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::{
    handlers::{analytics, reports, system},
    state::AppState,
};

/// Create the application router with all routes and middleware.
pub fn create_app(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let analytics_routes = Router::new()
        // Tracking (public)
        .route("/sessions", post(analytics::create_session))
        .route("/pageviews", post(analytics::track_pageview))
        .route("/events", post(analytics::track_event))
        .route("/heatmap", post(analytics::track_heatmap).get(reports::heatmap))
        // Reports (admin)
        .route("/summary", get(reports::summary))
        .route("/top-pages", get(reports::top_pages))
        .route("/recent-sessions", get(reports::recent_sessions))
        .route("/devices", get(reports::devices))
        .route("/browsers", get(reports::browsers))
        .route("/returning-visitors", get(reports::returning_visitors))
        .route("/utm", get(reports::utm))
        .route("/time-on-page", get(reports::time_on_page))
        .route("/milestones", get(reports::milestones));

    let system_routes = Router::new()
        .route("/health", get(system::health))
        .route("/notify-owner", post(system::notify_owner));

    Router::new()
        .merge(auth_routes())
        .nest("/api/analytics", analytics_routes)
        .nest("/api/system", system_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .with_state(state)
}
