// Route table and middleware stack.

use crate::http::handlers;
use crate::state::AppState;
use axum::routing::{get, post, put};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/reviews/submit", post(handlers::submit_review))
        .route("/api/reviews/public", get(handlers::get_public_reviews))
        .route("/api/reviews/pending", get(handlers::get_pending_reviews))
        .route("/api/reviews/{id}/status", put(handlers::update_review_status))
        .route("/api/reviews/{id}/helpful", post(handlers::mark_helpful))
        .route("/api/reviews/{id}/report", post(handlers::report_review))
        .route("/api/analytics/share", post(handlers::track_share))
        .route("/api/analytics/shares", get(handlers::get_share_analytics))
        .route("/api/stats", get(handlers::get_statistics))
        .route("/ws", get(crate::ws::handler::ws_upgrade))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
