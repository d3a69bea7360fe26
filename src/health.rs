//! Health endpoints: `/health` pings the database, `/health/live` only
//! confirms the process is responsive.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::error;

use crate::handlers::AppState;

pub fn health_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .route("/health/live", get(live))
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.db.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "up",
                "version": env!("CARGO_PKG_VERSION"),
                "database": "up",
                "timestamp": Utc::now().to_rfc3339(),
            })),
        ),
        Err(e) => {
            error!("health check database ping failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "down",
                    "version": env!("CARGO_PKG_VERSION"),
                    "database": "down",
                    "timestamp": Utc::now().to_rfc3339(),
                })),
            )
        }
    }
}

async fn live() -> impl IntoResponse {
    Json(json!({ "status": "up" }))
}
