//! RFID Warehouse API Library
//!
//! Item catalog plus an append-only RFID movement ledger. A tag's location is
//! never stored; it is derived from the latest entry in its movement log.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod health;
pub mod middleware_helpers;
pub mod migrator;
pub mod services;
pub mod tracing_ctx;

use axum::{middleware, response::Json, routing::get, Router};
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};
use std::sync::Arc;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

/// Assemble the full application router on top of the shared state.
pub fn app_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root_index))
        .merge(health::health_routes())
        .nest("/api/items", handlers::items::item_routes())
        .nest("/api/rfid", handlers::rfid::rfid_routes())
        .layer(middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(state)
}

async fn root_index() -> Json<Value> {
    Json(json!({
        "message": "RFID Warehouse API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "items": "/api/items",
            "rfid": "/api/rfid"
        }
    }))
}
