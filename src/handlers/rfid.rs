use super::common::{created_response, map_service_error, success_response, validate_input};
use crate::{errors::ApiError, handlers::AppState, services::ledger::RegisterTagInput};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterTagRequest {
    #[validate(length(min = 1))]
    pub tag_uid: String,

    #[validate(length(min = 1))]
    pub item_code: String,

    pub batch_no: Option<String>,
    pub expiry_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReceiveRequest {
    #[validate(length(min = 1))]
    pub tag_uid: String,

    #[validate(length(min = 1))]
    pub to_location: String,

    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct MoveRequest {
    #[validate(length(min = 1))]
    pub tag_uid: String,

    #[validate(length(min = 1))]
    pub to_location: String,

    pub movement_type: Option<String>,
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub item_code: String,
}

#[derive(Debug, Deserialize)]
pub struct LocateQuery {
    pub tag_uid: String,
}

/// Create the RFID tag and movement ledger router
pub fn rfid_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register_tag))
        .route("/receive", post(receive))
        .route("/move", post(move_tag))
        .route("/search", get(search_by_item))
        .route("/locate", get(locate))
        .route("/tags", get(list_tags))
        .route("/tags/:tag_uid/location", get(current_location))
}

/// Register an RFID tag against an existing catalog item
async fn register_tag(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterTagRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let input = RegisterTagInput {
        tag_uid: payload.tag_uid,
        item_code: payload.item_code,
        batch_no: payload.batch_no,
        expiry_date: payload.expiry_date,
    };

    let tag_id = state
        .services
        .ledger
        .register_tag(input)
        .await
        .map_err(map_service_error)?;

    info!("RFID tag registered: {}", tag_id);

    created_response(serde_json::json!({
        "message": "RFID tag registered successfully",
        "tag_id": tag_id
    }))
}

/// Record a tag entering the warehouse
async fn receive(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ReceiveRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let movement_id = state
        .services
        .ledger
        .receive(&payload.tag_uid, &payload.to_location, payload.quantity)
        .await
        .map_err(map_service_error)?;

    success_response(serde_json::json!({
        "message": "Item received successfully",
        "movement_id": movement_id
    }))
}

/// Record a tag moving to a new location
async fn move_tag(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<MoveRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let movement_id = state
        .services
        .ledger
        .move_tag(
            &payload.tag_uid,
            &payload.to_location,
            payload.movement_type.as_deref(),
            payload.quantity,
        )
        .await
        .map_err(map_service_error)?;

    success_response(serde_json::json!({
        "message": "Item moved successfully",
        "movement_id": movement_id
    }))
}

/// List all tags bound to an item, each with its derived location
async fn search_by_item(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let results = state
        .services
        .ledger
        .search_by_item(&query.item_code)
        .await
        .map_err(map_service_error)?;

    success_response(results)
}

/// Locate a tag: item metadata, derived location, full history newest-first
async fn locate(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LocateQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let location = state
        .services
        .ledger
        .locate(&query.tag_uid)
        .await
        .map_err(map_service_error)?;

    success_response(location)
}

/// Get the derived current location of a tag
async fn current_location(
    State(state): State<Arc<AppState>>,
    Path(tag_uid): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let location = state
        .services
        .ledger
        .current_location(&tag_uid)
        .await
        .map_err(map_service_error)?;

    success_response(serde_json::json!({
        "tag_uid": tag_uid,
        "current_location": location
    }))
}

/// List every registered tag
async fn list_tags(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let tags = state
        .services
        .ledger
        .list_tags()
        .await
        .map_err(map_service_error)?;

    success_response(tags)
}
