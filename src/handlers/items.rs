use super::common::{created_response, map_service_error, success_response, validate_input};
use crate::{
    errors::ApiError,
    handlers::AppState,
    services::catalog::CreateItemInput,
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateItemRequest {
    #[validate(length(min = 1))]
    pub item_code: String,

    #[validate(length(min = 1))]
    pub item_name: String,

    pub description: Option<String>,
    pub category: Option<String>,
    pub unit_price: Option<Decimal>,
}

/// Create the item catalog router
pub fn item_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_items).post(create_item))
        .route("/:item_code", get(get_item))
}

/// Create a new catalog item
async fn create_item(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let input = CreateItemInput {
        item_code: payload.item_code,
        item_name: payload.item_name,
        description: payload.description,
        category: payload.category,
        unit_price: payload.unit_price,
    };

    let item_id = state
        .services
        .catalog
        .create_item(input)
        .await
        .map_err(map_service_error)?;

    info!("Item created: {}", item_id);

    created_response(serde_json::json!({
        "message": "Item created successfully",
        "item_id": item_id
    }))
}

/// List all items, most recently created first
async fn list_items(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let items = state
        .services
        .catalog
        .list_items()
        .await
        .map_err(map_service_error)?;

    success_response(items)
}

/// Get a single item by its business key
async fn get_item(
    State(state): State<Arc<AppState>>,
    Path(item_code): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let item = state
        .services
        .catalog
        .get_item(&item_code)
        .await
        .map_err(map_service_error)?;

    success_response(item)
}
