use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    errors::ServiceError,
    services::{
        expiry::ExpiryStatus,
        ledger::{AddInventoryInput, InventoryListFilter, InventoryRow},
    },
    ApiResponse, AppState,
};

pub fn inventory_router() -> Router<AppState> {
    Router::new().route("/", post(add_inventory).get(list_inventory))
}

/// Direct stock intake: creates a lot and binds it to a location in one
/// transaction.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddInventoryRequest {
    #[validate(length(min = 1, message = "sku must not be empty"))]
    pub sku: String,
    pub location_id: Uuid,
    #[validate(length(min = 1, message = "lot_number must not be empty"))]
    pub lot_number: String,
    pub manufacture_date: Option<NaiveDate>,
    pub expiry_date: NaiveDate,
    pub quantity: i32,
    pub supplier: Option<String>,
    pub origin_country: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AddInventoryResponse {
    pub lot_id: Uuid,
    pub location_id: Uuid,
    pub sku: String,
    pub lot_number: String,
    pub quantity: i32,
    pub expiry_date: NaiveDate,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct InventoryQuery {
    pub sku: Option<String>,
    pub zone: Option<String>,
    /// Location code
    pub location: Option<String>,
    /// EXPIRED, CRITICAL, WARNING or NORMAL
    pub expiry_status: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/v1/inventory",
    request_body = AddInventoryRequest,
    responses(
        (status = 201, description = "Inventory added", body = AddInventoryResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Location not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Capacity exceeded or location blocked", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn add_inventory(
    State(state): State<AppState>,
    Json(request): Json<AddInventoryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AddInventoryResponse>>), ServiceError> {
    request.validate()?;

    let (lot, record) = state
        .services
        .ledger
        .add_inventory(AddInventoryInput {
            sku: request.sku,
            location_id: request.location_id,
            lot_number: request.lot_number,
            manufacture_date: request.manufacture_date,
            expiry_date: request.expiry_date,
            quantity: request.quantity,
            supplier: request.supplier,
            origin_country: request.origin_country,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(AddInventoryResponse {
            lot_id: lot.id,
            location_id: record.location_id,
            sku: lot.sku,
            lot_number: lot.lot_number,
            quantity: record.quantity,
            expiry_date: lot.expiry_date,
            updated_at: record.updated_at,
        })),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/inventory",
    params(InventoryQuery),
    responses(
        (status = 200, description = "Inventory listed", body = [InventoryRow]),
        (status = 400, description = "Invalid filter", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn list_inventory(
    State(state): State<AppState>,
    Query(query): Query<InventoryQuery>,
) -> Result<Json<ApiResponse<Vec<InventoryRow>>>, ServiceError> {
    let expiry_status = query
        .expiry_status
        .as_deref()
        .map(|raw| {
            raw.parse::<ExpiryStatus>().map_err(|_| {
                ServiceError::ValidationError(format!("'{}' is not an expiry status", raw))
            })
        })
        .transpose()?;

    let rows = state
        .services
        .ledger
        .list_inventory(InventoryListFilter {
            sku: query.sku,
            zone: query.zone,
            location: query.location,
            expiry_status,
        })
        .await?;
    Ok(Json(ApiResponse::success(rows)))
}
