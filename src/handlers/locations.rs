use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::location::{self, LocationStatus},
    errors::ServiceError,
    services::{capacity, ledger::CreateLocationInput},
    ApiResponse, AppState,
};

pub fn locations_router() -> Router<AppState> {
    Router::new()
        .route("/", axum::routing::post(create_location).get(list_locations))
        .route("/:id", get(get_location))
        .route("/:id/status", put(set_location_status))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateLocationRequest {
    #[validate(length(min = 1, message = "code must not be empty"))]
    pub code: String,
    #[validate(length(min = 1, message = "zone must not be empty"))]
    pub zone: String,
    pub max_qty: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetLocationStatusRequest {
    pub status: LocationStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LocationResponse {
    pub id: Uuid,
    pub code: String,
    pub zone: String,
    pub max_qty: i32,
    pub current_qty: i32,
    /// Free capacity; a non-authoritative hint only, placement enforces
    /// capacity atomically on the server.
    pub headroom: i32,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<location::Model> for LocationResponse {
    fn from(loc: location::Model) -> Self {
        let headroom = capacity::headroom(&loc);
        Self {
            id: loc.id,
            code: loc.code,
            zone: loc.zone,
            max_qty: loc.max_qty,
            current_qty: loc.current_qty,
            headroom,
            status: loc.status,
            created_at: loc.created_at,
            updated_at: loc.updated_at,
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/locations",
    request_body = CreateLocationRequest,
    responses(
        (status = 201, description = "Location created", body = LocationResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    tag = "locations"
)]
pub async fn create_location(
    State(state): State<AppState>,
    Json(request): Json<CreateLocationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<LocationResponse>>), ServiceError> {
    request.validate()?;

    let created = state
        .services
        .ledger
        .create_location(CreateLocationInput {
            code: request.code,
            zone: request.zone,
            max_qty: request.max_qty,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(created.into())),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/locations",
    responses((status = 200, description = "Locations listed", body = [LocationResponse])),
    tag = "locations"
)]
pub async fn list_locations(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<LocationResponse>>>, ServiceError> {
    let locations = state.services.ledger.list_locations().await?;
    Ok(Json(ApiResponse::success(
        locations.into_iter().map(Into::into).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/locations/{id}",
    params(("id" = Uuid, Path, description = "Location id")),
    responses(
        (status = 200, description = "Location returned", body = LocationResponse),
        (status = 404, description = "Location not found", body = crate::errors::ErrorResponse)
    ),
    tag = "locations"
)]
pub async fn get_location(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<LocationResponse>>, ServiceError> {
    let location = state.services.ledger.get_location(id).await?;
    Ok(Json(ApiResponse::success(location.into())))
}

/// Blocks or reopens a location. Blocked locations reject new placements
/// but still allow releases.
#[utoipa::path(
    put,
    path = "/api/v1/locations/{id}/status",
    params(("id" = Uuid, Path, description = "Location id")),
    request_body = SetLocationStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = LocationResponse),
        (status = 404, description = "Location not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Concurrent modification", body = crate::errors::ErrorResponse)
    ),
    tag = "locations"
)]
pub async fn set_location_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SetLocationStatusRequest>,
) -> Result<Json<ApiResponse<LocationResponse>>, ServiceError> {
    let updated = state
        .services
        .ledger
        .set_location_status(id, request.status)
        .await?;
    Ok(Json(ApiResponse::success(updated.into())))
}
