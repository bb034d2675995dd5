use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::{
        order,
        order::{OrderDirection, OrderPriority},
        order_line,
    },
    errors::ServiceError,
    services::{
        orders::{
            CreateOrderInput, CreateOrderLineInput, OrderDetails, OrderListFilter,
            ReconcileLineUpdate,
        },
        reconciliation::OrderTotals,
    },
    ApiResponse, AppState, PaginatedResponse,
};

pub fn orders_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_order).get(list_orders))
        .route("/:id", get(get_order))
        .route("/:id/transition", post(transition_order))
        .route("/:id/reconcile", post(reconcile_order))
        .route("/:id/complete", post(complete_order))
        .route("/:id/cancel", post(cancel_order))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateOrderRequest {
    pub direction: OrderDirection,
    #[validate(length(min = 1, message = "counterparty_name must not be empty"))]
    pub counterparty_name: String,
    pub carrier: Option<String>,
    /// ETA for inbound orders, ETD for outbound
    pub scheduled_time: DateTime<Utc>,
    pub priority: OrderPriority,
    pub notes: Option<String>,
    #[validate(length(min = 1, message = "an order needs at least one line"))]
    pub lines: Vec<CreateOrderLineRequest>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderLineRequest {
    pub sku: String,
    pub quantity: i32,
    #[serde(default = "default_unit")]
    pub unit: String,
}

fn default_unit() -> String {
    "kg".to_string()
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TransitionRequest {
    /// Target status; must be the designated successor of the current
    /// status, or CANCELLED from any non-terminal status.
    pub status: String,
}

/// One line update. Inbound receipts carry `received_qty`, `damaged_qty`
/// and the lot details plus putaway `location_id`; outbound picks carry
/// `picked_qty` and the pulled `lot_id`/`location_id`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ReconcileLineRequest {
    pub line_id: Uuid,
    pub received_qty: Option<i32>,
    pub picked_qty: Option<i32>,
    #[serde(default)]
    pub damaged_qty: i32,
    pub lot_number: Option<String>,
    pub manufacture_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub lot_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReconcileRequest {
    pub updates: Vec<ReconcileLineRequest>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct OrderListQuery {
    /// INBOUND or OUTBOUND
    pub direction: Option<String>,
    pub status: Option<String>,
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_page() -> u64 {
    1
}

fn default_limit() -> u64 {
    20
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderLineResponse {
    pub id: Uuid,
    pub line_no: i32,
    pub sku: String,
    pub expected_qty: i32,
    pub received_qty: Option<i32>,
    pub damaged_qty: Option<i32>,
    pub accepted_qty: Option<i32>,
    pub unit: String,
    pub lot_number: Option<String>,
    pub manufacture_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub lot_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub order_number: String,
    pub direction: String,
    pub status: String,
    pub priority: String,
    pub counterparty_name: String,
    pub carrier: Option<String>,
    pub scheduled_time: DateTime<Utc>,
    pub notes: Option<String>,
    pub totals: OrderTotals,
    pub lines: Vec<OrderLineResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Summary row for list endpoints; lines are served by the detail route.
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderSummaryResponse {
    pub id: Uuid,
    pub order_number: String,
    pub direction: String,
    pub status: String,
    pub priority: String,
    pub counterparty_name: String,
    pub carrier: Option<String>,
    pub scheduled_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<order_line::Model> for OrderLineResponse {
    fn from(line: order_line::Model) -> Self {
        Self {
            id: line.id,
            line_no: line.line_no,
            sku: line.sku,
            expected_qty: line.expected_qty,
            received_qty: line.received_qty,
            damaged_qty: line.damaged_qty,
            accepted_qty: line.accepted_qty,
            unit: line.unit,
            lot_number: line.lot_number,
            manufacture_date: line.manufacture_date,
            expiry_date: line.expiry_date,
            lot_id: line.lot_id,
            location_id: line.location_id,
        }
    }
}

impl From<OrderDetails> for OrderResponse {
    fn from(details: OrderDetails) -> Self {
        let order = details.order;
        Self {
            id: order.id,
            order_number: order.order_number,
            direction: order.direction,
            status: order.status,
            priority: order.priority,
            counterparty_name: order.counterparty_name,
            carrier: order.carrier,
            scheduled_time: order.scheduled_time,
            notes: order.notes,
            totals: details.totals,
            lines: details.lines.into_iter().map(Into::into).collect(),
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

impl From<order::Model> for OrderSummaryResponse {
    fn from(order: order::Model) -> Self {
        Self {
            id: order.id,
            order_number: order.order_number,
            direction: order.direction,
            status: order.status,
            priority: order.priority,
            counterparty_name: order.counterparty_name,
            carrier: order.carrier,
            scheduled_time: order.scheduled_time,
            created_at: order.created_at,
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created"),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<OrderResponse>>), ServiceError> {
    request.validate()?;

    let details = state
        .services
        .orders
        .create_order(CreateOrderInput {
            direction: request.direction,
            counterparty_name: request.counterparty_name,
            carrier: request.carrier,
            scheduled_time: request.scheduled_time,
            priority: request.priority,
            notes: request.notes,
            lines: request
                .lines
                .into_iter()
                .map(|line| CreateOrderLineInput {
                    sku: line.sku,
                    quantity: line.quantity,
                    unit: line.unit,
                })
                .collect(),
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(details.into())),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders",
    params(OrderListQuery),
    responses(
        (status = 200, description = "Orders listed"),
        (status = 400, description = "Invalid filter", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<OrderSummaryResponse>>>, ServiceError> {
    let direction = query
        .direction
        .as_deref()
        .map(|raw| {
            raw.parse::<OrderDirection>().map_err(|_| {
                ServiceError::ValidationError(format!("'{}' is not a valid direction", raw))
            })
        })
        .transpose()?;

    let page = state
        .services
        .orders
        .list_orders(OrderListFilter {
            direction,
            status: query.status,
            page: query.page,
            limit: query.limit,
        })
        .await?;

    let total_pages = page.total.div_ceil(page.limit);
    Ok(Json(ApiResponse::success(PaginatedResponse {
        items: page.orders.into_iter().map(Into::into).collect(),
        total: page.total,
        page: page.page,
        limit: page.limit,
        total_pages,
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order returned"),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<OrderResponse>>, ServiceError> {
    let details = state.services.orders.get_order(id).await?;
    Ok(Json(ApiResponse::success(details.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/transition",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = TransitionRequest,
    responses(
        (status = 200, description = "Order transitioned"),
        (status = 400, description = "Transition not permitted", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Concurrent modification", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn transition_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<TransitionRequest>,
) -> Result<Json<ApiResponse<OrderResponse>>, ServiceError> {
    let details = state.services.orders.transition(id, &request.status).await?;
    Ok(Json(ApiResponse::success(details.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/reconcile",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = ReconcileRequest,
    responses(
        (status = 200, description = "Lines reconciled"),
        (status = 400, description = "Batch rejected", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn reconcile_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ReconcileRequest>,
) -> Result<Json<ApiResponse<OrderResponse>>, ServiceError> {
    let updates = request
        .updates
        .into_iter()
        .map(|line| {
            let received_qty = line.received_qty.or(line.picked_qty).ok_or_else(|| {
                ServiceError::ValidationError(format!(
                    "line {}: received_qty (inbound) or picked_qty (outbound) is required",
                    line.line_id
                ))
            })?;
            Ok(ReconcileLineUpdate {
                line_id: line.line_id,
                received_qty,
                damaged_qty: line.damaged_qty,
                lot_number: line.lot_number,
                manufacture_date: line.manufacture_date,
                expiry_date: line.expiry_date,
                lot_id: line.lot_id,
                location_id: line.location_id,
            })
        })
        .collect::<Result<Vec<_>, ServiceError>>()?;

    let details = state.services.orders.reconcile_lines(id, updates).await?;
    Ok(Json(ApiResponse::success(details.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/complete",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order completed"),
        (status = 400, description = "Completion not permitted", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Ledger commitment failed", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn complete_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<OrderResponse>>, ServiceError> {
    let details = state.services.orders.complete(id).await?;
    Ok(Json(ApiResponse::success(details.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/cancel",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order cancelled"),
        (status = 400, description = "Order already terminal", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn cancel_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<OrderResponse>>, ServiceError> {
    let details = state.services.orders.cancel(id).await?;
    Ok(Json(ApiResponse::success(details.into())))
}
