use utoipa::OpenApi;

use crate::{errors, handlers, services};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Coldchain API",
        description = "Cold-storage warehouse operations: inbound and outbound \
order lifecycle, capacity-constrained lot/location inventory, and expiry tracking."
    ),
    paths(
        handlers::orders::create_order,
        handlers::orders::list_orders,
        handlers::orders::get_order,
        handlers::orders::transition_order,
        handlers::orders::reconcile_order,
        handlers::orders::complete_order,
        handlers::orders::cancel_order,
        handlers::inventory::add_inventory,
        handlers::inventory::list_inventory,
        handlers::locations::create_location,
        handlers::locations::list_locations,
        handlers::locations::get_location,
        handlers::locations::set_location_status,
    ),
    components(schemas(
        errors::ErrorResponse,
        handlers::orders::CreateOrderRequest,
        handlers::orders::CreateOrderLineRequest,
        handlers::orders::TransitionRequest,
        handlers::orders::ReconcileRequest,
        handlers::orders::ReconcileLineRequest,
        handlers::orders::OrderResponse,
        handlers::orders::OrderLineResponse,
        handlers::orders::OrderSummaryResponse,
        handlers::inventory::AddInventoryRequest,
        handlers::inventory::AddInventoryResponse,
        handlers::locations::CreateLocationRequest,
        handlers::locations::SetLocationStatusRequest,
        handlers::locations::LocationResponse,
        services::ledger::InventoryRow,
        services::expiry::ExpiryStatus,
        services::reconciliation::OrderTotals,
    )),
    tags(
        (name = "orders", description = "Inbound and outbound order lifecycle"),
        (name = "inventory", description = "Lot and location inventory ledger"),
        (name = "locations", description = "Storage location management")
    )
)]
pub struct ApiDoc;
