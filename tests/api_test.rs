//! HTTP surface tests: routing, envelopes, status codes and error bodies.

mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use common::{days_from_today, TestApp};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn request(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = match body {
        Some(json) => Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn orders_flow_over_http() {
    let app = TestApp::new().await;
    let router = coldchain_api::app_router(app.state.clone());

    // Create a storage location for the eventual putaway
    let (status, body) = request(
        &router,
        Method::POST,
        "/api/v1/locations",
        Some(json!({"code": "COLD-A-01", "zone": "COLD-A", "max_qty": 1000})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], json!(true));
    let location_id = body["data"]["id"].as_str().unwrap().to_string();

    // Create an inbound order
    let (status, body) = request(
        &router,
        Method::POST,
        "/api/v1/orders",
        Some(json!({
            "direction": "INBOUND",
            "counterparty_name": "Mekong Produce",
            "carrier": "Chillline Logistics",
            "scheduled_time": "2026-08-05T08:00:00Z",
            "priority": "HIGH",
            "lines": [{"sku": "MANGO-CAT-CHU", "quantity": 500, "unit": "kg"}]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let order = &body["data"];
    assert_eq!(order["status"], json!("PENDING"));
    assert_eq!(order["totals"]["total_expected"], json!(500));
    let order_id = order["id"].as_str().unwrap().to_string();
    let line_id = order["lines"][0]["id"].as_str().unwrap().to_string();

    // Walk to RECEIVING and record the receipt
    for target in ["SCHEDULED", "RECEIVING"] {
        let (status, _) = request(
            &router,
            Method::POST,
            &format!("/api/v1/orders/{order_id}/transition"),
            Some(json!({"status": target})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = request(
        &router,
        Method::POST,
        &format!("/api/v1/orders/{order_id}/reconcile"),
        Some(json!({
            "updates": [{
                "line_id": line_id,
                "received_qty": 480,
                "damaged_qty": 20,
                "lot_number": "LOT-2406-A",
                "expiry_date": days_from_today(60).to_string(),
                "location_id": location_id
            }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["lines"][0]["accepted_qty"], json!(460));
    assert_eq!(body["data"]["totals"]["total_received"], json!(480));
    assert_eq!(body["data"]["totals"]["total_damaged"], json!(20));

    // Finish the chain and complete into the ledger
    for target in ["QC", "PUTAWAY"] {
        let (status, _) = request(
            &router,
            Method::POST,
            &format!("/api/v1/orders/{order_id}/transition"),
            Some(json!({"status": target})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, body) = request(
        &router,
        Method::POST,
        &format!("/api/v1/orders/{order_id}/complete"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], json!("COMPLETED"));

    // The accepted stock shows up in the inventory listing
    let (status, body) = request(&router, Method::GET, "/api/v1/inventory", None).await;
    assert_eq!(status, StatusCode::OK);
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["quantity"], json!(460));
    assert_eq!(rows[0]["expiry_status"], json!("NORMAL"));
    assert_eq!(rows[0]["zone"], json!("COLD-A"));

    // Orders list filters by direction and status
    let (status, body) = request(
        &router,
        Method::GET,
        "/api/v1/orders?direction=INBOUND&status=COMPLETED",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], json!(1));
}

#[tokio::test]
async fn invalid_transition_maps_to_bad_request() {
    let app = TestApp::new().await;
    let router = coldchain_api::app_router(app.state.clone());

    let (_, body) = request(
        &router,
        Method::POST,
        "/api/v1/orders",
        Some(json!({
            "direction": "INBOUND",
            "counterparty_name": "Mekong Produce",
            "scheduled_time": "2026-08-05T08:00:00Z",
            "priority": "LOW",
            "lines": [{"sku": "MANGO-0", "quantity": 10}]
        })),
    )
    .await;
    let order_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = request(
        &router,
        Method::POST,
        &format!("/api/v1/orders/{order_id}/transition"),
        Some(json!({"status": "QC"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Bad Request"));
    assert!(body["message"].as_str().unwrap().contains("PENDING"));
}

#[tokio::test]
async fn capacity_failures_map_to_unprocessable_entity() {
    let app = TestApp::new().await;
    let router = coldchain_api::app_router(app.state.clone());
    let loc = app.location("COLD-B-01", "COLD-B", 100).await;

    let (status, body) = request(
        &router,
        Method::POST,
        "/api/v1/inventory",
        Some(json!({
            "sku": "MANGO-0",
            "location_id": loc.id,
            "lot_number": "LOT-1",
            "expiry_date": days_from_today(60).to_string(),
            "quantity": 150
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["message"].as_str().unwrap().contains("only 100 free"));
}

#[tokio::test]
async fn unknown_order_maps_to_not_found() {
    let app = TestApp::new().await;
    let router = coldchain_api::app_router(app.state.clone());

    let (status, body) = request(
        &router,
        Method::GET,
        "/api/v1/orders/00000000-0000-0000-0000-000000000000",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], json!("Not Found"));
}

#[tokio::test]
async fn health_and_docs_are_served() {
    let app = TestApp::new().await;
    let router = coldchain_api::app_router(app.state.clone());

    let (status, body) = request(&router, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("up"));
    assert_eq!(body["database"]["status"], json!("up"));

    let (status, body) = request(&router, Method::GET, "/api/v1/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], json!("coldchain-api"));

    let (status, body) = request(&router, Method::GET, "/api-docs/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/v1/orders"].is_object());
}

#[tokio::test]
async fn blocking_a_location_stops_new_intake() {
    let app = TestApp::new().await;
    let router = coldchain_api::app_router(app.state.clone());
    let loc = app.location("COLD-C-01", "COLD-C", 100).await;

    let (status, body) = request(
        &router,
        Method::PUT,
        &format!("/api/v1/locations/{}/status", loc.id),
        Some(json!({"status": "BLOCKED"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], json!("BLOCKED"));

    let (status, _) = request(
        &router,
        Method::POST,
        "/api/v1/inventory",
        Some(json!({
            "sku": "MANGO-0",
            "location_id": loc.id,
            "lot_number": "LOT-2",
            "expiry_date": days_from_today(60).to_string(),
            "quantity": 10
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}
