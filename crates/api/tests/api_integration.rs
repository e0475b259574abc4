//! Integration tests for the API server.

use std::sync::OnceLock;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use ledger::InMemoryLedger;
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup() -> axum::Router {
    let ledger = InMemoryLedger::new();
    let state = api::create_default_state(ledger, &api::Config::default());
    api::create_app(state, get_metrics_handle())
}

fn address_json() -> serde_json::Value {
    serde_json::json!({
        "line1": "1 Main St",
        "city": "Springfield",
        "state": "IL",
        "postal_code": "62701",
        "country": "US"
    })
}

fn shipment_body(order_id: &str) -> serde_json::Value {
    serde_json::json!({
        "order_id": order_id,
        "pickup_address": address_json(),
        "delivery_address": address_json(),
        "shipping_cost_cents": 1299
    })
}

fn return_body(order_id: &str, order_item_id: &str, customer_id: &str) -> serde_json::Value {
    serde_json::json!({
        "order_id": order_id,
        "order_item_id": order_item_id,
        "customer_id": customer_id,
        "reason": "Damaged",
        "description": "Arrived cracked",
        "item_price_cents": 4500,
        "quantity": 2
    })
}

async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> axum::http::Response<Body> {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

async fn read_json(response: axum::http::Response<Body>) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn health_check() {
    let app = setup();

    let response = send(&app, "GET", "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = read_json(response).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn metrics_endpoint_renders() {
    let app = setup();

    let response = send(&app, "GET", "/metrics", None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn create_and_track_shipment() {
    let app = setup();
    let order_id = uuid::Uuid::new_v4().to_string();

    let response = send(&app, "POST", "/shipping/create", Some(shipment_body(&order_id))).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let created = read_json(response).await;
    assert_eq!(created["status"], "OrderPlaced");
    let tracking = created["tracking_number"].as_str().unwrap().to_string();
    assert_eq!(tracking.len(), 15);
    assert!(tracking.starts_with("SHP"));

    let response = send(&app, "GET", &format!("/shipping/track/{tracking}"), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let tracked = read_json(response).await;
    assert_eq!(tracked["order_id"], order_id);
    assert_eq!(tracked["history"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn duplicate_order_shipment_conflicts() {
    let app = setup();
    let order_id = uuid::Uuid::new_v4().to_string();

    let first = send(&app, "POST", "/shipping/create", Some(shipment_body(&order_id))).await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = send(&app, "POST", "/shipping/create", Some(shipment_body(&order_id))).await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn track_unknown_shipment_is_404() {
    let app = setup();

    let response = send(&app, "GET", "/shipping/track/SHP000000000000", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn status_update_and_terminal_rejection() {
    let app = setup();
    let order_id = uuid::Uuid::new_v4().to_string();

    let created = read_json(
        send(&app, "POST", "/shipping/create", Some(shipment_body(&order_id))).await,
    )
    .await;
    let tracking = created["tracking_number"].as_str().unwrap().to_string();

    let response = send(
        &app,
        "PUT",
        &format!("/shipping/{tracking}/status"),
        Some(serde_json::json!({
            "status": "Delivered",
            "location": "Front door",
            "actor": "Courier"
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let updated = read_json(response).await;
    assert_eq!(updated["status"], "Delivered");
    assert!(updated["delivered_at"].as_str().is_some());

    // Delivered is terminal; further transitions are rejected.
    let response = send(
        &app,
        "PUT",
        &format!("/shipping/{tracking}/status"),
        Some(serde_json::json!({ "status": "InTransit" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn assign_courier_to_shipment() {
    let app = setup();
    let order_id = uuid::Uuid::new_v4().to_string();

    let created = read_json(
        send(&app, "POST", "/shipping/create", Some(shipment_body(&order_id))).await,
    )
    .await;
    let tracking = created["tracking_number"].as_str().unwrap().to_string();

    let response = send(
        &app,
        "POST",
        &format!("/shipping/{tracking}/assign-courier"),
        Some(serde_json::json!({ "name": "Speedy Couriers", "service": "Express" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let updated = read_json(response).await;
    assert_eq!(updated["courier"]["name"], "Speedy Couriers");
}

#[tokio::test]
async fn return_shipment_reverses_addresses() {
    let app = setup();
    let order_id = uuid::Uuid::new_v4().to_string();

    let mut body = shipment_body(&order_id);
    body["delivery_address"]["line1"] = serde_json::json!("9 Customer Rd");
    let created = read_json(send(&app, "POST", "/shipping/create", Some(body)).await).await;
    let tracking = created["tracking_number"].as_str().unwrap().to_string();

    let response = send(
        &app,
        "POST",
        &format!("/shipping/{tracking}/return"),
        Some(serde_json::json!({ "reason": "Customer refused delivery" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let reversed = read_json(response).await;
    assert_eq!(reversed["is_return_shipment"], true);
    assert_eq!(reversed["pickup_address"]["line1"], "9 Customer Rd");
    assert_eq!(reversed["original_shipment_id"], created["id"]);
    assert_ne!(reversed["tracking_number"], created["tracking_number"]);
}

#[tokio::test]
async fn track_by_order_and_invalid_uuid() {
    let app = setup();
    let order_id = uuid::Uuid::new_v4().to_string();

    send(&app, "POST", "/shipping/create", Some(shipment_body(&order_id))).await;

    let response = send(&app, "GET", &format!("/shipping/track/order/{order_id}"), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, "GET", "/shipping/track/order/not-a-uuid", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let unknown = uuid::Uuid::new_v4();
    let response = send(&app, "GET", &format!("/shipping/track/order/{unknown}"), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_return_and_fetch_by_code() {
    let app = setup();
    let order_id = uuid::Uuid::new_v4().to_string();
    let order_item_id = uuid::Uuid::new_v4().to_string();
    let customer_id = uuid::Uuid::new_v4().to_string();

    let response = send(
        &app,
        "POST",
        "/returns/create",
        Some(return_body(&order_id, &order_item_id, &customer_id)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let created = read_json(response).await;
    assert_eq!(created["status"], "Requested");
    let code = created["return_code"].as_str().unwrap().to_string();
    assert!(code.starts_with("RET"));

    let response = send(&app, "GET", &format!("/returns/{code}"), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let fetched = read_json(response).await;
    assert_eq!(fetched["order_id"], order_id);
    assert_eq!(fetched["item_price_cents"], 4500);

    // Duplicate open return for the same order item conflicts.
    let response = send(
        &app,
        "POST",
        "/returns/create",
        Some(return_body(&order_id, &order_item_id, &customer_id)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn refund_rejected_before_quality_check() {
    let app = setup();
    let order_id = uuid::Uuid::new_v4().to_string();
    let order_item_id = uuid::Uuid::new_v4().to_string();
    let customer_id = uuid::Uuid::new_v4().to_string();

    let created = read_json(
        send(
            &app,
            "POST",
            "/returns/create",
            Some(return_body(&order_id, &order_item_id, &customer_id)),
        )
        .await,
    )
    .await;
    let code = created["return_code"].as_str().unwrap().to_string();

    let response = send(
        &app,
        "POST",
        &format!("/returns/{code}/refund/initiate"),
        Some(serde_json::json!({ "amount_cents": 9000 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn full_return_flow_through_refund() {
    let app = setup();
    let order_id = uuid::Uuid::new_v4().to_string();
    let order_item_id = uuid::Uuid::new_v4().to_string();
    let customer_id = uuid::Uuid::new_v4().to_string();

    let created = read_json(
        send(
            &app,
            "POST",
            "/returns/create",
            Some(return_body(&order_id, &order_item_id, &customer_id)),
        )
        .await,
    )
    .await;
    let code = created["return_code"].as_str().unwrap().to_string();

    // Approve, then book the pickup.
    let response = send(
        &app,
        "PUT",
        &format!("/returns/{code}/status"),
        Some(serde_json::json!({ "status": "Approved", "actor": "Admin" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(
        &app,
        "POST",
        &format!("/returns/{code}/schedule-pickup"),
        Some(serde_json::json!({
            "pickup_address": address_json(),
            "scheduled_for": "2026-09-01T10:00:00Z",
            "courier_name": "Speedy Couriers"
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Item travels back to the warehouse.
    for status in ["PickupCompleted", "InTransit", "Received", "QualityCheck"] {
        let response = send(
            &app,
            "PUT",
            &format!("/returns/{code}/status"),
            Some(serde_json::json!({ "status": status })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK, "transition to {status}");
    }

    let response = send(
        &app,
        "POST",
        &format!("/returns/{code}/quality-check"),
        Some(serde_json::json!({
            "passed": true,
            "inspector": "warehouse-7",
            "condition": "Good",
            "eligible_for_restock": true
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["status"], "QcPassed");

    // Amount must equal item price x quantity minus deductions.
    let response = send(
        &app,
        "POST",
        &format!("/returns/{code}/refund/initiate"),
        Some(serde_json::json!({ "amount_cents": 100 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(
        &app,
        "POST",
        &format!("/returns/{code}/refund/initiate"),
        Some(serde_json::json!({
            "amount_cents": 8500,
            "deductions_cents": 500,
            "deduction_reason": "Missing accessories"
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let initiated = read_json(response).await;
    assert_eq!(initiated["status"], "RefundInitiated");
    assert_eq!(initiated["refund"]["amount_cents"], 8500);

    let response = send(&app, "POST", &format!("/returns/{code}/refund/complete"), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let completed = read_json(response).await;
    assert_eq!(completed["status"], "Completed");
    assert_eq!(completed["refund"]["status"], "Completed");
}

#[tokio::test]
async fn refund_failure_is_recorded() {
    let app = setup();
    let order_id = uuid::Uuid::new_v4().to_string();
    let order_item_id = uuid::Uuid::new_v4().to_string();
    let customer_id = uuid::Uuid::new_v4().to_string();

    let created = read_json(
        send(
            &app,
            "POST",
            "/returns/create",
            Some(return_body(&order_id, &order_item_id, &customer_id)),
        )
        .await,
    )
    .await;
    let code = created["return_code"].as_str().unwrap().to_string();

    for status in [
        "Approved",
        "PickupScheduled",
        "PickupCompleted",
        "InTransit",
        "Received",
        "QualityCheck",
    ] {
        send(
            &app,
            "PUT",
            &format!("/returns/{code}/status"),
            Some(serde_json::json!({ "status": status })),
        )
        .await;
    }

    send(
        &app,
        "POST",
        &format!("/returns/{code}/quality-check"),
        Some(serde_json::json!({ "passed": true, "inspector": "warehouse-7" })),
    )
    .await;

    send(
        &app,
        "POST",
        &format!("/returns/{code}/refund/initiate"),
        Some(serde_json::json!({ "amount_cents": 9000 })),
    )
    .await;

    let response = send(
        &app,
        "POST",
        &format!("/returns/{code}/refund/fail"),
        Some(serde_json::json!({ "reason": "Card expired" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let failed = read_json(response).await;
    assert_eq!(failed["status"], "RefundInitiated");
    assert_eq!(failed["refund"]["status"], "Failed");
    assert_eq!(failed["refund"]["failure_reason"], "Card expired");
}

#[tokio::test]
async fn active_shipments_for_customer_from_view() {
    let app = setup();
    let customer_id = uuid::Uuid::new_v4().to_string();

    let mut body = shipment_body(&uuid::Uuid::new_v4().to_string());
    body["customer_id"] = serde_json::json!(customer_id);
    let created = read_json(send(&app, "POST", "/shipping/create", Some(body)).await).await;
    let tracking = created["tracking_number"].as_str().unwrap().to_string();

    let response = send(&app, "GET", &format!("/shipping/customer/{customer_id}"), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let shipments = read_json(response).await;
    assert_eq!(shipments.as_array().unwrap().len(), 1);
    assert_eq!(shipments[0]["tracking_number"], tracking);

    // Delivery removes the shipment from the active view.
    send(
        &app,
        "PUT",
        &format!("/shipping/{tracking}/status"),
        Some(serde_json::json!({ "status": "Delivered" })),
    )
    .await;

    let response = send(&app, "GET", &format!("/shipping/customer/{customer_id}"), None).await;
    let shipments = read_json(response).await;
    assert!(shipments.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn open_returns_for_customer() {
    let app = setup();
    let customer_id = uuid::Uuid::new_v4().to_string();

    for _ in 0..2 {
        let order_id = uuid::Uuid::new_v4().to_string();
        let order_item_id = uuid::Uuid::new_v4().to_string();
        let response = send(
            &app,
            "POST",
            "/returns/create",
            Some(return_body(&order_id, &order_item_id, &customer_id)),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = send(&app, "GET", &format!("/returns/customer/{customer_id}"), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let returns = read_json(response).await;
    assert_eq!(returns.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn reconciliation_scan_is_clean_for_fresh_data() {
    let app = setup();
    let order_id = uuid::Uuid::new_v4().to_string();

    send(&app, "POST", "/shipping/create", Some(shipment_body(&order_id))).await;

    let response = send(&app, "GET", "/reconciliation/scan", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let report = read_json(response).await;
    assert_eq!(report["total_alerts"], 0);
    assert!(report["scanned_at"].as_str().is_some());
}
