//! Scanner end-to-end: workflow services write, the scanner alerts.

use chrono::{Duration, Utc};
use common::{CustomerId, OrderId, OrderItemId};
use domain::EventSourced;
use domain::returns::{
    RequestReturn, ReturnReason, ReturnService, ReturnStatus, ReturnType, UpdateReturnStatus,
};
use domain::shipment::{
    Actor, Address, CreateShipment, DeliveryMode, Money, PackageDetails, ShipmentService,
    ShipmentStatus, UpdateShipmentStatus,
};
use ledger::InMemoryLedger;
use reconciliation::{InMemoryAlertSink, ReconciliationScanner, SlaConfig};

fn create_cmd(eta_hours: Option<i64>) -> CreateShipment {
    CreateShipment::new(
        OrderId::new(),
        CustomerId::new(),
        None,
        Address::new("1 Vendor Way", "Springfield", "IL", "62701", "US"),
        Address::new("9 Customer Rd", "Shelbyville", "IL", "62565", "US"),
        PackageDetails::default(),
        DeliveryMode::Standard,
        Money::from_cents(799),
        eta_hours.map(|h| Utc::now() + Duration::hours(h)),
    )
}

#[tokio::test]
async fn run_delivers_alerts_to_sink() {
    let ledger = InMemoryLedger::new();
    let shipments = ShipmentService::new(ledger.clone());
    let returns = ReturnService::new(ledger.clone());

    // Overdue: estimated delivery already passed
    shipments
        .create_shipment(create_cmd(Some(-2)))
        .await
        .unwrap();

    // Healthy: delivered before its window closed
    let delivered = shipments
        .create_shipment(create_cmd(Some(24)))
        .await
        .unwrap();
    shipments
        .update_status(UpdateShipmentStatus::new(
            delivered.entity.id().unwrap(),
            ShipmentStatus::Delivered,
            "",
            "Delivered",
            Actor::Courier,
        ))
        .await
        .unwrap();

    // Open return that will go quiet
    returns
        .request_return(RequestReturn::new(
            OrderId::new(),
            OrderItemId::new(),
            CustomerId::new(),
            ReturnType::Return,
            ReturnReason::Defective,
            "Stopped working",
            Money::from_cents(2500),
            1,
        ))
        .await
        .unwrap();

    let scanner = ReconciliationScanner::new(ledger, SlaConfig::default());
    let sink = InMemoryAlertSink::new();

    // Scan two days out: the overdue shipment is also stale by then
    let report = scanner
        .run(&sink, Utc::now() + Duration::hours(48))
        .await
        .unwrap();

    assert_eq!(report.overdue_shipments.len(), 1);
    assert_eq!(report.stale_shipments.len(), 1);
    assert_eq!(report.stale_returns.len(), 1);
    assert_eq!(sink.alert_count(), 3);

    // The returned report is the one whose alerts were delivered.
    let delivered: Vec<&'static str> = sink.alerts().iter().map(|a| a.kind()).collect();
    let mut reported: Vec<&'static str> = report.alerts().map(|a| a.kind()).collect();
    reported.sort_unstable();
    let mut delivered_sorted = delivered.clone();
    delivered_sorted.sort_unstable();
    assert_eq!(delivered_sorted, reported);

    assert!(delivered.contains(&"overdue_shipment"));
    assert!(delivered.contains(&"stale_shipment"));
    assert!(delivered.contains(&"stale_return"));
}

#[tokio::test]
async fn active_return_with_recent_progress_is_not_flagged() {
    let ledger = InMemoryLedger::new();
    let returns = ReturnService::new(ledger.clone());

    let created = returns
        .request_return(RequestReturn::new(
            OrderId::new(),
            OrderItemId::new(),
            CustomerId::new(),
            ReturnType::Return,
            ReturnReason::Damaged,
            "Arrived cracked",
            Money::from_cents(450),
            1,
        ))
        .await
        .unwrap();

    returns
        .update_status(UpdateReturnStatus::new(
            created.entity.id().unwrap(),
            ReturnStatus::Approved,
            "Approved",
            Actor::Admin,
        ))
        .await
        .unwrap();

    let scanner = ReconciliationScanner::new(ledger, SlaConfig::default());
    let report = scanner.scan(Utc::now()).await.unwrap();
    assert!(report.is_clean());
}
