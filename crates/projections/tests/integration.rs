//! Projections driven by real workflow services over a shared ledger.

use chrono::{Duration, Utc};
use common::{CustomerId, OrderId};
use domain::EventSourced;
use domain::shipment::{
    Actor, Address, CreateShipment, DeliveryMode, Money, PackageDetails, ShipmentService,
    ShipmentStatus, UpdateShipmentStatus,
};
use ledger::InMemoryLedger;
use projections::{
    ActiveShipmentsView, CodeDirectoryView, Projection, ProjectionProcessor,
};

fn create_cmd(customer_id: CustomerId, eta_hours: i64) -> CreateShipment {
    CreateShipment::new(
        OrderId::new(),
        customer_id,
        None,
        Address::new("1 Vendor Way", "Springfield", "IL", "62701", "US"),
        Address::new("9 Customer Rd", "Shelbyville", "IL", "62565", "US"),
        PackageDetails::default(),
        DeliveryMode::Standard,
        Money::from_cents(799),
        Some(Utc::now() + Duration::hours(eta_hours)),
    )
}

#[tokio::test]
async fn catch_up_builds_views_from_service_writes() {
    let ledger = InMemoryLedger::new();
    let service = ShipmentService::new(ledger.clone());
    let customer_id = CustomerId::new();

    let created = service
        .create_shipment(create_cmd(customer_id, 24))
        .await
        .unwrap();
    let shipment_id = created.entity.id().unwrap();
    let tracking = created.entity.tracking_number().to_string();

    service
        .update_status(UpdateShipmentStatus::new(
            shipment_id,
            ShipmentStatus::InTransit,
            "Hub 7",
            "Departed facility",
            Actor::Courier,
        ))
        .await
        .unwrap();

    let shipments = ActiveShipmentsView::new();
    let directory = CodeDirectoryView::new();
    let mut processor = ProjectionProcessor::new(ledger);
    processor.register(Box::new(shipments.clone()));
    processor.register(Box::new(directory.clone()));

    processor.run_catch_up().await.unwrap();

    let summary = shipments.get_shipment(shipment_id).await.unwrap();
    assert_eq!(summary.status, ShipmentStatus::InTransit);
    assert_eq!(summary.tracking_number, tracking);
    assert_eq!(
        directory.resolve_tracking_number(&tracking).await,
        Some(shipment_id)
    );
}

#[tokio::test]
async fn delayed_shipment_appears_until_delivered() {
    let ledger = InMemoryLedger::new();
    let service = ShipmentService::new(ledger.clone());

    // Estimated delivery an hour in the past, still in transit
    let created = service
        .create_shipment(create_cmd(CustomerId::new(), -1))
        .await
        .unwrap();
    let shipment_id = created.entity.id().unwrap();

    service
        .update_status(UpdateShipmentStatus::new(
            shipment_id,
            ShipmentStatus::InTransit,
            "Hub 7",
            "",
            Actor::Courier,
        ))
        .await
        .unwrap();

    let shipments = ActiveShipmentsView::new();
    let mut processor = ProjectionProcessor::new(ledger.clone());
    processor.register(Box::new(shipments.clone()));
    processor.run_catch_up().await.unwrap();

    let delayed = shipments.get_delayed(Utc::now()).await;
    assert_eq!(delayed.len(), 1);
    assert_eq!(delayed[0].shipment_id, shipment_id);

    // Delivery removes it from the active view, so it is no longer delayed
    service
        .update_status(UpdateShipmentStatus::new(
            shipment_id,
            ShipmentStatus::Delivered,
            "Front door",
            "Delivered",
            Actor::Courier,
        ))
        .await
        .unwrap();

    processor.run_catch_up().await.unwrap();
    assert!(shipments.get_delayed(Utc::now()).await.is_empty());
}

#[tokio::test]
async fn rebuild_reproduces_view_state() {
    let ledger = InMemoryLedger::new();
    let service = ShipmentService::new(ledger.clone());

    for _ in 0..3 {
        service
            .create_shipment(create_cmd(CustomerId::new(), 24))
            .await
            .unwrap();
    }

    let shipments = ActiveShipmentsView::new();
    let mut processor = ProjectionProcessor::new(ledger);
    processor.register(Box::new(shipments.clone()));

    processor.run_catch_up().await.unwrap();
    assert_eq!(shipments.get_all().await.len(), 3);

    processor.rebuild_all().await.unwrap();
    assert_eq!(shipments.get_all().await.len(), 3);
    assert_eq!(shipments.position().await.entries_processed, 3);
}
