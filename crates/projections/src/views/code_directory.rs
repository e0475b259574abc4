//! Code directory read model — resolves human-facing codes to streams.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::StreamId;
use domain::returns::ReturnEvent;
use domain::shipment::ShipmentEvent;
use ledger::LedgerEntry;
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition};
use crate::read_model::ReadModel;

/// Read model mapping tracking numbers and return codes to stream IDs.
///
/// Codes are never removed: a delivered shipment's tracking number still
/// resolves, so historical lookups keep working.
#[derive(Clone)]
pub struct CodeDirectoryView {
    tracking_numbers: Arc<RwLock<HashMap<String, StreamId>>>,
    return_codes: Arc<RwLock<HashMap<String, StreamId>>>,
    position: Arc<RwLock<ProjectionPosition>>,
}

impl CodeDirectoryView {
    /// Creates a new empty directory.
    pub fn new() -> Self {
        Self {
            tracking_numbers: Arc::new(RwLock::new(HashMap::new())),
            return_codes: Arc::new(RwLock::new(HashMap::new())),
            position: Arc::new(RwLock::new(ProjectionPosition::zero())),
        }
    }

    /// Resolves a tracking number to its shipment stream.
    pub async fn resolve_tracking_number(&self, tracking_number: &str) -> Option<StreamId> {
        self.tracking_numbers.read().await.get(tracking_number).copied()
    }

    /// Resolves a return code to its return stream.
    pub async fn resolve_return_code(&self, return_code: &str) -> Option<StreamId> {
        self.return_codes.read().await.get(return_code).copied()
    }
}

impl Default for CodeDirectoryView {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Projection for CodeDirectoryView {
    fn name(&self) -> &'static str {
        "CodeDirectoryView"
    }

    async fn handle(&self, entry: &LedgerEntry) -> Result<()> {
        match entry.stream_type.as_str() {
            "Shipment" if entry.entry_type == "ShipmentCreated" => {
                let event: ShipmentEvent = serde_json::from_value(entry.payload.clone())?;
                if let ShipmentEvent::ShipmentCreated(data) = event {
                    self.tracking_numbers
                        .write()
                        .await
                        .insert(data.tracking_number, entry.stream_id);
                }
            }
            "Return" if entry.entry_type == "ReturnRequested" => {
                let event: ReturnEvent = serde_json::from_value(entry.payload.clone())?;
                if let ReturnEvent::ReturnRequested(data) = event {
                    self.return_codes
                        .write()
                        .await
                        .insert(data.return_code, entry.stream_id);
                }
            }
            _ => {}
        }

        let mut pos = self.position.write().await;
        *pos = pos.advance();

        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        *self.position.read().await
    }

    async fn reset(&self) -> Result<()> {
        self.tracking_numbers.write().await.clear();
        self.return_codes.write().await.clear();
        *self.position.write().await = ProjectionPosition::zero();
        Ok(())
    }
}

impl ReadModel for CodeDirectoryView {
    fn name(&self) -> &'static str {
        "CodeDirectoryView"
    }

    fn count(&self) -> usize {
        let tracking = self.tracking_numbers.try_read().map(|m| m.len()).unwrap_or(0);
        let codes = self.return_codes.try_read().map(|m| m.len()).unwrap_or(0);
        tracking + codes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use common::{CustomerId, OrderId, OrderItemId};
    use domain::DomainEvent;
    use domain::returns::{ReturnReason, ReturnRequestedData, ReturnType};
    use domain::shipment::{
        Actor, Address, DeliveryMode, Money, PackageDetails, ShipmentCreatedData, ShipmentStatus,
    };
    use ledger::Revision;

    fn shipment_entry(stream_id: StreamId, tracking_number: &str) -> LedgerEntry {
        let event = ShipmentEvent::ShipmentCreated(ShipmentCreatedData {
            shipment_id: stream_id,
            tracking_number: tracking_number.to_string(),
            order_id: OrderId::new(),
            customer_id: CustomerId::new(),
            vendor_id: None,
            pickup_address: Address::new("1 Vendor Way", "Springfield", "IL", "62701", "US"),
            delivery_address: Address::new("9 Customer Rd", "Shelbyville", "IL", "62565", "US"),
            package: PackageDetails::default(),
            delivery_mode: DeliveryMode::Standard,
            shipping_cost: Money::from_cents(799),
            estimated_delivery: None,
            is_return_shipment: false,
            original_shipment_id: None,
            return_reason: None,
            created_at: Utc::now(),
        });
        LedgerEntry::builder()
            .stream_id(stream_id)
            .stream_type("Shipment")
            .entry_type(event.event_type())
            .revision(Revision::first())
            .payload(&event)
            .unwrap()
            .build()
    }

    fn return_entry(stream_id: StreamId, return_code: &str) -> LedgerEntry {
        let event = ReturnEvent::ReturnRequested(ReturnRequestedData {
            return_id: stream_id,
            return_code: return_code.to_string(),
            order_id: OrderId::new(),
            order_item_id: OrderItemId::new(),
            customer_id: CustomerId::new(),
            return_type: ReturnType::Return,
            reason: ReturnReason::Damaged,
            description: String::new(),
            item_price: Money::from_cents(450),
            quantity: 1,
            requested_at: Utc::now(),
        });
        LedgerEntry::builder()
            .stream_id(stream_id)
            .stream_type("Return")
            .entry_type(event.event_type())
            .revision(Revision::first())
            .payload(&event)
            .unwrap()
            .build()
    }

    #[tokio::test]
    async fn resolves_tracking_numbers_and_return_codes() {
        let view = CodeDirectoryView::new();
        let shipment_id = StreamId::new();
        let return_id = StreamId::new();

        view.handle(&shipment_entry(shipment_id, "SHP123456780001"))
            .await
            .unwrap();
        view.handle(&return_entry(return_id, "RET17000000000001234"))
            .await
            .unwrap();

        assert_eq!(
            view.resolve_tracking_number("SHP123456780001").await,
            Some(shipment_id)
        );
        assert_eq!(
            view.resolve_return_code("RET17000000000001234").await,
            Some(return_id)
        );
        assert_eq!(view.resolve_tracking_number("SHP000000000000").await, None);
    }

    #[tokio::test]
    async fn codes_survive_terminal_status() {
        let view = CodeDirectoryView::new();
        let shipment_id = StreamId::new();

        view.handle(&shipment_entry(shipment_id, "SHP123456780001"))
            .await
            .unwrap();

        let event =
            ShipmentEvent::status_updated(ShipmentStatus::Delivered, "", "", Actor::Courier);
        let entry = LedgerEntry::builder()
            .stream_id(shipment_id)
            .stream_type("Shipment")
            .entry_type(event.event_type())
            .revision(Revision::new(2))
            .payload(&event)
            .unwrap()
            .build();
        view.handle(&entry).await.unwrap();

        assert_eq!(
            view.resolve_tracking_number("SHP123456780001").await,
            Some(shipment_id)
        );
    }
}
