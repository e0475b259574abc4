//! Active shipments read model — in-flight (non-terminal) shipments.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CustomerId, OrderId, StreamId};
use domain::shipment::{ShipmentEvent, ShipmentStatus};
use ledger::LedgerEntry;
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition};
use crate::read_model::ReadModel;

/// Summary of an in-flight shipment.
#[derive(Debug, Clone)]
pub struct ShipmentSummary {
    pub shipment_id: StreamId,
    pub tracking_number: String,
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    pub status: ShipmentStatus,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub is_return_shipment: bool,
    pub last_updated: DateTime<Utc>,
}

/// Read model view for active (non-terminal) shipments.
///
/// Shipments leave this view when they reach a terminal status; the
/// ledger keeps their full history.
#[derive(Clone)]
pub struct ActiveShipmentsView {
    shipments: Arc<RwLock<HashMap<StreamId, ShipmentSummary>>>,
    position: Arc<RwLock<ProjectionPosition>>,
}

impl ActiveShipmentsView {
    /// Creates a new empty view.
    pub fn new() -> Self {
        Self {
            shipments: Arc::new(RwLock::new(HashMap::new())),
            position: Arc::new(RwLock::new(ProjectionPosition::zero())),
        }
    }

    /// Gets a summary of a specific shipment.
    pub async fn get_shipment(&self, shipment_id: StreamId) -> Option<ShipmentSummary> {
        self.shipments.read().await.get(&shipment_id).cloned()
    }

    /// Gets all active shipments.
    pub async fn get_all(&self) -> Vec<ShipmentSummary> {
        self.shipments.read().await.values().cloned().collect()
    }

    /// Gets active shipments filtered by status.
    pub async fn get_by_status(&self, status: ShipmentStatus) -> Vec<ShipmentSummary> {
        self.shipments
            .read()
            .await
            .values()
            .filter(|s| s.status == status)
            .cloned()
            .collect()
    }

    /// Gets active shipments for a specific customer.
    pub async fn get_by_customer(&self, customer_id: CustomerId) -> Vec<ShipmentSummary> {
        self.shipments
            .read()
            .await
            .values()
            .filter(|s| s.customer_id == customer_id)
            .cloned()
            .collect()
    }

    /// Gets shipments whose estimated delivery has passed without a
    /// terminal status.
    pub async fn get_delayed(&self, now: DateTime<Utc>) -> Vec<ShipmentSummary> {
        self.shipments
            .read()
            .await
            .values()
            .filter(|s| s.estimated_delivery.is_some_and(|eta| eta < now))
            .cloned()
            .collect()
    }
}

impl Default for ActiveShipmentsView {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Projection for ActiveShipmentsView {
    fn name(&self) -> &'static str {
        "ActiveShipmentsView"
    }

    async fn handle(&self, entry: &LedgerEntry) -> Result<()> {
        if entry.stream_type != "Shipment" {
            let mut pos = self.position.write().await;
            *pos = pos.advance();
            return Ok(());
        }

        let event: ShipmentEvent = serde_json::from_value(entry.payload.clone())?;
        let shipment_id = entry.stream_id;

        let mut shipments = self.shipments.write().await;

        match event {
            ShipmentEvent::ShipmentCreated(data) => {
                shipments.insert(
                    shipment_id,
                    ShipmentSummary {
                        shipment_id,
                        tracking_number: data.tracking_number,
                        order_id: data.order_id,
                        customer_id: data.customer_id,
                        status: ShipmentStatus::OrderPlaced,
                        estimated_delivery: data.estimated_delivery,
                        is_return_shipment: data.is_return_shipment,
                        last_updated: data.created_at,
                    },
                );
            }
            ShipmentEvent::ShipmentStatusUpdated(data) => {
                if data.event.status.is_terminal() {
                    shipments.remove(&shipment_id);
                } else if let Some(summary) = shipments.get_mut(&shipment_id) {
                    summary.status = data.event.status;
                    summary.last_updated = data.event.recorded_at;
                }
            }
            ShipmentEvent::CourierAssigned(_) => {}
        }

        let mut pos = self.position.write().await;
        *pos = pos.advance();

        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        *self.position.read().await
    }

    async fn reset(&self) -> Result<()> {
        self.shipments.write().await.clear();
        *self.position.write().await = ProjectionPosition::zero();
        Ok(())
    }
}

impl ReadModel for ActiveShipmentsView {
    fn name(&self) -> &'static str {
        "ActiveShipmentsView"
    }

    fn count(&self) -> usize {
        // Use try_read to avoid blocking; returns 0 if lock is held
        self.shipments.try_read().map(|s| s.len()).unwrap_or(0)
    }
}
