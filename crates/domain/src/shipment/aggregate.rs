//! Shipment aggregate implementation.

use chrono::{DateTime, Utc};
use common::{CustomerId, OrderId, StreamId, VendorId};
use ledger::Revision;
use serde::{Deserialize, Serialize};

use crate::aggregate::{EventSourced, SnapshotCapable};

use super::{
    Actor, Address, CourierInfo, DeliveryMode, Money, PackageDetails, ShipmentError, ShipmentEvent,
    ShipmentStatus, TrackingEvent,
    events::{CourierAssignedData, ShipmentCreatedData, ShipmentStatusUpdatedData},
};

/// Shipment aggregate root.
///
/// All derived fields (current status, timestamps, description) are a
/// cache of the tracking history's tail; replaying the stream from empty
/// reproduces them exactly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Shipment {
    /// Stream identity.
    id: Option<StreamId>,

    /// Current revision for optimistic concurrency.
    #[serde(default)]
    revision: Revision,

    /// Human-readable tracking number.
    tracking_number: String,

    /// The order this shipment fulfills.
    order_id: Option<OrderId>,

    /// The customer receiving the shipment.
    customer_id: Option<CustomerId>,

    /// The dispatching vendor.
    vendor_id: Option<VendorId>,

    pickup_address: Option<Address>,
    delivery_address: Option<Address>,
    package: PackageDetails,
    delivery_mode: DeliveryMode,
    shipping_cost: Money,
    courier: Option<CourierInfo>,

    /// Current status; always equals the last history element's status.
    status: ShipmentStatus,

    /// Description from the last tracking event.
    status_description: String,

    /// Append-only tracking history.
    history: Vec<TrackingEvent>,

    estimated_delivery: Option<DateTime<Utc>>,
    dispatched_at: Option<DateTime<Utc>>,
    delivered_at: Option<DateTime<Utc>>,
    last_updated: Option<DateTime<Utc>>,

    /// True when this shipment carries a return back to the vendor.
    is_return_shipment: bool,

    /// The forward shipment this return shipment reverses.
    original_shipment_id: Option<StreamId>,

    /// Why the return shipment was raised.
    return_reason: Option<String>,
}

impl EventSourced for Shipment {
    type Event = ShipmentEvent;
    type Error = ShipmentError;

    fn stream_type() -> &'static str {
        "Shipment"
    }

    fn id(&self) -> Option<StreamId> {
        self.id
    }

    fn revision(&self) -> Revision {
        self.revision
    }

    fn set_revision(&mut self, revision: Revision) {
        self.revision = revision;
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            ShipmentEvent::ShipmentCreated(data) => self.apply_created(data),
            ShipmentEvent::ShipmentStatusUpdated(data) => self.apply_status_updated(data),
            ShipmentEvent::CourierAssigned(data) => self.apply_courier_assigned(data),
        }
    }
}

impl SnapshotCapable for Shipment {
    fn snapshot_interval() -> usize {
        50
    }
}

// Query methods
impl Shipment {
    pub fn tracking_number(&self) -> &str {
        &self.tracking_number
    }

    pub fn order_id(&self) -> Option<OrderId> {
        self.order_id
    }

    pub fn customer_id(&self) -> Option<CustomerId> {
        self.customer_id
    }

    pub fn vendor_id(&self) -> Option<VendorId> {
        self.vendor_id
    }

    pub fn status(&self) -> ShipmentStatus {
        self.status
    }

    pub fn status_description(&self) -> &str {
        &self.status_description
    }

    /// Returns the full tracking history, oldest first.
    pub fn history(&self) -> &[TrackingEvent] {
        &self.history
    }

    pub fn courier(&self) -> Option<&CourierInfo> {
        self.courier.as_ref()
    }

    pub fn pickup_address(&self) -> Option<&Address> {
        self.pickup_address.as_ref()
    }

    pub fn delivery_address(&self) -> Option<&Address> {
        self.delivery_address.as_ref()
    }

    pub fn package(&self) -> PackageDetails {
        self.package
    }

    pub fn delivery_mode(&self) -> DeliveryMode {
        self.delivery_mode
    }

    pub fn shipping_cost(&self) -> Money {
        self.shipping_cost
    }

    pub fn estimated_delivery(&self) -> Option<DateTime<Utc>> {
        self.estimated_delivery
    }

    pub fn dispatched_at(&self) -> Option<DateTime<Utc>> {
        self.dispatched_at
    }

    pub fn delivered_at(&self) -> Option<DateTime<Utc>> {
        self.delivered_at
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    pub fn is_return_shipment(&self) -> bool {
        self.is_return_shipment
    }

    pub fn original_shipment_id(&self) -> Option<StreamId> {
        self.original_shipment_id
    }

    pub fn return_reason(&self) -> Option<&str> {
        self.return_reason.as_deref()
    }

    /// Returns true if the shipment is in a terminal status.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Returns true if the shipment is still active.
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

// Command methods (return events)
impl Shipment {
    /// Creates the shipment.
    pub fn create(&self, data: ShipmentCreatedData) -> Result<Vec<ShipmentEvent>, ShipmentError> {
        if self.id.is_some() {
            return Err(ShipmentError::AlreadyCreated);
        }

        Ok(vec![ShipmentEvent::ShipmentCreated(data)])
    }

    /// Applies a status transition.
    ///
    /// Terminal shipments refuse further transitions; any non-terminal
    /// shipment accepts any status.
    pub fn update_status(
        &self,
        status: ShipmentStatus,
        location: impl Into<String>,
        description: impl Into<String>,
        actor: Actor,
    ) -> Result<Vec<ShipmentEvent>, ShipmentError> {
        if self.id.is_none() {
            return Err(ShipmentError::NotCreated);
        }

        if self.status.is_terminal() {
            return Err(ShipmentError::InvalidStateTransition {
                current_status: self.status,
                action: "update status",
            });
        }

        Ok(vec![ShipmentEvent::status_updated(
            status,
            location,
            description,
            actor,
        )])
    }

    /// Assigns a courier to an active shipment.
    pub fn assign_courier(
        &self,
        courier: CourierInfo,
    ) -> Result<Vec<ShipmentEvent>, ShipmentError> {
        if self.id.is_none() {
            return Err(ShipmentError::NotCreated);
        }

        if self.status.is_terminal() {
            return Err(ShipmentError::InvalidStateTransition {
                current_status: self.status,
                action: "assign courier",
            });
        }

        Ok(vec![ShipmentEvent::courier_assigned(courier)])
    }
}

// Apply event helpers
impl Shipment {
    fn apply_created(&mut self, data: ShipmentCreatedData) {
        self.id = Some(data.shipment_id);
        self.tracking_number = data.tracking_number;
        self.order_id = Some(data.order_id);
        self.customer_id = Some(data.customer_id);
        self.vendor_id = data.vendor_id;
        self.pickup_address = Some(data.pickup_address);
        self.delivery_address = Some(data.delivery_address);
        self.package = data.package;
        self.delivery_mode = data.delivery_mode;
        self.shipping_cost = data.shipping_cost;
        self.estimated_delivery = data.estimated_delivery;
        self.is_return_shipment = data.is_return_shipment;
        self.original_shipment_id = data.original_shipment_id;
        self.return_reason = data.return_reason;

        // Seed the history so current status always has a backing event.
        let initial = TrackingEvent {
            status: ShipmentStatus::OrderPlaced,
            location: String::new(),
            description: "Shipment created".to_string(),
            actor: Actor::System,
            recorded_at: data.created_at,
        };
        self.status = initial.status;
        self.status_description = initial.description.clone();
        self.last_updated = Some(initial.recorded_at);
        self.history.push(initial);
    }

    fn apply_status_updated(&mut self, data: ShipmentStatusUpdatedData) {
        let event = data.event;
        self.status = event.status;
        self.status_description = event.description.clone();
        self.last_updated = Some(event.recorded_at);

        if event.status == ShipmentStatus::Delivered {
            self.delivered_at = Some(event.recorded_at);
        }
        if event.status.is_dispatch() && self.dispatched_at.is_none() {
            self.dispatched_at = Some(event.recorded_at);
        }

        self.history.push(event);
    }

    fn apply_courier_assigned(&mut self, data: CourierAssignedData) {
        self.courier = Some(data.courier);
    }
}
