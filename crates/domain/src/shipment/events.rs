//! Shipment domain events.

use chrono::{DateTime, Utc};
use common::{CustomerId, OrderId, StreamId, VendorId};
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;

use super::{
    Actor, Address, CourierInfo, DeliveryMode, Money, PackageDetails, ShipmentStatus,
    TrackingEvent,
};

/// Events that can occur on a shipment stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ShipmentEvent {
    /// Shipment was created.
    ShipmentCreated(ShipmentCreatedData),

    /// A tracking event was appended and the current status moved.
    ShipmentStatusUpdated(ShipmentStatusUpdatedData),

    /// A courier was assigned to the shipment.
    CourierAssigned(CourierAssignedData),
}

impl DomainEvent for ShipmentEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ShipmentEvent::ShipmentCreated(_) => "ShipmentCreated",
            ShipmentEvent::ShipmentStatusUpdated(_) => "ShipmentStatusUpdated",
            ShipmentEvent::CourierAssigned(_) => "CourierAssigned",
        }
    }
}

/// Data for ShipmentCreated event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentCreatedData {
    /// The stream identity of the shipment.
    pub shipment_id: StreamId,

    /// Human-readable tracking number.
    pub tracking_number: String,

    /// The order this shipment fulfills.
    pub order_id: OrderId,

    /// The customer receiving the shipment.
    pub customer_id: CustomerId,

    /// The vendor dispatching the shipment.
    pub vendor_id: Option<VendorId>,

    /// Pickup address.
    pub pickup_address: Address,

    /// Delivery address.
    pub delivery_address: Address,

    /// Package dimensions and weight.
    pub package: PackageDetails,

    /// Delivery speed.
    pub delivery_mode: DeliveryMode,

    /// Shipping cost.
    pub shipping_cost: Money,

    /// Estimated delivery date, if known at creation.
    pub estimated_delivery: Option<DateTime<Utc>>,

    /// True when this shipment carries a return back to the vendor.
    pub is_return_shipment: bool,

    /// The original shipment, for return shipments.
    pub original_shipment_id: Option<StreamId>,

    /// Why the return shipment was raised, for return shipments.
    pub return_reason: Option<String>,

    /// When the shipment was created.
    pub created_at: DateTime<Utc>,
}

/// Data for ShipmentStatusUpdated event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentStatusUpdatedData {
    /// The tracking event appended to the history.
    pub event: TrackingEvent,
}

/// Data for CourierAssigned event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourierAssignedData {
    /// The assigned courier.
    pub courier: CourierInfo,

    /// When the courier was assigned.
    pub assigned_at: DateTime<Utc>,
}

// Convenience constructors for events
impl ShipmentEvent {
    /// Creates a ShipmentStatusUpdated event timestamped now.
    pub fn status_updated(
        status: ShipmentStatus,
        location: impl Into<String>,
        description: impl Into<String>,
        actor: Actor,
    ) -> Self {
        ShipmentEvent::ShipmentStatusUpdated(ShipmentStatusUpdatedData {
            event: TrackingEvent::new(status, location, description, actor),
        })
    }

    /// Creates a CourierAssigned event.
    pub fn courier_assigned(courier: CourierInfo) -> Self {
        ShipmentEvent::CourierAssigned(CourierAssignedData {
            courier,
            assigned_at: Utc::now(),
        })
    }
}
