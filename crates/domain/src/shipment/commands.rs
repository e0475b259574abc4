//! Shipment commands.

use chrono::{DateTime, Utc};
use common::{CustomerId, OrderId, StreamId, VendorId};

use crate::command::Command;

use super::{Actor, Address, CourierInfo, DeliveryMode, Money, PackageDetails, Shipment,
    ShipmentStatus};

/// Command to create a new shipment for an order.
#[derive(Debug, Clone)]
pub struct CreateShipment {
    /// The stream ID to create the shipment under.
    pub shipment_id: StreamId,

    /// The order being dispatched.
    pub order_id: OrderId,

    /// The receiving customer.
    pub customer_id: CustomerId,

    /// The dispatching vendor.
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

    /// Estimated delivery date, if known.
    pub estimated_delivery: Option<DateTime<Utc>>,
}

impl CreateShipment {
    /// Creates a command with a generated stream ID.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        order_id: OrderId,
        customer_id: CustomerId,
        vendor_id: Option<VendorId>,
        pickup_address: Address,
        delivery_address: Address,
        package: PackageDetails,
        delivery_mode: DeliveryMode,
        shipping_cost: Money,
        estimated_delivery: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            shipment_id: StreamId::new(),
            order_id,
            customer_id,
            vendor_id,
            pickup_address,
            delivery_address,
            package,
            delivery_mode,
            shipping_cost,
            estimated_delivery,
        }
    }
}

impl Command for CreateShipment {
    type Entity = Shipment;

    fn stream_id(&self) -> StreamId {
        self.shipment_id
    }
}

/// Command to apply a status transition to a shipment.
#[derive(Debug, Clone)]
pub struct UpdateShipmentStatus {
    /// The shipment to transition.
    pub shipment_id: StreamId,

    /// The status to move to.
    pub status: ShipmentStatus,

    /// Where the event was recorded.
    pub location: String,

    /// Free-text description of the event.
    pub description: String,

    /// Who recorded the event.
    pub actor: Actor,
}

impl UpdateShipmentStatus {
    /// Creates a new UpdateShipmentStatus command.
    pub fn new(
        shipment_id: StreamId,
        status: ShipmentStatus,
        location: impl Into<String>,
        description: impl Into<String>,
        actor: Actor,
    ) -> Self {
        Self {
            shipment_id,
            status,
            location: location.into(),
            description: description.into(),
            actor,
        }
    }
}

impl Command for UpdateShipmentStatus {
    type Entity = Shipment;

    fn stream_id(&self) -> StreamId {
        self.shipment_id
    }
}

/// Command to assign a courier to a shipment.
#[derive(Debug, Clone)]
pub struct AssignCourier {
    /// The shipment to assign the courier to.
    pub shipment_id: StreamId,

    /// The courier being assigned.
    pub courier: CourierInfo,
}

impl AssignCourier {
    /// Creates a new AssignCourier command.
    pub fn new(shipment_id: StreamId, courier: CourierInfo) -> Self {
        Self {
            shipment_id,
            courier,
        }
    }
}

impl Command for AssignCourier {
    type Entity = Shipment;

    fn stream_id(&self) -> StreamId {
        self.shipment_id
    }
}

/// Command to create a return shipment reversing an existing shipment.
#[derive(Debug, Clone)]
pub struct CreateReturnShipment {
    /// The forward shipment being reversed.
    pub original_shipment_id: StreamId,

    /// Why the return shipment is raised.
    pub reason: String,
}

impl CreateReturnShipment {
    /// Creates a new CreateReturnShipment command.
    pub fn new(original_shipment_id: StreamId, reason: impl Into<String>) -> Self {
        Self {
            original_shipment_id,
            reason: reason.into(),
        }
    }
}

impl Command for CreateReturnShipment {
    type Entity = Shipment;

    fn stream_id(&self) -> StreamId {
        self.original_shipment_id
    }
}
