//! Shipment status machine.

use serde::{Deserialize, Serialize};

/// The status of a shipment in its lifecycle.
///
/// Any non-terminal status may transition to any status; only the five
/// terminal statuses refuse further transitions. The tracking history
/// keeps the full audit trail regardless of the path taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ShipmentStatus {
    /// Order has been placed, shipment record created.
    #[default]
    OrderPlaced,

    /// Order confirmed by the vendor.
    OrderConfirmed,

    /// Package is being prepared.
    Processing,

    /// Package is ready for courier pickup.
    ReadyForPickup,

    /// Courier has picked up the package.
    PickedUp,

    /// Package is on its way to a sorting hub.
    InTransitToHub,

    /// Package arrived at a sorting hub.
    ReachedHub,

    /// Package is in transit to the destination.
    InTransit,

    /// Package is out for delivery.
    OutForDelivery,

    /// A delivery attempt was made but not completed.
    DeliveryAttempted,

    /// Delivery has been rescheduled.
    Rescheduled,

    /// Package was delivered (terminal).
    Delivered,

    /// Package was returned to sender (terminal).
    Returned,

    /// Shipment was cancelled (terminal).
    Cancelled,

    /// Package was lost (terminal).
    Lost,

    /// Package was damaged (terminal).
    Damaged,
}

impl ShipmentStatus {
    /// Returns true if this is a terminal status (no further transitions).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ShipmentStatus::Delivered
                | ShipmentStatus::Returned
                | ShipmentStatus::Cancelled
                | ShipmentStatus::Lost
                | ShipmentStatus::Damaged
        )
    }

    /// Returns true if the shipment is still active (not terminal).
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns true if this status marks the package as having left the
    /// sender (sets the dispatched timestamp).
    pub fn is_dispatch(&self) -> bool {
        matches!(self, ShipmentStatus::PickedUp)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ShipmentStatus::OrderPlaced => "OrderPlaced",
            ShipmentStatus::OrderConfirmed => "OrderConfirmed",
            ShipmentStatus::Processing => "Processing",
            ShipmentStatus::ReadyForPickup => "ReadyForPickup",
            ShipmentStatus::PickedUp => "PickedUp",
            ShipmentStatus::InTransitToHub => "InTransitToHub",
            ShipmentStatus::ReachedHub => "ReachedHub",
            ShipmentStatus::InTransit => "InTransit",
            ShipmentStatus::OutForDelivery => "OutForDelivery",
            ShipmentStatus::DeliveryAttempted => "DeliveryAttempted",
            ShipmentStatus::Rescheduled => "Rescheduled",
            ShipmentStatus::Delivered => "Delivered",
            ShipmentStatus::Returned => "Returned",
            ShipmentStatus::Cancelled => "Cancelled",
            ShipmentStatus::Lost => "Lost",
            ShipmentStatus::Damaged => "Damaged",
        }
    }
}

impl std::fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_status_is_order_placed() {
        assert_eq!(ShipmentStatus::default(), ShipmentStatus::OrderPlaced);
    }

    #[test]
    fn terminal_statuses() {
        assert!(ShipmentStatus::Delivered.is_terminal());
        assert!(ShipmentStatus::Returned.is_terminal());
        assert!(ShipmentStatus::Cancelled.is_terminal());
        assert!(ShipmentStatus::Lost.is_terminal());
        assert!(ShipmentStatus::Damaged.is_terminal());

        assert!(!ShipmentStatus::OrderPlaced.is_terminal());
        assert!(!ShipmentStatus::InTransit.is_terminal());
        assert!(!ShipmentStatus::OutForDelivery.is_terminal());
        assert!(!ShipmentStatus::Rescheduled.is_terminal());
    }

    #[test]
    fn active_is_complement_of_terminal() {
        assert!(ShipmentStatus::InTransit.is_active());
        assert!(!ShipmentStatus::Delivered.is_active());
    }

    #[test]
    fn picked_up_is_dispatch() {
        assert!(ShipmentStatus::PickedUp.is_dispatch());
        assert!(!ShipmentStatus::InTransit.is_dispatch());
    }

    #[test]
    fn display() {
        assert_eq!(ShipmentStatus::OutForDelivery.to_string(), "OutForDelivery");
        assert_eq!(ShipmentStatus::Delivered.to_string(), "Delivered");
    }

    #[test]
    fn serialization_roundtrip() {
        let status = ShipmentStatus::DeliveryAttempted;
        let json = serde_json::to_string(&status).unwrap();
        let deserialized: ShipmentStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(status, deserialized);
    }
}
