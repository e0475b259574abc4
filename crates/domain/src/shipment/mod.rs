//! Shipment workflow: state machine, events, commands, and service.

mod aggregate;
mod commands;
mod events;
mod service;
mod state;
mod value_objects;

pub use aggregate::Shipment;
pub use commands::{AssignCourier, CreateReturnShipment, CreateShipment, UpdateShipmentStatus};
pub use events::{
    CourierAssignedData, ShipmentCreatedData, ShipmentEvent, ShipmentStatusUpdatedData,
};
pub use service::ShipmentService;
pub use state::ShipmentStatus;
pub use value_objects::{
    Actor, Address, CourierInfo, DeliveryMode, Money, PackageDetails, TrackingEvent,
};

/// Errors that can occur in shipment operations.
#[derive(Debug, thiserror::Error)]
pub enum ShipmentError {
    /// The shipment stream already has a creation event.
    #[error("Shipment already created")]
    AlreadyCreated,

    /// The operation requires a created shipment.
    #[error("Shipment not created yet")]
    NotCreated,

    /// The shipment is in a status that forbids the action.
    #[error("Cannot {action} a shipment in status {current_status}")]
    InvalidStateTransition {
        current_status: ShipmentStatus,
        action: &'static str,
    },
}
