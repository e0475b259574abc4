//! Fulfillment domain: shipment and return workflows over the tracking
//! ledger.
//!
//! Each workflow is an event-sourced aggregate: commands validate against
//! current state and emit events, the ledger appends them with optimistic
//! concurrency, and replay rebuilds the state. Services wrap the command
//! handler and add the cross-stream invariants (code uniqueness, one open
//! return per order item).

pub mod aggregate;
pub mod codes;
pub mod command;
pub mod error;
pub mod returns;
pub mod shipment;

pub use aggregate::{DomainEvent, EventSourced, SnapshotCapable};
pub use command::{Command, CommandHandler, CommandResult};
pub use error::WorkflowError;
pub use returns::{ReturnRequest, ReturnService};
pub use shipment::{Shipment, ShipmentService};
