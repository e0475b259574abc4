//! Shared identifier types used across the fulfillment workflow engine.

mod types;

pub use types::{CustomerId, OrderId, OrderItemId, StreamId, VendorId};
