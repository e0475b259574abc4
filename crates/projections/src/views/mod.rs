//! Read model views over the tracking ledger.

mod active_shipments;
mod code_directory;
mod open_returns;

pub use active_shipments::{ActiveShipmentsView, ShipmentSummary};
pub use code_directory::CodeDirectoryView;
pub use open_returns::{OpenReturnsView, ReturnSummary};
