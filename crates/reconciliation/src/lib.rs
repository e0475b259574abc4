//! Reconciliation: SLA scanning over the tracking ledger.
//!
//! The scanner replays shipment and return streams, flags streams whose
//! derived state has fallen out of its service-level window, and pushes
//! alerts to a pluggable [`AlertSink`].

pub mod alert;
pub mod error;
pub mod scanner;

pub use alert::{AlertSink, InMemoryAlertSink, SlaAlert};
pub use error::{ReconciliationError, Result};
pub use scanner::{ReconciliationReport, ReconciliationScanner, SlaConfig};
