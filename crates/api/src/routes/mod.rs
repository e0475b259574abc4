//! Route handlers and shared application state.

pub mod health;
pub mod metrics;
pub mod returns;
pub mod scan;
pub mod shipping;

use std::sync::Arc;

use domain::returns::ReturnService;
use domain::shipment::ShipmentService;
use ledger::Ledger;
use projections::{ActiveShipmentsView, OpenReturnsView, ProjectionProcessor};
use reconciliation::ReconciliationScanner;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<L: Ledger + Clone> {
    pub shipments: ShipmentService<L>,
    pub returns: ReturnService<L>,
    pub scanner: ReconciliationScanner<L>,
    pub active_shipments: Arc<ActiveShipmentsView>,
    pub open_returns: Arc<OpenReturnsView>,
    pub projection_processor: Arc<ProjectionProcessor<L>>,
}

pub(crate) fn parse_uuid(id: &str, what: &str) -> Result<uuid::Uuid, ApiError> {
    uuid::Uuid::parse_str(id).map_err(|e| ApiError::BadRequest(format!("Invalid {what}: {e}")))
}
