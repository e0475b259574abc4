//! On-demand reconciliation scan endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use chrono::Utc;
use ledger::Ledger;
use reconciliation::SlaAlert;
use serde::Serialize;

use crate::error::ApiError;

use super::AppState;

#[derive(Serialize)]
pub struct ScanResponse {
    pub scanned_at: String,
    pub total_alerts: usize,
    pub stale_shipments: Vec<SlaAlert>,
    pub overdue_shipments: Vec<SlaAlert>,
    pub stale_returns: Vec<SlaAlert>,
}

/// GET /reconciliation/scan — run the SLA scanner and report breaches.
#[tracing::instrument(skip(state))]
pub async fn run<L: Ledger + Clone + 'static>(
    State(state): State<Arc<AppState<L>>>,
) -> Result<Json<ScanResponse>, ApiError> {
    let now = Utc::now();
    let report = state.scanner.scan(now).await?;

    Ok(Json(ScanResponse {
        scanned_at: now.to_rfc3339(),
        total_alerts: report.total_alerts(),
        stale_shipments: report.stale_shipments,
        overdue_shipments: report.overdue_shipments,
        stale_returns: report.stale_returns,
    }))
}
