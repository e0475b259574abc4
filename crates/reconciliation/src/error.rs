//! Reconciliation error types.

use ledger::LedgerError;
use thiserror::Error;

/// Errors that can occur during reconciliation scans.
#[derive(Debug, Error)]
pub enum ReconciliationError {
    /// An error occurred in the tracking ledger.
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// An error occurred in a workflow service.
    #[error("Workflow error: {0}")]
    Workflow(#[from] domain::WorkflowError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Alert sink error.
    #[error("Alert sink error: {0}")]
    AlertSink(String),
}

/// Convenience type alias for reconciliation results.
pub type Result<T> = std::result::Result<T, ReconciliationError>;
