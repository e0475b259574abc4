//! Workflow error types.

use ledger::LedgerError;
use thiserror::Error;

use crate::returns::ReturnError;
use crate::shipment::ShipmentError;

/// Errors that can occur during workflow operations.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// An error occurred in the tracking ledger.
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// An error occurred in the shipment state machine.
    #[error("Shipment error: {0}")]
    Shipment(ShipmentError),

    /// An error occurred in the return state machine.
    #[error("Return error: {0}")]
    Return(ReturnError),

    /// Entity not found.
    #[error("{entity} not found: {reference}")]
    NotFound {
        entity: &'static str,
        reference: String,
    },

    /// A uniqueness or cardinality invariant was violated.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
