//! Return workflow: status graph, quality check, refund sub-state,
//! exchanges, and service.

mod aggregate;
mod commands;
mod events;
mod service;
mod state;
mod value_objects;

pub use aggregate::ReturnRequest;
pub use commands::{
    CancelReturn, InitiateRefund, RequestReturn, SchedulePickup, ShipExchange, SubmitQualityCheck,
    UpdateReturnStatus,
};
pub use events::{
    ExchangeShippedData, PickupScheduledData, QualityCheckRecordedData, RefundCompletedData,
    RefundFailedData, RefundInitiatedData, ReturnCompletedData, ReturnEvent, ReturnRequestedData,
    ReturnStatusChangedData,
};
pub use service::ReturnService;
pub use state::ReturnStatus;
pub use value_objects::{
    PickupDetails, QualityCheckResult, RefundDetails, RefundMethod, RefundStatus, ReturnReason,
    ReturnStatusEvent, ReturnType,
};

use crate::shipment::Money;

/// Errors that can occur in return operations.
#[derive(Debug, thiserror::Error)]
pub enum ReturnError {
    /// The return stream already has a creation event.
    #[error("Return already created")]
    AlreadyCreated,

    /// The operation requires a created return.
    #[error("Return not created yet")]
    NotCreated,

    /// The status graph does not allow this transition.
    #[error("Cannot transition return from {from} to {to}")]
    InvalidTransition { from: ReturnStatus, to: ReturnStatus },

    /// The return is in a status that forbids the action.
    #[error("Cannot {action} a return in status {current_status}")]
    InvalidStateTransition {
        current_status: ReturnStatus,
        action: &'static str,
    },

    /// The refund sub-state forbids settlement.
    #[error("Cannot settle a refund in status {refund_status:?}")]
    RefundNotInProgress { refund_status: RefundStatus },

    /// The return type does not support this resolution path.
    #[error("Cannot {action} for a {return_type} return")]
    UnsupportedResolution {
        return_type: ReturnType,
        action: &'static str,
    },

    /// The proposed refund amount does not match the computed one.
    #[error("Refund amount mismatch: expected {expected}, got {actual}")]
    RefundAmountMismatch { expected: Money, actual: Money },

    /// Positive deductions were given without a reason.
    #[error("A deduction reason is required when deductions are positive")]
    DeductionReasonRequired,
}
