//! Return status machine.

use serde::{Deserialize, Serialize};

/// The status of a return request in its lifecycle.
///
/// Unlike shipments, return transitions follow a fixed graph: each status
/// allows only a small set of successors, and the quality-check and refund
/// statuses are reachable only through their dedicated operations, never
/// through a generic status update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ReturnStatus {
    /// Customer has requested the return.
    #[default]
    Requested,

    /// Waiting for vendor or admin approval.
    PendingApproval,

    /// Return approved, pickup can be scheduled.
    Approved,

    /// Return rejected (terminal).
    Rejected,

    /// Pickup has been scheduled with a courier.
    PickupScheduled,

    /// Courier has collected the item.
    PickupCompleted,

    /// Item is in transit back to the vendor.
    InTransit,

    /// Item received at the vendor warehouse.
    Received,

    /// Item is undergoing quality inspection.
    QualityCheck,

    /// Inspection passed; resolution can proceed.
    QcPassed,

    /// Inspection failed (terminal).
    QcFailed,

    /// Refund is being processed.
    RefundInitiated,

    /// Refund has been paid out.
    RefundCompleted,

    /// Replacement or exchange item has been dispatched.
    ExchangeShipped,

    /// Return fully resolved (terminal).
    Completed,

    /// Return cancelled by the customer (terminal).
    Cancelled,
}

impl ReturnStatus {
    /// Returns the statuses reachable from this one via a generic status
    /// update. Quality-check and resolution statuses are absent here on
    /// purpose; they are entered only through their dedicated commands.
    pub fn allowed_transitions(&self) -> &'static [ReturnStatus] {
        match self {
            ReturnStatus::Requested => &[
                ReturnStatus::PendingApproval,
                ReturnStatus::Approved,
                ReturnStatus::Rejected,
                ReturnStatus::Cancelled,
            ],
            ReturnStatus::PendingApproval => &[
                ReturnStatus::Approved,
                ReturnStatus::Rejected,
                ReturnStatus::Cancelled,
            ],
            ReturnStatus::Approved => &[ReturnStatus::PickupScheduled, ReturnStatus::Cancelled],
            ReturnStatus::PickupScheduled => {
                &[ReturnStatus::PickupCompleted, ReturnStatus::Cancelled]
            }
            ReturnStatus::PickupCompleted => &[ReturnStatus::InTransit, ReturnStatus::Cancelled],
            ReturnStatus::InTransit => &[ReturnStatus::Received, ReturnStatus::Cancelled],
            ReturnStatus::Received => &[ReturnStatus::QualityCheck],
            // Everything past quality check moves via dedicated operations.
            ReturnStatus::QualityCheck
            | ReturnStatus::QcPassed
            | ReturnStatus::QcFailed
            | ReturnStatus::RefundInitiated
            | ReturnStatus::RefundCompleted
            | ReturnStatus::ExchangeShipped
            | ReturnStatus::Completed
            | ReturnStatus::Rejected
            | ReturnStatus::Cancelled => &[],
        }
    }

    /// Returns true if a generic update may move from this status to `to`.
    pub fn can_transition_to(&self, to: ReturnStatus) -> bool {
        self.allowed_transitions().contains(&to)
    }

    /// Returns true if this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ReturnStatus::Rejected
                | ReturnStatus::QcFailed
                | ReturnStatus::Completed
                | ReturnStatus::Cancelled
        )
    }

    /// Returns true if the return is still open.
    pub fn is_open(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns true if the customer may still cancel from this status.
    /// Cancellation closes after the item reaches the warehouse.
    pub fn can_cancel(&self) -> bool {
        matches!(
            self,
            ReturnStatus::Requested
                | ReturnStatus::PendingApproval
                | ReturnStatus::Approved
                | ReturnStatus::PickupScheduled
                | ReturnStatus::PickupCompleted
                | ReturnStatus::InTransit
        )
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReturnStatus::Requested => "Requested",
            ReturnStatus::PendingApproval => "PendingApproval",
            ReturnStatus::Approved => "Approved",
            ReturnStatus::Rejected => "Rejected",
            ReturnStatus::PickupScheduled => "PickupScheduled",
            ReturnStatus::PickupCompleted => "PickupCompleted",
            ReturnStatus::InTransit => "InTransit",
            ReturnStatus::Received => "Received",
            ReturnStatus::QualityCheck => "QualityCheck",
            ReturnStatus::QcPassed => "QcPassed",
            ReturnStatus::QcFailed => "QcFailed",
            ReturnStatus::RefundInitiated => "RefundInitiated",
            ReturnStatus::RefundCompleted => "RefundCompleted",
            ReturnStatus::ExchangeShipped => "ExchangeShipped",
            ReturnStatus::Completed => "Completed",
            ReturnStatus::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for ReturnStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
