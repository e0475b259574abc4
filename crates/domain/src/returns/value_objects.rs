//! Value objects for the return workflow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shipment::{Actor, Address, Money};

use super::ReturnStatus;

/// What the customer wants out of the return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ReturnType {
    /// Money back.
    #[default]
    Return,

    /// Swap for a different item.
    Exchange,

    /// Same item again.
    Replacement,

    /// Fix and send back.
    Repair,
}

impl ReturnType {
    /// Returns true if this return type resolves through a refund.
    pub fn is_refundable(&self) -> bool {
        matches!(self, ReturnType::Return)
    }

    /// Returns true if this return type resolves by dispatching an item.
    pub fn ships_replacement(&self) -> bool {
        matches!(self, ReturnType::Exchange | ReturnType::Replacement)
    }

    /// Returns the type name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReturnType::Return => "Return",
            ReturnType::Exchange => "Exchange",
            ReturnType::Replacement => "Replacement",
            ReturnType::Repair => "Repair",
        }
    }
}

impl std::fmt::Display for ReturnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why the customer is returning the item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReturnReason {
    Damaged,
    Defective,
    WrongItem,
    NotAsDescribed,
    SizeIssue,
    QualityIssue,
    ChangedMind,
    Other,
}

/// One entry in a return's status history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnStatusEvent {
    /// The status entered.
    pub status: ReturnStatus,

    /// Free-text comment.
    pub comment: String,

    /// Who moved the return.
    pub actor: Actor,

    /// When the status was entered.
    pub recorded_at: DateTime<Utc>,
}

impl ReturnStatusEvent {
    /// Creates a status event timestamped now.
    pub fn new(status: ReturnStatus, comment: impl Into<String>, actor: Actor) -> Self {
        Self {
            status,
            comment: comment.into(),
            actor,
            recorded_at: Utc::now(),
        }
    }
}

/// Courier pickup arrangements for collecting the returned item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickupDetails {
    /// Where the item is collected from.
    pub pickup_address: Address,

    /// When the courier is expected.
    pub scheduled_for: DateTime<Utc>,

    /// The courier company handling the pickup.
    pub courier_name: String,

    /// Courier-side reference for the pickup, if any.
    pub courier_reference: Option<String>,
}

/// Outcome of the warehouse quality inspection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityCheckResult {
    /// Whether the item passed inspection.
    pub passed: bool,

    /// Who inspected the item.
    pub inspector: String,

    /// Observed condition of the item.
    pub condition: String,

    /// Inspector's notes.
    pub notes: String,

    /// References to photos of any defects found.
    pub defect_images: Vec<String>,

    /// Whether the item can go back into stock.
    pub eligible_for_restock: bool,

    /// When the inspection happened.
    pub checked_at: DateTime<Utc>,
}

/// How a refund is paid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RefundMethod {
    /// Back to the original payment instrument.
    #[default]
    OriginalPayment,

    /// Store credit.
    StoreCredit,

    /// Bank transfer.
    BankTransfer,
}

/// Processing state of a refund.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RefundStatus {
    /// Not yet submitted to the payment provider.
    #[default]
    Pending,

    /// Submitted, awaiting settlement.
    Processing,

    /// Paid out.
    Completed,

    /// Payment provider rejected or reversed the refund.
    Failed,

    /// Withdrawn before settlement.
    Cancelled,
}

/// The refund attached to a return, tracked as a sub-state of the return.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundDetails {
    /// Payout channel.
    pub method: RefundMethod,

    /// Amount to pay the customer, after deductions.
    pub amount: Money,

    /// Amount withheld from the item price.
    pub deductions: Money,

    /// Why anything was withheld. Required when deductions are positive.
    pub deduction_reason: Option<String>,

    /// Processing state.
    pub status: RefundStatus,

    /// When the refund was initiated.
    pub initiated_at: DateTime<Utc>,

    /// When the refund settled, if it has.
    pub completed_at: Option<DateTime<Utc>>,

    /// Provider failure message, if the refund failed.
    pub failure_reason: Option<String>,
}
