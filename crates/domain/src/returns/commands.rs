//! Return commands.

use common::{CustomerId, OrderId, OrderItemId, StreamId};

use crate::command::Command;
use crate::shipment::{Actor, Money};

use super::{
    PickupDetails, QualityCheckResult, RefundMethod, ReturnReason, ReturnRequest, ReturnStatus,
    ReturnType,
};

/// Command to request a return for an order item.
#[derive(Debug, Clone)]
pub struct RequestReturn {
    /// The stream ID to create the return under.
    pub return_id: StreamId,

    /// The order the item belongs to.
    pub order_id: OrderId,

    /// The specific order line being returned.
    pub order_item_id: OrderItemId,

    /// The customer raising the return.
    pub customer_id: CustomerId,

    /// What the customer wants out of the return.
    pub return_type: ReturnType,

    /// Why the item is coming back.
    pub reason: ReturnReason,

    /// Free-text elaboration from the customer.
    pub description: String,

    /// Unit price of the item.
    pub item_price: Money,

    /// How many units are being returned.
    pub quantity: u32,
}

impl RequestReturn {
    /// Creates a command with a generated stream ID.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        order_id: OrderId,
        order_item_id: OrderItemId,
        customer_id: CustomerId,
        return_type: ReturnType,
        reason: ReturnReason,
        description: impl Into<String>,
        item_price: Money,
        quantity: u32,
    ) -> Self {
        Self {
            return_id: StreamId::new(),
            order_id,
            order_item_id,
            customer_id,
            return_type,
            reason,
            description: description.into(),
            item_price,
            quantity,
        }
    }
}

impl Command for RequestReturn {
    type Entity = ReturnRequest;

    fn stream_id(&self) -> StreamId {
        self.return_id
    }
}

/// Command to move a return along the status graph.
#[derive(Debug, Clone)]
pub struct UpdateReturnStatus {
    /// The return to transition.
    pub return_id: StreamId,

    /// The status to move to.
    pub status: ReturnStatus,

    /// Free-text comment.
    pub comment: String,

    /// Who moved the return.
    pub actor: Actor,
}

impl UpdateReturnStatus {
    /// Creates a new UpdateReturnStatus command.
    pub fn new(
        return_id: StreamId,
        status: ReturnStatus,
        comment: impl Into<String>,
        actor: Actor,
    ) -> Self {
        Self {
            return_id,
            status,
            comment: comment.into(),
            actor,
        }
    }
}

impl Command for UpdateReturnStatus {
    type Entity = ReturnRequest;

    fn stream_id(&self) -> StreamId {
        self.return_id
    }
}

/// Command to cancel an open return.
#[derive(Debug, Clone)]
pub struct CancelReturn {
    /// The return to cancel.
    pub return_id: StreamId,

    /// Why the return is cancelled.
    pub comment: String,

    /// Who cancelled it.
    pub actor: Actor,
}

impl CancelReturn {
    /// Creates a new CancelReturn command.
    pub fn new(return_id: StreamId, comment: impl Into<String>, actor: Actor) -> Self {
        Self {
            return_id,
            comment: comment.into(),
            actor,
        }
    }
}

impl Command for CancelReturn {
    type Entity = ReturnRequest;

    fn stream_id(&self) -> StreamId {
        self.return_id
    }
}

/// Command to schedule a courier pickup for an approved return.
#[derive(Debug, Clone)]
pub struct SchedulePickup {
    /// The return to collect.
    pub return_id: StreamId,

    /// The pickup arrangements.
    pub pickup: PickupDetails,

    /// Who scheduled the pickup.
    pub actor: Actor,
}

impl SchedulePickup {
    /// Creates a new SchedulePickup command.
    pub fn new(return_id: StreamId, pickup: PickupDetails, actor: Actor) -> Self {
        Self {
            return_id,
            pickup,
            actor,
        }
    }
}

impl Command for SchedulePickup {
    type Entity = ReturnRequest;

    fn stream_id(&self) -> StreamId {
        self.return_id
    }
}

/// Command to record the warehouse inspection outcome.
#[derive(Debug, Clone)]
pub struct SubmitQualityCheck {
    /// The return being inspected.
    pub return_id: StreamId,

    /// The inspection outcome.
    pub result: QualityCheckResult,
}

impl SubmitQualityCheck {
    /// Creates a new SubmitQualityCheck command.
    pub fn new(return_id: StreamId, result: QualityCheckResult) -> Self {
        Self { return_id, result }
    }
}

impl Command for SubmitQualityCheck {
    type Entity = ReturnRequest;

    fn stream_id(&self) -> StreamId {
        self.return_id
    }
}

/// Command to initiate a refund for a passed inspection.
#[derive(Debug, Clone)]
pub struct InitiateRefund {
    /// The return being refunded.
    pub return_id: StreamId,

    /// Payout channel.
    pub method: RefundMethod,

    /// Proposed payout amount.
    pub amount: Money,

    /// Amount withheld from the item price.
    pub deductions: Money,

    /// Why anything was withheld.
    pub deduction_reason: Option<String>,
}

impl InitiateRefund {
    /// Creates a new InitiateRefund command.
    pub fn new(
        return_id: StreamId,
        method: RefundMethod,
        amount: Money,
        deductions: Money,
        deduction_reason: Option<String>,
    ) -> Self {
        Self {
            return_id,
            method,
            amount,
            deductions,
            deduction_reason,
        }
    }
}

impl Command for InitiateRefund {
    type Entity = ReturnRequest;

    fn stream_id(&self) -> StreamId {
        self.return_id
    }
}

/// Command to mark the replacement item as dispatched.
#[derive(Debug, Clone)]
pub struct ShipExchange {
    /// The return being resolved by exchange.
    pub return_id: StreamId,

    /// Tracking number of the outbound replacement, if known.
    pub replacement_tracking_number: Option<String>,
}

impl ShipExchange {
    /// Creates a new ShipExchange command.
    pub fn new(return_id: StreamId, replacement_tracking_number: Option<String>) -> Self {
        Self {
            return_id,
            replacement_tracking_number,
        }
    }
}

impl Command for ShipExchange {
    type Entity = ReturnRequest;

    fn stream_id(&self) -> StreamId {
        self.return_id
    }
}
