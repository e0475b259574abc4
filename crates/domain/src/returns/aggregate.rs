//! Return aggregate implementation.

use chrono::{DateTime, Utc};
use common::{CustomerId, OrderId, OrderItemId, StreamId};
use ledger::Revision;
use serde::{Deserialize, Serialize};

use crate::aggregate::{EventSourced, SnapshotCapable};
use crate::shipment::{Actor, Money};

use super::{
    PickupDetails, QualityCheckResult, RefundDetails, RefundMethod, RefundStatus, ReturnError,
    ReturnEvent, ReturnReason, ReturnStatus, ReturnStatusEvent, ReturnType,
    events::{
        ExchangeShippedData, PickupScheduledData, QualityCheckRecordedData, RefundCompletedData,
        RefundFailedData, RefundInitiatedData, ReturnCompletedData, ReturnRequestedData,
        ReturnStatusChangedData,
    },
};

/// Return request aggregate root.
///
/// Status moves along a fixed graph; quality-check and resolution statuses
/// are entered only through their dedicated commands. The refund, when
/// present, is a sub-state of the return: its processing status advances
/// independently while the parent sits at RefundInitiated, and only a
/// settled refund closes the return.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReturnRequest {
    /// Stream identity.
    id: Option<StreamId>,

    /// Current revision for optimistic concurrency.
    #[serde(default)]
    revision: Revision,

    /// Human-readable return code.
    return_code: String,

    /// The order the item belongs to.
    order_id: Option<OrderId>,

    /// The specific order line being returned.
    order_item_id: Option<OrderItemId>,

    /// The customer raising the return.
    customer_id: Option<CustomerId>,

    return_type: ReturnType,
    reason: Option<ReturnReason>,
    description: String,

    /// Unit price of the returned item.
    item_price: Money,

    /// How many units are coming back.
    quantity: u32,

    /// Current status; always equals the last history element's status.
    status: ReturnStatus,

    /// Append-only status history.
    history: Vec<ReturnStatusEvent>,

    pickup: Option<PickupDetails>,
    quality_check: Option<QualityCheckResult>,
    refund: Option<RefundDetails>,
    replacement_tracking_number: Option<String>,

    requested_at: Option<DateTime<Utc>>,
    last_updated: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,

    /// How the return was resolved, once completed.
    resolution: Option<String>,
}

impl EventSourced for ReturnRequest {
    type Event = ReturnEvent;
    type Error = ReturnError;

    fn stream_type() -> &'static str {
        "Return"
    }

    fn id(&self) -> Option<StreamId> {
        self.id
    }

    fn revision(&self) -> Revision {
        self.revision
    }

    fn set_revision(&mut self, revision: Revision) {
        self.revision = revision;
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            ReturnEvent::ReturnRequested(data) => self.apply_requested(data),
            ReturnEvent::ReturnStatusChanged(data) => self.apply_status_changed(data),
            ReturnEvent::PickupScheduled(data) => self.apply_pickup_scheduled(data),
            ReturnEvent::QualityCheckRecorded(data) => self.apply_quality_check(data),
            ReturnEvent::RefundInitiated(data) => self.apply_refund_initiated(data),
            ReturnEvent::RefundCompleted(data) => self.apply_refund_completed(data),
            ReturnEvent::RefundFailed(data) => self.apply_refund_failed(data),
            ReturnEvent::ExchangeShipped(data) => self.apply_exchange_shipped(data),
            ReturnEvent::ReturnCompleted(data) => self.apply_completed(data),
        }
    }
}

impl SnapshotCapable for ReturnRequest {
    fn snapshot_interval() -> usize {
        50
    }
}

// Query methods
impl ReturnRequest {
    pub fn return_code(&self) -> &str {
        &self.return_code
    }

    pub fn order_id(&self) -> Option<OrderId> {
        self.order_id
    }

    pub fn order_item_id(&self) -> Option<OrderItemId> {
        self.order_item_id
    }

    pub fn customer_id(&self) -> Option<CustomerId> {
        self.customer_id
    }

    pub fn return_type(&self) -> ReturnType {
        self.return_type
    }

    pub fn reason(&self) -> Option<ReturnReason> {
        self.reason
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn item_price(&self) -> Money {
        self.item_price
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn status(&self) -> ReturnStatus {
        self.status
    }

    /// Returns the full status history, oldest first.
    pub fn history(&self) -> &[ReturnStatusEvent] {
        &self.history
    }

    pub fn pickup(&self) -> Option<&PickupDetails> {
        self.pickup.as_ref()
    }

    pub fn quality_check(&self) -> Option<&QualityCheckResult> {
        self.quality_check.as_ref()
    }

    pub fn refund(&self) -> Option<&RefundDetails> {
        self.refund.as_ref()
    }

    pub fn replacement_tracking_number(&self) -> Option<&str> {
        self.replacement_tracking_number.as_deref()
    }

    pub fn requested_at(&self) -> Option<DateTime<Utc>> {
        self.requested_at
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn resolution(&self) -> Option<&str> {
        self.resolution.as_deref()
    }

    /// Returns true if the return is in a terminal status.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Returns true if the return is still open.
    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }

    /// Total value of the returned items before deductions.
    pub fn refund_base_amount(&self) -> Money {
        self.item_price.multiply(self.quantity)
    }
}

// Command methods (return events)
impl ReturnRequest {
    /// Requests the return.
    pub fn request(&self, data: ReturnRequestedData) -> Result<Vec<ReturnEvent>, ReturnError> {
        if self.id.is_some() {
            return Err(ReturnError::AlreadyCreated);
        }

        Ok(vec![ReturnEvent::ReturnRequested(data)])
    }

    /// Moves the return along the status graph.
    ///
    /// Only transitions the current status explicitly allows are accepted;
    /// quality-check and resolution statuses are rejected here regardless.
    pub fn update_status(
        &self,
        status: ReturnStatus,
        comment: impl Into<String>,
        actor: Actor,
    ) -> Result<Vec<ReturnEvent>, ReturnError> {
        if self.id.is_none() {
            return Err(ReturnError::NotCreated);
        }

        if !self.status.can_transition_to(status) {
            return Err(ReturnError::InvalidTransition {
                from: self.status,
                to: status,
            });
        }

        Ok(vec![ReturnEvent::status_changed(status, comment, actor)])
    }

    /// Cancels the return. Allowed until the item reaches the warehouse.
    pub fn cancel(
        &self,
        comment: impl Into<String>,
        actor: Actor,
    ) -> Result<Vec<ReturnEvent>, ReturnError> {
        if self.id.is_none() {
            return Err(ReturnError::NotCreated);
        }

        if !self.status.can_cancel() {
            return Err(ReturnError::InvalidStateTransition {
                current_status: self.status,
                action: "cancel",
            });
        }

        Ok(vec![ReturnEvent::status_changed(
            ReturnStatus::Cancelled,
            comment,
            actor,
        )])
    }

    /// Schedules a courier pickup for an approved return.
    pub fn schedule_pickup(
        &self,
        pickup: PickupDetails,
        actor: Actor,
    ) -> Result<Vec<ReturnEvent>, ReturnError> {
        if self.id.is_none() {
            return Err(ReturnError::NotCreated);
        }

        if self.status != ReturnStatus::Approved {
            return Err(ReturnError::InvalidStateTransition {
                current_status: self.status,
                action: "schedule pickup",
            });
        }

        Ok(vec![ReturnEvent::pickup_scheduled(pickup, actor)])
    }

    /// Records the quality inspection outcome.
    ///
    /// The sole path to QcPassed and QcFailed; only valid while the item
    /// is in QualityCheck.
    pub fn submit_quality_check(
        &self,
        result: QualityCheckResult,
    ) -> Result<Vec<ReturnEvent>, ReturnError> {
        if self.id.is_none() {
            return Err(ReturnError::NotCreated);
        }

        if self.status != ReturnStatus::QualityCheck {
            return Err(ReturnError::InvalidStateTransition {
                current_status: self.status,
                action: "submit quality check",
            });
        }

        Ok(vec![ReturnEvent::quality_check_recorded(result)])
    }

    /// Initiates a refund for a passed inspection.
    ///
    /// The proposed amount must equal item price times quantity minus
    /// deductions, in exact cents. Positive deductions require a reason.
    pub fn initiate_refund(
        &self,
        method: RefundMethod,
        amount: Money,
        deductions: Money,
        deduction_reason: Option<String>,
    ) -> Result<Vec<ReturnEvent>, ReturnError> {
        if self.id.is_none() {
            return Err(ReturnError::NotCreated);
        }

        if self.status != ReturnStatus::QcPassed {
            return Err(ReturnError::InvalidStateTransition {
                current_status: self.status,
                action: "initiate refund",
            });
        }

        if !self.return_type.is_refundable() {
            return Err(ReturnError::UnsupportedResolution {
                return_type: self.return_type,
                action: "initiate refund",
            });
        }

        if deductions.is_positive() && deduction_reason.is_none() {
            return Err(ReturnError::DeductionReasonRequired);
        }

        let expected = self.refund_base_amount() - deductions;
        if amount != expected {
            return Err(ReturnError::RefundAmountMismatch {
                expected,
                actual: amount,
            });
        }

        let refund = RefundDetails {
            method,
            amount,
            deductions,
            deduction_reason,
            status: RefundStatus::Processing,
            initiated_at: Utc::now(),
            completed_at: None,
            failure_reason: None,
        };

        Ok(vec![ReturnEvent::refund_initiated(refund)])
    }

    /// Marks the refund as settled and closes the return.
    pub fn complete_refund(&self) -> Result<Vec<ReturnEvent>, ReturnError> {
        if self.id.is_none() {
            return Err(ReturnError::NotCreated);
        }

        if self.status != ReturnStatus::RefundInitiated {
            return Err(ReturnError::InvalidStateTransition {
                current_status: self.status,
                action: "complete refund",
            });
        }

        // A failed payout must go back through retry before settling.
        match &self.refund {
            Some(refund) if refund.status == RefundStatus::Processing => {}
            Some(refund) => {
                return Err(ReturnError::RefundNotInProgress {
                    refund_status: refund.status,
                });
            }
            None => {
                return Err(ReturnError::InvalidStateTransition {
                    current_status: self.status,
                    action: "complete refund",
                });
            }
        }

        Ok(vec![
            ReturnEvent::refund_completed(),
            ReturnEvent::completed("Refund paid out"),
        ])
    }

    /// Records a refund failure.
    ///
    /// The parent return stays at RefundInitiated so the refund can be
    /// retried; only the refund sub-state moves to Failed.
    pub fn fail_refund(
        &self,
        reason: impl Into<String>,
    ) -> Result<Vec<ReturnEvent>, ReturnError> {
        if self.id.is_none() {
            return Err(ReturnError::NotCreated);
        }

        if self.status != ReturnStatus::RefundInitiated {
            return Err(ReturnError::InvalidStateTransition {
                current_status: self.status,
                action: "fail refund",
            });
        }

        Ok(vec![ReturnEvent::refund_failed(reason)])
    }

    /// Retries a failed refund by resetting the sub-state to processing.
    pub fn retry_refund(&self) -> Result<Vec<ReturnEvent>, ReturnError> {
        if self.id.is_none() {
            return Err(ReturnError::NotCreated);
        }

        let Some(refund) = &self.refund else {
            return Err(ReturnError::InvalidStateTransition {
                current_status: self.status,
                action: "retry refund",
            });
        };

        if self.status != ReturnStatus::RefundInitiated || refund.status != RefundStatus::Failed {
            return Err(ReturnError::InvalidStateTransition {
                current_status: self.status,
                action: "retry refund",
            });
        }

        let mut retried = refund.clone();
        retried.status = RefundStatus::Processing;
        retried.initiated_at = Utc::now();
        retried.failure_reason = None;

        Ok(vec![ReturnEvent::refund_initiated(retried)])
    }

    /// Marks the replacement item as dispatched.
    pub fn mark_exchange_shipped(
        &self,
        replacement_tracking_number: Option<String>,
    ) -> Result<Vec<ReturnEvent>, ReturnError> {
        if self.id.is_none() {
            return Err(ReturnError::NotCreated);
        }

        if self.status != ReturnStatus::QcPassed {
            return Err(ReturnError::InvalidStateTransition {
                current_status: self.status,
                action: "ship exchange",
            });
        }

        if !self.return_type.ships_replacement() {
            return Err(ReturnError::UnsupportedResolution {
                return_type: self.return_type,
                action: "ship exchange",
            });
        }

        Ok(vec![ReturnEvent::exchange_shipped(
            replacement_tracking_number,
        )])
    }

    /// Closes an exchange once the replacement is delivered.
    pub fn complete_exchange(&self) -> Result<Vec<ReturnEvent>, ReturnError> {
        if self.id.is_none() {
            return Err(ReturnError::NotCreated);
        }

        if self.status != ReturnStatus::ExchangeShipped {
            return Err(ReturnError::InvalidStateTransition {
                current_status: self.status,
                action: "complete exchange",
            });
        }

        Ok(vec![ReturnEvent::completed("Replacement delivered")])
    }
}

// Apply event helpers
impl ReturnRequest {
    fn apply_requested(&mut self, data: ReturnRequestedData) {
        self.id = Some(data.return_id);
        self.return_code = data.return_code;
        self.order_id = Some(data.order_id);
        self.order_item_id = Some(data.order_item_id);
        self.customer_id = Some(data.customer_id);
        self.return_type = data.return_type;
        self.reason = Some(data.reason);
        self.description = data.description;
        self.item_price = data.item_price;
        self.quantity = data.quantity;
        self.requested_at = Some(data.requested_at);

        // Seed the history so current status always has a backing event.
        let initial = ReturnStatusEvent {
            status: ReturnStatus::Requested,
            comment: "Return requested".to_string(),
            actor: Actor::Customer,
            recorded_at: data.requested_at,
        };
        self.status = initial.status;
        self.last_updated = Some(initial.recorded_at);
        self.history.push(initial);
    }

    fn apply_status_changed(&mut self, data: ReturnStatusChangedData) {
        let event = data.event;
        self.status = event.status;
        self.last_updated = Some(event.recorded_at);
        self.history.push(event);
    }

    fn apply_pickup_scheduled(&mut self, data: PickupScheduledData) {
        let entry = ReturnStatusEvent {
            status: ReturnStatus::PickupScheduled,
            comment: format!("Pickup scheduled with {}", data.pickup.courier_name),
            actor: data.actor,
            recorded_at: data.scheduled_at,
        };
        self.pickup = Some(data.pickup);
        self.status = entry.status;
        self.last_updated = Some(entry.recorded_at);
        self.history.push(entry);
    }

    fn apply_quality_check(&mut self, data: QualityCheckRecordedData) {
        let result = data.result;
        let status = if result.passed {
            ReturnStatus::QcPassed
        } else {
            ReturnStatus::QcFailed
        };

        let entry = ReturnStatusEvent {
            status,
            comment: format!("Inspected by {}: {}", result.inspector, result.condition),
            actor: Actor::Admin,
            recorded_at: result.checked_at,
        };
        self.quality_check = Some(result);
        self.status = entry.status;
        self.last_updated = Some(entry.recorded_at);
        self.history.push(entry);
    }

    fn apply_refund_initiated(&mut self, data: RefundInitiatedData) {
        let entry = ReturnStatusEvent {
            status: ReturnStatus::RefundInitiated,
            comment: format!("Refund of {} initiated", data.refund.amount),
            actor: Actor::System,
            recorded_at: data.refund.initiated_at,
        };
        self.refund = Some(data.refund);

        // A retry re-enters the same status; record history only once.
        if self.status != ReturnStatus::RefundInitiated {
            self.status = entry.status;
            self.history.push(entry.clone());
        }
        self.last_updated = Some(entry.recorded_at);
    }

    fn apply_refund_completed(&mut self, data: RefundCompletedData) {
        if let Some(refund) = &mut self.refund {
            refund.status = RefundStatus::Completed;
            refund.completed_at = Some(data.completed_at);
        }

        let entry = ReturnStatusEvent {
            status: ReturnStatus::RefundCompleted,
            comment: "Refund settled".to_string(),
            actor: Actor::System,
            recorded_at: data.completed_at,
        };
        self.status = entry.status;
        self.last_updated = Some(entry.recorded_at);
        self.history.push(entry);
    }

    fn apply_refund_failed(&mut self, data: RefundFailedData) {
        // The parent status is untouched; only the sub-state records the
        // failure so the refund can be retried.
        if let Some(refund) = &mut self.refund {
            refund.status = RefundStatus::Failed;
            refund.failure_reason = Some(data.reason);
        }
        self.last_updated = Some(data.failed_at);
    }

    fn apply_exchange_shipped(&mut self, data: ExchangeShippedData) {
        self.replacement_tracking_number = data.replacement_tracking_number;

        let entry = ReturnStatusEvent {
            status: ReturnStatus::ExchangeShipped,
            comment: "Replacement dispatched".to_string(),
            actor: Actor::System,
            recorded_at: data.shipped_at,
        };
        self.status = entry.status;
        self.last_updated = Some(entry.recorded_at);
        self.history.push(entry);
    }

    fn apply_completed(&mut self, data: ReturnCompletedData) {
        self.resolution = Some(data.resolution.clone());
        self.completed_at = Some(data.completed_at);

        let entry = ReturnStatusEvent {
            status: ReturnStatus::Completed,
            comment: data.resolution,
            actor: Actor::System,
            recorded_at: data.completed_at,
        };
        self.status = entry.status;
        self.last_updated = Some(entry.recorded_at);
        self.history.push(entry);
    }
}
