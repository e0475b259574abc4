//! Return domain events.

use chrono::{DateTime, Utc};
use common::{CustomerId, OrderId, OrderItemId, StreamId};
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;
use crate::shipment::{Actor, Money};

use super::{
    PickupDetails, QualityCheckResult, RefundDetails, ReturnReason, ReturnStatus,
    ReturnStatusEvent, ReturnType,
};

/// Events that can occur on a return stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ReturnEvent {
    /// Return was requested by the customer.
    ReturnRequested(ReturnRequestedData),

    /// The return moved along the status graph.
    ReturnStatusChanged(ReturnStatusChangedData),

    /// A courier pickup was scheduled.
    PickupScheduled(PickupScheduledData),

    /// The warehouse inspected the returned item.
    QualityCheckRecorded(QualityCheckRecordedData),

    /// A refund was started.
    RefundInitiated(RefundInitiatedData),

    /// The refund settled.
    RefundCompleted(RefundCompletedData),

    /// The payment provider rejected the refund.
    RefundFailed(RefundFailedData),

    /// The replacement item was dispatched.
    ExchangeShipped(ExchangeShippedData),

    /// The return reached its final resolution.
    ReturnCompleted(ReturnCompletedData),
}

impl DomainEvent for ReturnEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ReturnEvent::ReturnRequested(_) => "ReturnRequested",
            ReturnEvent::ReturnStatusChanged(_) => "ReturnStatusChanged",
            ReturnEvent::PickupScheduled(_) => "PickupScheduled",
            ReturnEvent::QualityCheckRecorded(_) => "QualityCheckRecorded",
            ReturnEvent::RefundInitiated(_) => "RefundInitiated",
            ReturnEvent::RefundCompleted(_) => "RefundCompleted",
            ReturnEvent::RefundFailed(_) => "RefundFailed",
            ReturnEvent::ExchangeShipped(_) => "ExchangeShipped",
            ReturnEvent::ReturnCompleted(_) => "ReturnCompleted",
        }
    }
}

/// Data for ReturnRequested event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnRequestedData {
    /// The stream identity of the return.
    pub return_id: StreamId,

    /// Human-readable return code.
    pub return_code: String,

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

    /// Unit price of the item, used for refund calculation.
    pub item_price: Money,

    /// How many units are being returned.
    pub quantity: u32,

    /// When the return was requested.
    pub requested_at: DateTime<Utc>,
}

/// Data for ReturnStatusChanged event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnStatusChangedData {
    /// The status history entry appended.
    pub event: ReturnStatusEvent,
}

/// Data for PickupScheduled event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickupScheduledData {
    /// The pickup arrangements.
    pub pickup: PickupDetails,

    /// Who scheduled the pickup.
    pub actor: Actor,

    /// When the pickup was scheduled.
    pub scheduled_at: DateTime<Utc>,
}

/// Data for QualityCheckRecorded event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityCheckRecordedData {
    /// The inspection outcome.
    pub result: QualityCheckResult,
}

/// Data for RefundInitiated event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundInitiatedData {
    /// The refund being processed.
    pub refund: RefundDetails,
}

/// Data for RefundCompleted event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundCompletedData {
    /// When the refund settled.
    pub completed_at: DateTime<Utc>,
}

/// Data for RefundFailed event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundFailedData {
    /// Provider failure message.
    pub reason: String,

    /// When the failure was recorded.
    pub failed_at: DateTime<Utc>,
}

/// Data for ExchangeShipped event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeShippedData {
    /// Tracking number of the outbound replacement shipment, if known.
    pub replacement_tracking_number: Option<String>,

    /// When the replacement was dispatched.
    pub shipped_at: DateTime<Utc>,
}

/// Data for ReturnCompleted event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnCompletedData {
    /// Short description of how the return was resolved.
    pub resolution: String,

    /// When the return closed.
    pub completed_at: DateTime<Utc>,
}

// Convenience constructors for events
impl ReturnEvent {
    /// Creates a ReturnStatusChanged event timestamped now.
    pub fn status_changed(
        status: ReturnStatus,
        comment: impl Into<String>,
        actor: Actor,
    ) -> Self {
        ReturnEvent::ReturnStatusChanged(ReturnStatusChangedData {
            event: ReturnStatusEvent::new(status, comment, actor),
        })
    }

    /// Creates a PickupScheduled event.
    pub fn pickup_scheduled(pickup: PickupDetails, actor: Actor) -> Self {
        ReturnEvent::PickupScheduled(PickupScheduledData {
            pickup,
            actor,
            scheduled_at: Utc::now(),
        })
    }

    /// Creates a QualityCheckRecorded event.
    pub fn quality_check_recorded(result: QualityCheckResult) -> Self {
        ReturnEvent::QualityCheckRecorded(QualityCheckRecordedData { result })
    }

    /// Creates a RefundInitiated event.
    pub fn refund_initiated(refund: RefundDetails) -> Self {
        ReturnEvent::RefundInitiated(RefundInitiatedData { refund })
    }

    /// Creates a RefundCompleted event timestamped now.
    pub fn refund_completed() -> Self {
        ReturnEvent::RefundCompleted(RefundCompletedData {
            completed_at: Utc::now(),
        })
    }

    /// Creates a RefundFailed event timestamped now.
    pub fn refund_failed(reason: impl Into<String>) -> Self {
        ReturnEvent::RefundFailed(RefundFailedData {
            reason: reason.into(),
            failed_at: Utc::now(),
        })
    }

    /// Creates an ExchangeShipped event timestamped now.
    pub fn exchange_shipped(replacement_tracking_number: Option<String>) -> Self {
        ReturnEvent::ExchangeShipped(ExchangeShippedData {
            replacement_tracking_number,
            shipped_at: Utc::now(),
        })
    }

    /// Creates a ReturnCompleted event timestamped now.
    pub fn completed(resolution: impl Into<String>) -> Self {
        ReturnEvent::ReturnCompleted(ReturnCompletedData {
            resolution: resolution.into(),
            completed_at: Utc::now(),
        })
    }
}
