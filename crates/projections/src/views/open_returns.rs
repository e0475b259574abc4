//! Open returns read model — returns that have not reached a terminal
//! status.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CustomerId, OrderId, OrderItemId, StreamId};
use domain::returns::{RefundStatus, ReturnEvent, ReturnStatus, ReturnType};
use ledger::LedgerEntry;
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition};
use crate::read_model::ReadModel;

/// Summary of an open return.
#[derive(Debug, Clone)]
pub struct ReturnSummary {
    pub return_id: StreamId,
    pub return_code: String,
    pub order_id: OrderId,
    pub order_item_id: OrderItemId,
    pub customer_id: CustomerId,
    pub return_type: ReturnType,
    pub status: ReturnStatus,
    pub refund_status: Option<RefundStatus>,
    pub requested_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

/// Read model view for open (non-terminal) returns.
#[derive(Clone)]
pub struct OpenReturnsView {
    returns: Arc<RwLock<HashMap<StreamId, ReturnSummary>>>,
    position: Arc<RwLock<ProjectionPosition>>,
}

impl OpenReturnsView {
    /// Creates a new empty view.
    pub fn new() -> Self {
        Self {
            returns: Arc::new(RwLock::new(HashMap::new())),
            position: Arc::new(RwLock::new(ProjectionPosition::zero())),
        }
    }

    /// Gets a summary of a specific return.
    pub async fn get_return(&self, return_id: StreamId) -> Option<ReturnSummary> {
        self.returns.read().await.get(&return_id).cloned()
    }

    /// Gets all open returns.
    pub async fn get_all(&self) -> Vec<ReturnSummary> {
        self.returns.read().await.values().cloned().collect()
    }

    /// Gets open returns filtered by status.
    pub async fn get_by_status(&self, status: ReturnStatus) -> Vec<ReturnSummary> {
        self.returns
            .read()
            .await
            .values()
            .filter(|r| r.status == status)
            .cloned()
            .collect()
    }

    /// Gets open returns for a specific customer.
    pub async fn get_by_customer(&self, customer_id: CustomerId) -> Vec<ReturnSummary> {
        self.returns
            .read()
            .await
            .values()
            .filter(|r| r.customer_id == customer_id)
            .cloned()
            .collect()
    }

    /// Gets open returns awaiting a refund outcome.
    pub async fn get_pending_refunds(&self) -> Vec<ReturnSummary> {
        self.returns
            .read()
            .await
            .values()
            .filter(|r| r.status == ReturnStatus::RefundInitiated)
            .cloned()
            .collect()
    }
}

impl Default for OpenReturnsView {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Projection for OpenReturnsView {
    fn name(&self) -> &'static str {
        "OpenReturnsView"
    }

    async fn handle(&self, entry: &LedgerEntry) -> Result<()> {
        if entry.stream_type != "Return" {
            let mut pos = self.position.write().await;
            *pos = pos.advance();
            return Ok(());
        }

        let event: ReturnEvent = serde_json::from_value(entry.payload.clone())?;
        let return_id = entry.stream_id;

        let mut returns = self.returns.write().await;

        match event {
            ReturnEvent::ReturnRequested(data) => {
                returns.insert(
                    return_id,
                    ReturnSummary {
                        return_id,
                        return_code: data.return_code,
                        order_id: data.order_id,
                        order_item_id: data.order_item_id,
                        customer_id: data.customer_id,
                        return_type: data.return_type,
                        status: ReturnStatus::Requested,
                        refund_status: None,
                        requested_at: data.requested_at,
                        last_updated: data.requested_at,
                    },
                );
            }
            ReturnEvent::ReturnStatusChanged(data) => {
                if data.event.status.is_terminal() {
                    returns.remove(&return_id);
                } else if let Some(summary) = returns.get_mut(&return_id) {
                    summary.status = data.event.status;
                    summary.last_updated = data.event.recorded_at;
                }
            }
            ReturnEvent::PickupScheduled(data) => {
                if let Some(summary) = returns.get_mut(&return_id) {
                    summary.status = ReturnStatus::PickupScheduled;
                    summary.last_updated = data.scheduled_at;
                }
            }
            ReturnEvent::QualityCheckRecorded(data) => {
                if data.result.passed {
                    if let Some(summary) = returns.get_mut(&return_id) {
                        summary.status = ReturnStatus::QcPassed;
                        summary.last_updated = data.result.checked_at;
                    }
                } else {
                    // QcFailed is terminal
                    returns.remove(&return_id);
                }
            }
            ReturnEvent::RefundInitiated(data) => {
                if let Some(summary) = returns.get_mut(&return_id) {
                    summary.status = ReturnStatus::RefundInitiated;
                    summary.refund_status = Some(data.refund.status);
                    summary.last_updated = data.refund.initiated_at;
                }
            }
            ReturnEvent::RefundCompleted(data) => {
                if let Some(summary) = returns.get_mut(&return_id) {
                    summary.status = ReturnStatus::RefundCompleted;
                    summary.refund_status = Some(RefundStatus::Completed);
                    summary.last_updated = data.completed_at;
                }
            }
            ReturnEvent::RefundFailed(data) => {
                if let Some(summary) = returns.get_mut(&return_id) {
                    summary.refund_status = Some(RefundStatus::Failed);
                    summary.last_updated = data.failed_at;
                }
            }
            ReturnEvent::ExchangeShipped(data) => {
                if let Some(summary) = returns.get_mut(&return_id) {
                    summary.status = ReturnStatus::ExchangeShipped;
                    summary.last_updated = data.shipped_at;
                }
            }
            ReturnEvent::ReturnCompleted(_) => {
                returns.remove(&return_id);
            }
        }

        let mut pos = self.position.write().await;
        *pos = pos.advance();

        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        *self.position.read().await
    }

    async fn reset(&self) -> Result<()> {
        self.returns.write().await.clear();
        *self.position.write().await = ProjectionPosition::zero();
        Ok(())
    }
}

impl ReadModel for OpenReturnsView {
    fn name(&self) -> &'static str {
        "OpenReturnsView"
    }

    fn count(&self) -> usize {
        self.returns.try_read().map(|r| r.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::DomainEvent;
    use domain::returns::{ReturnReason, ReturnRequestedData};
    use domain::shipment::{Actor, Money};
    use ledger::Revision;

    fn make_entry(stream_id: StreamId, revision: i64, event: &ReturnEvent) -> LedgerEntry {
        LedgerEntry::builder()
            .stream_id(stream_id)
            .stream_type("Return")
            .entry_type(event.event_type())
            .revision(Revision::new(revision))
            .payload(event)
            .unwrap()
            .build()
    }

    fn requested_event(return_id: StreamId, customer_id: CustomerId) -> ReturnEvent {
        ReturnEvent::ReturnRequested(ReturnRequestedData {
            return_id,
            return_code: "RET17000000000001234".to_string(),
            order_id: OrderId::new(),
            order_item_id: OrderItemId::new(),
            customer_id,
            return_type: ReturnType::Return,
            reason: ReturnReason::Damaged,
            description: String::new(),
            item_price: Money::from_cents(450),
            quantity: 1,
            requested_at: Utc::now(),
        })
    }

    #[tokio::test]
    async fn requested_return_appears() {
        let view = OpenReturnsView::new();
        let return_id = StreamId::new();
        let customer_id = CustomerId::new();

        let event = requested_event(return_id, customer_id);
        view.handle(&make_entry(return_id, 1, &event)).await.unwrap();

        let summary = view.get_return(return_id).await.unwrap();
        assert_eq!(summary.status, ReturnStatus::Requested);
        assert_eq!(view.get_by_customer(customer_id).await.len(), 1);
    }

    #[tokio::test]
    async fn cancellation_removes_return() {
        let view = OpenReturnsView::new();
        let return_id = StreamId::new();

        let event = requested_event(return_id, CustomerId::new());
        view.handle(&make_entry(return_id, 1, &event)).await.unwrap();

        let event = ReturnEvent::status_changed(ReturnStatus::Cancelled, "", Actor::Customer);
        view.handle(&make_entry(return_id, 2, &event)).await.unwrap();

        assert!(view.get_return(return_id).await.is_none());
    }

    #[tokio::test]
    async fn refund_sub_state_tracked() {
        let view = OpenReturnsView::new();
        let return_id = StreamId::new();

        let event = requested_event(return_id, CustomerId::new());
        view.handle(&make_entry(return_id, 1, &event)).await.unwrap();

        let refund = domain::returns::RefundDetails {
            method: domain::returns::RefundMethod::OriginalPayment,
            amount: Money::from_cents(450),
            deductions: Money::zero(),
            deduction_reason: None,
            status: RefundStatus::Processing,
            initiated_at: Utc::now(),
            completed_at: None,
            failure_reason: None,
        };
        let event = ReturnEvent::refund_initiated(refund);
        view.handle(&make_entry(return_id, 2, &event)).await.unwrap();

        let summary = view.get_return(return_id).await.unwrap();
        assert_eq!(summary.status, ReturnStatus::RefundInitiated);
        assert_eq!(summary.refund_status, Some(RefundStatus::Processing));
        assert_eq!(view.get_pending_refunds().await.len(), 1);

        let event = ReturnEvent::refund_failed("card expired");
        view.handle(&make_entry(return_id, 3, &event)).await.unwrap();

        let summary = view.get_return(return_id).await.unwrap();
        assert_eq!(summary.status, ReturnStatus::RefundInitiated);
        assert_eq!(summary.refund_status, Some(RefundStatus::Failed));
    }

    #[tokio::test]
    async fn completion_removes_return() {
        let view = OpenReturnsView::new();
        let return_id = StreamId::new();

        let event = requested_event(return_id, CustomerId::new());
        view.handle(&make_entry(return_id, 1, &event)).await.unwrap();

        let event = ReturnEvent::completed("Refund paid out");
        view.handle(&make_entry(return_id, 2, &event)).await.unwrap();

        assert!(view.get_return(return_id).await.is_none());
    }

    #[tokio::test]
    async fn failed_inspection_removes_return() {
        let view = OpenReturnsView::new();
        let return_id = StreamId::new();

        let event = requested_event(return_id, CustomerId::new());
        view.handle(&make_entry(return_id, 1, &event)).await.unwrap();

        let result = domain::returns::QualityCheckResult {
            passed: false,
            inspector: "wh-12".to_string(),
            condition: "Unusable".to_string(),
            notes: String::new(),
            defect_images: Vec::new(),
            eligible_for_restock: false,
            checked_at: Utc::now(),
        };
        let event = ReturnEvent::quality_check_recorded(result);
        view.handle(&make_entry(return_id, 2, &event)).await.unwrap();

        assert!(view.get_return(return_id).await.is_none());
    }
}
