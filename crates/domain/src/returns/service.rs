//! Return service providing a simplified API for return operations.

use chrono::Utc;
use common::{CustomerId, StreamId};
use ledger::Ledger;

use crate::codes;
use crate::command::{CommandHandler, CommandResult};
use crate::error::WorkflowError;
use crate::shipment::Actor;

use super::{
    CancelReturn, InitiateRefund, RequestReturn, ReturnRequest, ReturnEvent, SchedulePickup,
    ShipExchange, SubmitQualityCheck, UpdateReturnStatus, events::ReturnRequestedData,
};

impl From<super::ReturnError> for WorkflowError {
    fn from(e: super::ReturnError) -> Self {
        WorkflowError::Return(e)
    }
}

/// How many codes to try before giving up on allocation.
const CODE_ALLOCATION_ATTEMPTS: usize = 5;

/// Service for managing returns.
///
/// Wraps the command handler and enforces the cross-stream invariants the
/// aggregate itself cannot see: return-code uniqueness and the one open
/// return per order item rule.
pub struct ReturnService<L: Ledger> {
    handler: CommandHandler<L, ReturnRequest>,
}

impl<L: Ledger> ReturnService<L> {
    /// Creates a new return service with the given ledger.
    pub fn new(ledger: L) -> Self {
        Self {
            handler: CommandHandler::new(ledger),
        }
    }

    /// Returns a reference to the underlying command handler.
    pub fn handler(&self) -> &CommandHandler<L, ReturnRequest> {
        &self.handler
    }

    /// Requests a return for an order item.
    ///
    /// Rejects a second open return for the same (order, order item) pair
    /// with `ConstraintViolation`.
    #[tracing::instrument(skip(self, cmd), fields(order_id = %cmd.order_id))]
    pub async fn request_return(
        &self,
        cmd: RequestReturn,
    ) -> Result<CommandResult<ReturnRequest>, WorkflowError> {
        let records = self.requested_records().await?;

        for (stream_id, data) in &records {
            if data.order_id != cmd.order_id || data.order_item_id != cmd.order_item_id {
                continue;
            }
            if let Some(existing) = self.handler.load_existing(*stream_id).await?
                && existing.is_open()
            {
                return Err(WorkflowError::ConstraintViolation(format!(
                    "order item {} already has an open return {}",
                    cmd.order_item_id,
                    existing.return_code()
                )));
            }
        }

        let return_code = self.allocate_return_code(&records)?;

        let data = ReturnRequestedData {
            return_id: cmd.return_id,
            return_code,
            order_id: cmd.order_id,
            order_item_id: cmd.order_item_id,
            customer_id: cmd.customer_id,
            return_type: cmd.return_type,
            reason: cmd.reason,
            description: cmd.description,
            item_price: cmd.item_price,
            quantity: cmd.quantity,
            requested_at: Utc::now(),
        };

        self.handler
            .execute(cmd.return_id, |ret| ret.request(data))
            .await
    }

    /// Moves a return along the status graph.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(
        &self,
        cmd: UpdateReturnStatus,
    ) -> Result<CommandResult<ReturnRequest>, WorkflowError> {
        let status = cmd.status;
        let comment = cmd.comment.clone();
        let actor = cmd.actor;

        self.handler
            .execute(cmd.return_id, |ret| ret.update_status(status, comment, actor))
            .await
    }

    /// Cancels an open return.
    #[tracing::instrument(skip(self))]
    pub async fn cancel(
        &self,
        cmd: CancelReturn,
    ) -> Result<CommandResult<ReturnRequest>, WorkflowError> {
        let comment = cmd.comment.clone();
        let actor = cmd.actor;

        self.handler
            .execute(cmd.return_id, |ret| ret.cancel(comment, actor))
            .await
    }

    /// Schedules a courier pickup for an approved return.
    #[tracing::instrument(skip(self))]
    pub async fn schedule_pickup(
        &self,
        cmd: SchedulePickup,
    ) -> Result<CommandResult<ReturnRequest>, WorkflowError> {
        let pickup = cmd.pickup.clone();
        let actor = cmd.actor;

        self.handler
            .execute(cmd.return_id, |ret| ret.schedule_pickup(pickup, actor))
            .await
    }

    /// Records the warehouse inspection outcome.
    #[tracing::instrument(skip(self, cmd), fields(return_id = %cmd.return_id))]
    pub async fn submit_quality_check(
        &self,
        cmd: SubmitQualityCheck,
    ) -> Result<CommandResult<ReturnRequest>, WorkflowError> {
        let result = cmd.result.clone();

        self.handler
            .execute(cmd.return_id, |ret| ret.submit_quality_check(result))
            .await
    }

    /// Initiates a refund for a passed inspection.
    #[tracing::instrument(skip(self))]
    pub async fn initiate_refund(
        &self,
        cmd: InitiateRefund,
    ) -> Result<CommandResult<ReturnRequest>, WorkflowError> {
        let method = cmd.method;
        let amount = cmd.amount;
        let deductions = cmd.deductions;
        let deduction_reason = cmd.deduction_reason.clone();

        self.handler
            .execute(cmd.return_id, |ret| {
                ret.initiate_refund(method, amount, deductions, deduction_reason)
            })
            .await
    }

    /// Marks the refund as settled and closes the return.
    #[tracing::instrument(skip(self))]
    pub async fn complete_refund(
        &self,
        return_id: StreamId,
    ) -> Result<CommandResult<ReturnRequest>, WorkflowError> {
        self.handler
            .execute(return_id, |ret| ret.complete_refund())
            .await
    }

    /// Records a refund failure, leaving the return open for a retry.
    #[tracing::instrument(skip(self))]
    pub async fn fail_refund(
        &self,
        return_id: StreamId,
        reason: String,
    ) -> Result<CommandResult<ReturnRequest>, WorkflowError> {
        self.handler
            .execute(return_id, |ret| ret.fail_refund(reason.clone()))
            .await
    }

    /// Retries a failed refund.
    #[tracing::instrument(skip(self))]
    pub async fn retry_refund(
        &self,
        return_id: StreamId,
    ) -> Result<CommandResult<ReturnRequest>, WorkflowError> {
        self.handler
            .execute(return_id, |ret| ret.retry_refund())
            .await
    }

    /// Marks the replacement item as dispatched.
    #[tracing::instrument(skip(self))]
    pub async fn ship_exchange(
        &self,
        cmd: ShipExchange,
    ) -> Result<CommandResult<ReturnRequest>, WorkflowError> {
        let tracking = cmd.replacement_tracking_number.clone();

        self.handler
            .execute(cmd.return_id, |ret| ret.mark_exchange_shipped(tracking))
            .await
    }

    /// Closes an exchange once the replacement is delivered.
    #[tracing::instrument(skip(self))]
    pub async fn complete_exchange(
        &self,
        return_id: StreamId,
    ) -> Result<CommandResult<ReturnRequest>, WorkflowError> {
        self.handler
            .execute(return_id, |ret| ret.complete_exchange())
            .await
    }

    /// Loads a return by stream ID, returning None if it doesn't exist.
    #[tracing::instrument(skip(self))]
    pub async fn get_return(
        &self,
        return_id: StreamId,
    ) -> Result<Option<ReturnRequest>, WorkflowError> {
        self.handler.load_existing(return_id).await
    }

    /// Resolves a return code to its stream ID.
    pub async fn find_by_code(
        &self,
        return_code: &str,
    ) -> Result<Option<StreamId>, WorkflowError> {
        let records = self.requested_records().await?;
        Ok(records
            .into_iter()
            .find(|(_, d)| d.return_code == return_code)
            .map(|(stream_id, _)| stream_id))
    }

    /// Loads a return by return code.
    #[tracing::instrument(skip(self))]
    pub async fn get_by_code(
        &self,
        return_code: &str,
    ) -> Result<Option<ReturnRequest>, WorkflowError> {
        match self.find_by_code(return_code).await? {
            Some(stream_id) => self.get_return(stream_id).await,
            None => Ok(None),
        }
    }

    /// Loads all open (non-terminal) returns for a customer.
    #[tracing::instrument(skip(self))]
    pub async fn open_returns_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<ReturnRequest>, WorkflowError> {
        let records = self.requested_records().await?;
        let mut returns = Vec::new();

        for (stream_id, data) in records {
            if data.customer_id != customer_id {
                continue;
            }
            if let Some(ret) = self.get_return(stream_id).await?
                && ret.is_open()
            {
                returns.push(ret);
            }
        }

        Ok(returns)
    }

    async fn requested_records(
        &self,
    ) -> Result<Vec<(StreamId, ReturnRequestedData)>, WorkflowError> {
        let entries = self
            .handler
            .ledger()
            .entries_by_type("ReturnRequested")
            .await?;

        let mut records = Vec::with_capacity(entries.len());
        for entry in entries {
            if let ReturnEvent::ReturnRequested(data) = serde_json::from_value(entry.payload)? {
                records.push((entry.stream_id, data));
            }
        }
        Ok(records)
    }

    fn allocate_return_code(
        &self,
        records: &[(StreamId, ReturnRequestedData)],
    ) -> Result<String, WorkflowError> {
        for _ in 0..CODE_ALLOCATION_ATTEMPTS {
            let candidate = codes::return_code();
            if !records.iter().any(|(_, d)| d.return_code == candidate) {
                return Ok(candidate);
            }
        }
        Err(WorkflowError::ConstraintViolation(
            "could not allocate a unique return code".to_string(),
        ))
    }
}
