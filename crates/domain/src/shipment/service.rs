//! Shipment service providing a simplified API for shipment operations.

use chrono::Utc;
use common::{CustomerId, OrderId, StreamId};
use ledger::Ledger;

use crate::codes;
use crate::command::{CommandHandler, CommandResult};
use crate::error::WorkflowError;

use super::{
    AssignCourier, CreateReturnShipment, CreateShipment, Shipment, ShipmentEvent,
    UpdateShipmentStatus, events::ShipmentCreatedData,
};

impl From<super::ShipmentError> for WorkflowError {
    fn from(e: super::ShipmentError) -> Self {
        WorkflowError::Shipment(e)
    }
}

/// How many codes to try before giving up on allocation.
const CODE_ALLOCATION_ATTEMPTS: usize = 5;

/// Service for managing shipments.
///
/// Wraps the command handler and enforces the cross-stream invariants the
/// aggregate itself cannot see: tracking-number uniqueness and the 1:1
/// order-to-shipment rule.
pub struct ShipmentService<L: Ledger> {
    handler: CommandHandler<L, Shipment>,
}

impl<L: Ledger> ShipmentService<L> {
    /// Creates a new shipment service with the given ledger.
    pub fn new(ledger: L) -> Self {
        Self {
            handler: CommandHandler::new(ledger),
        }
    }

    /// Returns a reference to the underlying command handler.
    pub fn handler(&self) -> &CommandHandler<L, Shipment> {
        &self.handler
    }

    /// Creates a new shipment for an order.
    ///
    /// Rejects a second forward shipment for the same order with
    /// `ConstraintViolation`.
    #[tracing::instrument(skip(self, cmd), fields(order_id = %cmd.order_id))]
    pub async fn create_shipment(
        &self,
        cmd: CreateShipment,
    ) -> Result<CommandResult<Shipment>, WorkflowError> {
        let records = self.created_records().await?;

        if records
            .iter()
            .any(|(_, d)| d.order_id == cmd.order_id && !d.is_return_shipment)
        {
            return Err(WorkflowError::ConstraintViolation(format!(
                "order {} already has a shipment",
                cmd.order_id
            )));
        }

        let tracking_number = self.allocate_tracking_number(&records)?;

        let data = ShipmentCreatedData {
            shipment_id: cmd.shipment_id,
            tracking_number,
            order_id: cmd.order_id,
            customer_id: cmd.customer_id,
            vendor_id: cmd.vendor_id,
            pickup_address: cmd.pickup_address,
            delivery_address: cmd.delivery_address,
            package: cmd.package,
            delivery_mode: cmd.delivery_mode,
            shipping_cost: cmd.shipping_cost,
            estimated_delivery: cmd.estimated_delivery,
            is_return_shipment: false,
            original_shipment_id: None,
            return_reason: None,
            created_at: Utc::now(),
        };

        self.handler
            .execute(cmd.shipment_id, |shipment| shipment.create(data))
            .await
    }

    /// Applies a status transition to a shipment.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(
        &self,
        cmd: UpdateShipmentStatus,
    ) -> Result<CommandResult<Shipment>, WorkflowError> {
        let status = cmd.status;
        let location = cmd.location.clone();
        let description = cmd.description.clone();
        let actor = cmd.actor;

        self.handler
            .execute(cmd.shipment_id, |shipment| {
                shipment.update_status(status, location, description, actor)
            })
            .await
    }

    /// Assigns a courier to an active shipment.
    #[tracing::instrument(skip(self))]
    pub async fn assign_courier(
        &self,
        cmd: AssignCourier,
    ) -> Result<CommandResult<Shipment>, WorkflowError> {
        let courier = cmd.courier.clone();

        self.handler
            .execute(cmd.shipment_id, |shipment| {
                shipment.assign_courier(courier)
            })
            .await
    }

    /// Creates a return shipment reversing an existing shipment.
    ///
    /// The original may already be terminal; the return shipment is a new
    /// stream, not a mutation of the original. Pickup and delivery
    /// addresses are swapped.
    #[tracing::instrument(skip(self))]
    pub async fn create_return_shipment(
        &self,
        cmd: CreateReturnShipment,
    ) -> Result<CommandResult<Shipment>, WorkflowError> {
        let original = self
            .handler
            .load_existing(cmd.original_shipment_id)
            .await?
            .ok_or_else(|| WorkflowError::NotFound {
                entity: "Shipment",
                reference: cmd.original_shipment_id.to_string(),
            })?;

        let pickup = original
            .delivery_address()
            .cloned()
            .ok_or_else(|| WorkflowError::NotFound {
                entity: "Shipment",
                reference: cmd.original_shipment_id.to_string(),
            })?;
        let delivery = original
            .pickup_address()
            .cloned()
            .ok_or_else(|| WorkflowError::NotFound {
                entity: "Shipment",
                reference: cmd.original_shipment_id.to_string(),
            })?;

        let records = self.created_records().await?;
        let tracking_number = self.allocate_tracking_number(&records)?;

        let return_id = StreamId::new();
        let data = ShipmentCreatedData {
            shipment_id: return_id,
            tracking_number,
            order_id: original.order_id().unwrap_or_default(),
            customer_id: original.customer_id().unwrap_or_default(),
            vendor_id: original.vendor_id(),
            pickup_address: pickup,
            delivery_address: delivery,
            package: original.package(),
            delivery_mode: original.delivery_mode(),
            shipping_cost: original.shipping_cost(),
            estimated_delivery: None,
            is_return_shipment: true,
            original_shipment_id: Some(cmd.original_shipment_id),
            return_reason: Some(cmd.reason),
            created_at: Utc::now(),
        };

        self.handler
            .execute(return_id, |shipment| shipment.create(data))
            .await
    }

    /// Loads a shipment by stream ID, returning None if it doesn't exist.
    #[tracing::instrument(skip(self))]
    pub async fn get_shipment(
        &self,
        shipment_id: StreamId,
    ) -> Result<Option<Shipment>, WorkflowError> {
        self.handler.load_existing(shipment_id).await
    }

    /// Resolves a tracking number to its stream ID.
    pub async fn find_by_tracking_number(
        &self,
        tracking_number: &str,
    ) -> Result<Option<StreamId>, WorkflowError> {
        let records = self.created_records().await?;
        Ok(records
            .into_iter()
            .find(|(_, d)| d.tracking_number == tracking_number)
            .map(|(stream_id, _)| stream_id))
    }

    /// Loads a shipment by tracking number.
    #[tracing::instrument(skip(self))]
    pub async fn get_by_tracking_number(
        &self,
        tracking_number: &str,
    ) -> Result<Option<Shipment>, WorkflowError> {
        match self.find_by_tracking_number(tracking_number).await? {
            Some(stream_id) => self.get_shipment(stream_id).await,
            None => Ok(None),
        }
    }

    /// Finds the forward shipment for an order.
    pub async fn find_by_order(
        &self,
        order_id: OrderId,
    ) -> Result<Option<StreamId>, WorkflowError> {
        let records = self.created_records().await?;
        Ok(records
            .into_iter()
            .find(|(_, d)| d.order_id == order_id && !d.is_return_shipment)
            .map(|(stream_id, _)| stream_id))
    }

    /// Loads all active (non-terminal) shipments for a customer.
    #[tracing::instrument(skip(self))]
    pub async fn active_shipments_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Shipment>, WorkflowError> {
        let records = self.created_records().await?;
        let mut shipments = Vec::new();

        for (stream_id, data) in records {
            if data.customer_id != customer_id {
                continue;
            }
            if let Some(shipment) = self.get_shipment(stream_id).await?
                && shipment.is_active()
            {
                shipments.push(shipment);
            }
        }

        Ok(shipments)
    }

    async fn created_records(&self) -> Result<Vec<(StreamId, ShipmentCreatedData)>, WorkflowError> {
        let entries = self
            .handler
            .ledger()
            .entries_by_type("ShipmentCreated")
            .await?;

        let mut records = Vec::with_capacity(entries.len());
        for entry in entries {
            if let ShipmentEvent::ShipmentCreated(data) = serde_json::from_value(entry.payload)? {
                records.push((entry.stream_id, data));
            }
        }
        Ok(records)
    }

    fn allocate_tracking_number(
        &self,
        records: &[(StreamId, ShipmentCreatedData)],
    ) -> Result<String, WorkflowError> {
        for _ in 0..CODE_ALLOCATION_ATTEMPTS {
            let candidate = codes::tracking_number();
            if !records.iter().any(|(_, d)| d.tracking_number == candidate) {
                return Ok(candidate);
            }
        }
        Err(WorkflowError::ConstraintViolation(
            "could not allocate a unique tracking number".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::EventSourced;
    use crate::shipment::{
        Actor, Address, DeliveryMode, Money, PackageDetails, ShipmentStatus,
    };
    use ledger::InMemoryLedger;

    fn create_cmd(order_id: OrderId, customer_id: CustomerId) -> CreateShipment {
        CreateShipment::new(
            order_id,
            customer_id,
            None,
            Address::new("1 Vendor Way", "Springfield", "IL", "62701", "US"),
            Address::new("9 Customer Rd", "Shelbyville", "IL", "62565", "US"),
            PackageDetails {
                weight_grams: 500,
                length_cm: 20,
                width_cm: 15,
                height_cm: 10,
            },
            DeliveryMode::Standard,
            Money::from_cents(799),
            None,
        )
    }

    #[tokio::test]
    async fn create_shipment_allocates_tracking_number() {
        let service = ShipmentService::new(InMemoryLedger::new());

        let result = service
            .create_shipment(create_cmd(OrderId::new(), CustomerId::new()))
            .await
            .unwrap();

        assert!(result.entity.tracking_number().starts_with("SHP"));
        assert_eq!(result.entity.status(), ShipmentStatus::OrderPlaced);
    }

    #[tokio::test]
    async fn second_shipment_for_order_rejected() {
        let service = ShipmentService::new(InMemoryLedger::new());
        let order_id = OrderId::new();

        service
            .create_shipment(create_cmd(order_id, CustomerId::new()))
            .await
            .unwrap();

        let result = service
            .create_shipment(create_cmd(order_id, CustomerId::new()))
            .await;

        assert!(matches!(
            result,
            Err(WorkflowError::ConstraintViolation(_))
        ));
    }

    #[tokio::test]
    async fn update_status_by_stream_id() {
        let service = ShipmentService::new(InMemoryLedger::new());

        let created = service
            .create_shipment(create_cmd(OrderId::new(), CustomerId::new()))
            .await
            .unwrap();
        let shipment_id = created.entity.id().unwrap();

        let result = service
            .update_status(UpdateShipmentStatus::new(
                shipment_id,
                ShipmentStatus::InTransit,
                "Hub 7",
                "Departed facility",
                Actor::Courier,
            ))
            .await
            .unwrap();

        assert_eq!(result.entity.status(), ShipmentStatus::InTransit);
        assert_eq!(result.entity.history().len(), 2);
    }

    #[tokio::test]
    async fn lookup_by_tracking_number() {
        let service = ShipmentService::new(InMemoryLedger::new());

        let created = service
            .create_shipment(create_cmd(OrderId::new(), CustomerId::new()))
            .await
            .unwrap();
        let tracking = created.entity.tracking_number().to_string();

        let found = service.get_by_tracking_number(&tracking).await.unwrap();
        assert!(found.is_some());
        assert_eq!(found.unwrap().id(), created.entity.id());

        let missing = service.get_by_tracking_number("SHP000000000000").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn return_shipment_reverses_addresses() {
        let service = ShipmentService::new(InMemoryLedger::new());

        let created = service
            .create_shipment(create_cmd(OrderId::new(), CustomerId::new()))
            .await
            .unwrap();
        let original_id = created.entity.id().unwrap();

        // Deliver the original first; returns from terminal shipments are allowed
        service
            .update_status(UpdateShipmentStatus::new(
                original_id,
                ShipmentStatus::Delivered,
                "Front door",
                "Delivered",
                Actor::Courier,
            ))
            .await
            .unwrap();

        let returned = service
            .create_return_shipment(CreateReturnShipment::new(original_id, "Damaged on arrival"))
            .await
            .unwrap();

        let shipment = &returned.entity;
        assert!(shipment.is_return_shipment());
        assert_eq!(shipment.original_shipment_id(), Some(original_id));
        assert_eq!(shipment.return_reason(), Some("Damaged on arrival"));
        assert_eq!(
            shipment.pickup_address().unwrap(),
            created.entity.delivery_address().unwrap()
        );
        assert_eq!(
            shipment.delivery_address().unwrap(),
            created.entity.pickup_address().unwrap()
        );
        assert_eq!(shipment.status(), ShipmentStatus::OrderPlaced);
    }

    #[tokio::test]
    async fn return_shipment_for_unknown_original_fails() {
        let service = ShipmentService::new(InMemoryLedger::new());

        let result = service
            .create_return_shipment(CreateReturnShipment::new(StreamId::new(), "whoops"))
            .await;

        assert!(matches!(result, Err(WorkflowError::NotFound { .. })));
    }

    #[tokio::test]
    async fn active_shipments_for_customer_excludes_terminal() {
        let service = ShipmentService::new(InMemoryLedger::new());
        let customer_id = CustomerId::new();

        let first = service
            .create_shipment(create_cmd(OrderId::new(), customer_id))
            .await
            .unwrap();
        service
            .create_shipment(create_cmd(OrderId::new(), customer_id))
            .await
            .unwrap();
        // Another customer's shipment should not appear
        service
            .create_shipment(create_cmd(OrderId::new(), CustomerId::new()))
            .await
            .unwrap();

        let active = service
            .active_shipments_for_customer(customer_id)
            .await
            .unwrap();
        assert_eq!(active.len(), 2);

        // Deliver one; it must drop out
        service
            .update_status(UpdateShipmentStatus::new(
                first.entity.id().unwrap(),
                ShipmentStatus::Delivered,
                "",
                "Delivered",
                Actor::Courier,
            ))
            .await
            .unwrap();

        let active = service
            .active_shipments_for_customer(customer_id)
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
    }
}
