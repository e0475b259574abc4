//! Shipment endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{CustomerId, OrderId, VendorId};
use domain::shipment::{
    Actor, Address, AssignCourier, CourierInfo, CreateReturnShipment, CreateShipment,
    DeliveryMode, Money, PackageDetails, Shipment, ShipmentStatus, UpdateShipmentStatus,
};
use ledger::Ledger;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

use super::{AppState, parse_uuid};

// -- Request types --

#[derive(Deserialize)]
pub struct CreateShipmentRequest {
    pub order_id: String,
    pub customer_id: Option<String>,
    pub vendor_id: Option<String>,
    pub pickup_address: Address,
    pub delivery_address: Address,
    #[serde(default)]
    pub package: PackageDetails,
    #[serde(default)]
    pub delivery_mode: DeliveryMode,
    pub shipping_cost_cents: i64,
    pub estimated_delivery: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: ShipmentStatus,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub actor: Actor,
}

#[derive(Deserialize)]
pub struct AssignCourierRequest {
    pub name: String,
    pub phone: Option<String>,
    pub service: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateReturnShipmentRequest {
    pub reason: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct TrackingEventResponse {
    pub status: String,
    pub location: String,
    pub description: String,
    pub actor: String,
    pub recorded_at: String,
}

#[derive(Serialize)]
pub struct ShipmentResponse {
    pub id: String,
    pub tracking_number: String,
    pub order_id: String,
    pub customer_id: String,
    pub status: String,
    pub status_description: String,
    pub courier: Option<CourierInfo>,
    pub pickup_address: Option<Address>,
    pub delivery_address: Option<Address>,
    pub delivery_mode: DeliveryMode,
    pub shipping_cost_cents: i64,
    pub estimated_delivery: Option<String>,
    pub dispatched_at: Option<String>,
    pub delivered_at: Option<String>,
    pub is_return_shipment: bool,
    pub original_shipment_id: Option<String>,
    pub return_reason: Option<String>,
    pub history: Vec<TrackingEventResponse>,
}

#[derive(Serialize)]
pub struct ShipmentSummaryResponse {
    pub shipment_id: String,
    pub tracking_number: String,
    pub order_id: String,
    pub status: String,
    pub estimated_delivery: Option<String>,
    pub is_return_shipment: bool,
    pub last_updated: String,
}

impl ShipmentResponse {
    fn from_shipment(shipment: &Shipment) -> Self {
        use domain::EventSourced;

        Self {
            id: shipment.id().map(|id| id.to_string()).unwrap_or_default(),
            tracking_number: shipment.tracking_number().to_string(),
            order_id: shipment
                .order_id()
                .map(|id| id.to_string())
                .unwrap_or_default(),
            customer_id: shipment
                .customer_id()
                .map(|id| id.to_string())
                .unwrap_or_default(),
            status: shipment.status().to_string(),
            status_description: shipment.status_description().to_string(),
            courier: shipment.courier().cloned(),
            pickup_address: shipment.pickup_address().cloned(),
            delivery_address: shipment.delivery_address().cloned(),
            delivery_mode: shipment.delivery_mode(),
            shipping_cost_cents: shipment.shipping_cost().cents(),
            estimated_delivery: shipment.estimated_delivery().map(|t| t.to_rfc3339()),
            dispatched_at: shipment.dispatched_at().map(|t| t.to_rfc3339()),
            delivered_at: shipment.delivered_at().map(|t| t.to_rfc3339()),
            is_return_shipment: shipment.is_return_shipment(),
            original_shipment_id: shipment.original_shipment_id().map(|id| id.to_string()),
            return_reason: shipment.return_reason().map(String::from),
            history: shipment
                .history()
                .iter()
                .map(|e| TrackingEventResponse {
                    status: e.status.to_string(),
                    location: e.location.clone(),
                    description: e.description.clone(),
                    actor: e.actor.to_string(),
                    recorded_at: e.recorded_at.to_rfc3339(),
                })
                .collect(),
        }
    }
}

// -- Handlers --

/// POST /shipping/create — create a shipment for an order.
#[tracing::instrument(skip(state, req))]
pub async fn create<L: Ledger + Clone + 'static>(
    State(state): State<Arc<AppState<L>>>,
    Json(req): Json<CreateShipmentRequest>,
) -> Result<(StatusCode, Json<ShipmentResponse>), ApiError> {
    let order_id = OrderId::from_uuid(parse_uuid(&req.order_id, "order_id")?);
    let customer_id = match &req.customer_id {
        Some(id) => CustomerId::from_uuid(parse_uuid(id, "customer_id")?),
        None => CustomerId::new(),
    };
    let vendor_id = match &req.vendor_id {
        Some(id) => Some(VendorId::from_uuid(parse_uuid(id, "vendor_id")?)),
        None => None,
    };

    let cmd = CreateShipment::new(
        order_id,
        customer_id,
        vendor_id,
        req.pickup_address,
        req.delivery_address,
        req.package,
        req.delivery_mode,
        Money::from_cents(req.shipping_cost_cents),
        req.estimated_delivery,
    );

    let result = state.shipments.create_shipment(cmd).await?;

    Ok((
        StatusCode::CREATED,
        Json(ShipmentResponse::from_shipment(&result.entity)),
    ))
}

/// PUT /shipping/:tracking/status — apply a status transition.
#[tracing::instrument(skip(state, req))]
pub async fn update_status<L: Ledger + Clone + 'static>(
    State(state): State<Arc<AppState<L>>>,
    Path(tracking): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<ShipmentResponse>, ApiError> {
    let shipment_id = resolve_tracking(&state, &tracking).await?;

    let result = state
        .shipments
        .update_status(UpdateShipmentStatus::new(
            shipment_id,
            req.status,
            req.location,
            req.description,
            req.actor,
        ))
        .await?;

    Ok(Json(ShipmentResponse::from_shipment(&result.entity)))
}

/// POST /shipping/:tracking/assign-courier — assign a courier.
#[tracing::instrument(skip(state, req))]
pub async fn assign_courier<L: Ledger + Clone + 'static>(
    State(state): State<Arc<AppState<L>>>,
    Path(tracking): Path<String>,
    Json(req): Json<AssignCourierRequest>,
) -> Result<Json<ShipmentResponse>, ApiError> {
    let shipment_id = resolve_tracking(&state, &tracking).await?;

    let mut courier = CourierInfo::named(&req.name);
    courier.phone = req.phone;
    courier.service = req.service;

    let result = state
        .shipments
        .assign_courier(AssignCourier::new(shipment_id, courier))
        .await?;

    Ok(Json(ShipmentResponse::from_shipment(&result.entity)))
}

/// POST /shipping/:tracking/return — raise a return shipment reversing
/// this one.
#[tracing::instrument(skip(state, req))]
pub async fn create_return<L: Ledger + Clone + 'static>(
    State(state): State<Arc<AppState<L>>>,
    Path(tracking): Path<String>,
    Json(req): Json<CreateReturnShipmentRequest>,
) -> Result<(StatusCode, Json<ShipmentResponse>), ApiError> {
    let shipment_id = resolve_tracking(&state, &tracking).await?;

    let result = state
        .shipments
        .create_return_shipment(CreateReturnShipment::new(shipment_id, req.reason))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ShipmentResponse::from_shipment(&result.entity)),
    ))
}

/// GET /shipping/track/:tracking — full shipment view with history.
#[tracing::instrument(skip(state))]
pub async fn track<L: Ledger + Clone + 'static>(
    State(state): State<Arc<AppState<L>>>,
    Path(tracking): Path<String>,
) -> Result<Json<ShipmentResponse>, ApiError> {
    let shipment = state
        .shipments
        .get_by_tracking_number(&tracking)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Shipment {tracking} not found")))?;

    Ok(Json(ShipmentResponse::from_shipment(&shipment)))
}

/// GET /shipping/track/order/:order_id — shipment for an order.
#[tracing::instrument(skip(state))]
pub async fn track_by_order<L: Ledger + Clone + 'static>(
    State(state): State<Arc<AppState<L>>>,
    Path(order_id): Path<String>,
) -> Result<Json<ShipmentResponse>, ApiError> {
    let order_id = OrderId::from_uuid(parse_uuid(&order_id, "order_id")?);

    let stream_id = state
        .shipments
        .find_by_order(order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No shipment for order {order_id}")))?;

    let shipment = state
        .shipments
        .get_shipment(stream_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No shipment for order {order_id}")))?;

    Ok(Json(ShipmentResponse::from_shipment(&shipment)))
}

/// GET /shipping/customer/:customer_id — active shipments for a customer,
/// served from the read model.
#[tracing::instrument(skip(state))]
pub async fn by_customer<L: Ledger + Clone + 'static>(
    State(state): State<Arc<AppState<L>>>,
    Path(customer_id): Path<String>,
) -> Result<Json<Vec<ShipmentSummaryResponse>>, ApiError> {
    let customer_id = CustomerId::from_uuid(parse_uuid(&customer_id, "customer_id")?);

    // Run catch-up so the view includes the latest entries.
    state
        .projection_processor
        .run_catch_up()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let shipments = state.active_shipments.get_by_customer(customer_id).await;

    Ok(Json(
        shipments
            .into_iter()
            .map(|s| ShipmentSummaryResponse {
                shipment_id: s.shipment_id.to_string(),
                tracking_number: s.tracking_number,
                order_id: s.order_id.to_string(),
                status: s.status.to_string(),
                estimated_delivery: s.estimated_delivery.map(|t| t.to_rfc3339()),
                is_return_shipment: s.is_return_shipment,
                last_updated: s.last_updated.to_rfc3339(),
            })
            .collect(),
    ))
}

async fn resolve_tracking<L: Ledger + Clone + 'static>(
    state: &AppState<L>,
    tracking: &str,
) -> Result<common::StreamId, ApiError> {
    state
        .shipments
        .find_by_tracking_number(tracking)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Shipment {tracking} not found")))
}
