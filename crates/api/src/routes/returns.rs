//! Return workflow endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::Utc;
use common::{CustomerId, OrderId, OrderItemId};
use domain::returns::{
    InitiateRefund, PickupDetails, QualityCheckResult, RefundDetails, RefundMethod,
    RequestReturn, ReturnReason, ReturnRequest, ReturnStatus, ReturnType, SchedulePickup,
    SubmitQualityCheck, UpdateReturnStatus,
};
use domain::shipment::{Actor, Address, Money};
use ledger::Ledger;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

use super::{AppState, parse_uuid};

// -- Request types --

#[derive(Deserialize)]
pub struct CreateReturnRequest {
    pub order_id: String,
    pub order_item_id: String,
    pub customer_id: String,
    #[serde(default)]
    pub return_type: ReturnType,
    pub reason: ReturnReason,
    #[serde(default)]
    pub description: String,
    pub item_price_cents: i64,
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct UpdateReturnStatusRequest {
    pub status: ReturnStatus,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub actor: Actor,
}

#[derive(Deserialize)]
pub struct SchedulePickupRequest {
    pub pickup_address: Address,
    pub scheduled_for: chrono::DateTime<chrono::Utc>,
    pub courier_name: String,
    pub courier_reference: Option<String>,
    #[serde(default)]
    pub actor: Actor,
}

#[derive(Deserialize)]
pub struct QualityCheckRequest {
    pub passed: bool,
    pub inspector: String,
    #[serde(default)]
    pub condition: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub defect_images: Vec<String>,
    #[serde(default)]
    pub eligible_for_restock: bool,
}

#[derive(Deserialize)]
pub struct InitiateRefundRequest {
    #[serde(default)]
    pub method: RefundMethod,
    pub amount_cents: i64,
    #[serde(default)]
    pub deductions_cents: i64,
    pub deduction_reason: Option<String>,
}

#[derive(Deserialize)]
pub struct FailRefundRequest {
    pub reason: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct ReturnStatusEventResponse {
    pub status: String,
    pub comment: String,
    pub actor: String,
    pub recorded_at: String,
}

#[derive(Serialize)]
pub struct RefundResponse {
    pub method: RefundMethod,
    pub amount_cents: i64,
    pub deductions_cents: i64,
    pub deduction_reason: Option<String>,
    pub status: String,
    pub initiated_at: String,
    pub completed_at: Option<String>,
    pub failure_reason: Option<String>,
}

impl RefundResponse {
    fn from_details(refund: &RefundDetails) -> Self {
        Self {
            method: refund.method,
            amount_cents: refund.amount.cents(),
            deductions_cents: refund.deductions.cents(),
            deduction_reason: refund.deduction_reason.clone(),
            status: format!("{:?}", refund.status),
            initiated_at: refund.initiated_at.to_rfc3339(),
            completed_at: refund.completed_at.map(|t| t.to_rfc3339()),
            failure_reason: refund.failure_reason.clone(),
        }
    }
}

#[derive(Serialize)]
pub struct ReturnSummaryResponse {
    pub return_id: String,
    pub return_code: String,
    pub order_id: String,
    pub return_type: ReturnType,
    pub status: String,
    pub refund_status: Option<String>,
    pub requested_at: String,
    pub last_updated: String,
}

#[derive(Serialize)]
pub struct ReturnResponse {
    pub id: String,
    pub return_code: String,
    pub order_id: String,
    pub order_item_id: String,
    pub customer_id: String,
    pub return_type: ReturnType,
    pub reason: Option<ReturnReason>,
    pub description: String,
    pub item_price_cents: i64,
    pub quantity: u32,
    pub status: String,
    pub pickup: Option<PickupDetails>,
    pub quality_check: Option<QualityCheckResult>,
    pub refund: Option<RefundResponse>,
    pub replacement_tracking_number: Option<String>,
    pub requested_at: Option<String>,
    pub completed_at: Option<String>,
    pub resolution: Option<String>,
    pub history: Vec<ReturnStatusEventResponse>,
}

impl ReturnResponse {
    fn from_return(ret: &ReturnRequest) -> Self {
        use domain::EventSourced;

        Self {
            id: ret.id().map(|id| id.to_string()).unwrap_or_default(),
            return_code: ret.return_code().to_string(),
            order_id: ret.order_id().map(|id| id.to_string()).unwrap_or_default(),
            order_item_id: ret
                .order_item_id()
                .map(|id| id.to_string())
                .unwrap_or_default(),
            customer_id: ret
                .customer_id()
                .map(|id| id.to_string())
                .unwrap_or_default(),
            return_type: ret.return_type(),
            reason: ret.reason(),
            description: ret.description().to_string(),
            item_price_cents: ret.item_price().cents(),
            quantity: ret.quantity(),
            status: ret.status().to_string(),
            pickup: ret.pickup().cloned(),
            quality_check: ret.quality_check().cloned(),
            refund: ret.refund().map(RefundResponse::from_details),
            replacement_tracking_number: ret.replacement_tracking_number().map(String::from),
            requested_at: ret.requested_at().map(|t| t.to_rfc3339()),
            completed_at: ret.completed_at().map(|t| t.to_rfc3339()),
            resolution: ret.resolution().map(String::from),
            history: ret
                .history()
                .iter()
                .map(|e| ReturnStatusEventResponse {
                    status: e.status.to_string(),
                    comment: e.comment.clone(),
                    actor: e.actor.to_string(),
                    recorded_at: e.recorded_at.to_rfc3339(),
                })
                .collect(),
        }
    }
}

// -- Handlers --

/// POST /returns/create — request a return for an order item.
#[tracing::instrument(skip(state, req))]
pub async fn create<L: Ledger + Clone + 'static>(
    State(state): State<Arc<AppState<L>>>,
    Json(req): Json<CreateReturnRequest>,
) -> Result<(StatusCode, Json<ReturnResponse>), ApiError> {
    let order_id = OrderId::from_uuid(parse_uuid(&req.order_id, "order_id")?);
    let order_item_id = OrderItemId::from_uuid(parse_uuid(&req.order_item_id, "order_item_id")?);
    let customer_id = CustomerId::from_uuid(parse_uuid(&req.customer_id, "customer_id")?);

    let cmd = RequestReturn::new(
        order_id,
        order_item_id,
        customer_id,
        req.return_type,
        req.reason,
        req.description,
        Money::from_cents(req.item_price_cents),
        req.quantity,
    );

    let result = state.returns.request_return(cmd).await?;

    Ok((
        StatusCode::CREATED,
        Json(ReturnResponse::from_return(&result.entity)),
    ))
}

/// PUT /returns/:code/status — apply a status transition.
#[tracing::instrument(skip(state, req))]
pub async fn update_status<L: Ledger + Clone + 'static>(
    State(state): State<Arc<AppState<L>>>,
    Path(code): Path<String>,
    Json(req): Json<UpdateReturnStatusRequest>,
) -> Result<Json<ReturnResponse>, ApiError> {
    let return_id = resolve_code(&state, &code).await?;

    let result = state
        .returns
        .update_status(UpdateReturnStatus::new(
            return_id, req.status, req.comment, req.actor,
        ))
        .await?;

    Ok(Json(ReturnResponse::from_return(&result.entity)))
}

/// POST /returns/:code/schedule-pickup — book the collection courier.
#[tracing::instrument(skip(state, req))]
pub async fn schedule_pickup<L: Ledger + Clone + 'static>(
    State(state): State<Arc<AppState<L>>>,
    Path(code): Path<String>,
    Json(req): Json<SchedulePickupRequest>,
) -> Result<Json<ReturnResponse>, ApiError> {
    let return_id = resolve_code(&state, &code).await?;

    let pickup = PickupDetails {
        pickup_address: req.pickup_address,
        scheduled_for: req.scheduled_for,
        courier_name: req.courier_name,
        courier_reference: req.courier_reference,
    };

    let result = state
        .returns
        .schedule_pickup(SchedulePickup::new(return_id, pickup, req.actor))
        .await?;

    Ok(Json(ReturnResponse::from_return(&result.entity)))
}

/// POST /returns/:code/quality-check — record the inspection outcome.
#[tracing::instrument(skip(state, req))]
pub async fn quality_check<L: Ledger + Clone + 'static>(
    State(state): State<Arc<AppState<L>>>,
    Path(code): Path<String>,
    Json(req): Json<QualityCheckRequest>,
) -> Result<Json<ReturnResponse>, ApiError> {
    let return_id = resolve_code(&state, &code).await?;

    let result = QualityCheckResult {
        passed: req.passed,
        inspector: req.inspector,
        condition: req.condition,
        notes: req.notes,
        defect_images: req.defect_images,
        eligible_for_restock: req.eligible_for_restock,
        checked_at: Utc::now(),
    };

    let result = state
        .returns
        .submit_quality_check(SubmitQualityCheck::new(return_id, result))
        .await?;

    Ok(Json(ReturnResponse::from_return(&result.entity)))
}

/// POST /returns/:code/refund/initiate — start the refund payout.
#[tracing::instrument(skip(state, req))]
pub async fn refund_initiate<L: Ledger + Clone + 'static>(
    State(state): State<Arc<AppState<L>>>,
    Path(code): Path<String>,
    Json(req): Json<InitiateRefundRequest>,
) -> Result<Json<ReturnResponse>, ApiError> {
    let return_id = resolve_code(&state, &code).await?;

    let result = state
        .returns
        .initiate_refund(InitiateRefund::new(
            return_id,
            req.method,
            Money::from_cents(req.amount_cents),
            Money::from_cents(req.deductions_cents),
            req.deduction_reason,
        ))
        .await?;

    Ok(Json(ReturnResponse::from_return(&result.entity)))
}

/// POST /returns/:code/refund/complete — mark the payout as settled.
#[tracing::instrument(skip(state))]
pub async fn refund_complete<L: Ledger + Clone + 'static>(
    State(state): State<Arc<AppState<L>>>,
    Path(code): Path<String>,
) -> Result<Json<ReturnResponse>, ApiError> {
    let return_id = resolve_code(&state, &code).await?;

    let result = state.returns.complete_refund(return_id).await?;

    Ok(Json(ReturnResponse::from_return(&result.entity)))
}

/// POST /returns/:code/refund/fail — record a payout failure.
#[tracing::instrument(skip(state, req))]
pub async fn refund_fail<L: Ledger + Clone + 'static>(
    State(state): State<Arc<AppState<L>>>,
    Path(code): Path<String>,
    Json(req): Json<FailRefundRequest>,
) -> Result<Json<ReturnResponse>, ApiError> {
    let return_id = resolve_code(&state, &code).await?;

    let result = state.returns.fail_refund(return_id, req.reason).await?;

    Ok(Json(ReturnResponse::from_return(&result.entity)))
}

/// GET /returns/:code — full return view with history.
#[tracing::instrument(skip(state))]
pub async fn get<L: Ledger + Clone + 'static>(
    State(state): State<Arc<AppState<L>>>,
    Path(code): Path<String>,
) -> Result<Json<ReturnResponse>, ApiError> {
    let ret = state
        .returns
        .get_by_code(&code)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Return {code} not found")))?;

    Ok(Json(ReturnResponse::from_return(&ret)))
}

/// GET /returns/customer/:customer_id — open returns for a customer,
/// served from the read model.
#[tracing::instrument(skip(state))]
pub async fn by_customer<L: Ledger + Clone + 'static>(
    State(state): State<Arc<AppState<L>>>,
    Path(customer_id): Path<String>,
) -> Result<Json<Vec<ReturnSummaryResponse>>, ApiError> {
    let customer_id = CustomerId::from_uuid(parse_uuid(&customer_id, "customer_id")?);

    // Run catch-up so the view includes the latest entries.
    state
        .projection_processor
        .run_catch_up()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let returns = state.open_returns.get_by_customer(customer_id).await;

    Ok(Json(
        returns
            .into_iter()
            .map(|r| ReturnSummaryResponse {
                return_id: r.return_id.to_string(),
                return_code: r.return_code,
                order_id: r.order_id.to_string(),
                return_type: r.return_type,
                status: r.status.to_string(),
                refund_status: r.refund_status.map(|s| format!("{s:?}")),
                requested_at: r.requested_at.to_rfc3339(),
                last_updated: r.last_updated.to_rfc3339(),
            })
            .collect(),
    ))
}

async fn resolve_code<L: Ledger + Clone + 'static>(
    state: &AppState<L>,
    code: &str,
) -> Result<common::StreamId, ApiError> {
    state
        .returns
        .find_by_code(code)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Return {code} not found")))
}
