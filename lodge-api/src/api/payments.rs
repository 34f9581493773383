//! Payment submission and review endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::extract::{AdminContext, MemberContext};
use crate::error::{ApiError, ApiResult};
use crate::workflow;
use crate::AppState;
use lodge_common::db::models::Payment;
use lodge_common::types::{PaymentKind, PaymentMode, PaymentStatus};
use lodge_common::Tier;

pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/payments/upgrade", post(submit_upgrade))
        .route("/payments/event", post(submit_event_fee))
        .route("/payments/mine", get(list_own_payments))
        .route("/payments/pending", get(list_pending))
        .route("/payments/:id/approve", post(approve))
        .route("/payments/:id/reject", post(reject))
}

#[derive(Debug, Deserialize)]
pub struct SubmitUpgradeRequest {
    pub amount: i64,
    /// Payment mode name: "cash", "upi", "online" or "bank"
    pub mode: String,
    pub receipt_url: Option<String>,
}

/// POST /payments/upgrade (member)
async fn submit_upgrade(
    ctx: MemberContext,
    State(state): State<AppState>,
    Json(req): Json<SubmitUpgradeRequest>,
) -> ApiResult<(StatusCode, Json<Payment>)> {
    let mode = parse_mode(&req.mode)?;
    let payment = workflow::submit_upgrade_payment(
        &state.db,
        ctx.member_id,
        req.amount,
        mode,
        req.receipt_url,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

#[derive(Debug, Deserialize)]
pub struct SubmitEventFeeRequest {
    pub event_id: Uuid,
    pub amount: i64,
    pub mode: String,
    pub receipt_url: Option<String>,
}

/// POST /payments/event (member)
async fn submit_event_fee(
    ctx: MemberContext,
    State(state): State<AppState>,
    Json(req): Json<SubmitEventFeeRequest>,
) -> ApiResult<(StatusCode, Json<Payment>)> {
    let mode = parse_mode(&req.mode)?;
    let payment = workflow::submit_event_payment(
        &state.db,
        ctx.member_id,
        req.event_id,
        req.amount,
        mode,
        req.receipt_url,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

/// GET /payments/mine (member)
async fn list_own_payments(
    ctx: MemberContext,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Payment>>> {
    let payments = crate::db::payments::list_payments_for_member(&state.db, ctx.member_id).await?;
    Ok(Json(payments))
}

/// GET /payments/pending (admin)
async fn list_pending(
    _admin: AdminContext,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Payment>>> {
    let payments = crate::db::payments::list_pending_payments(&state.db).await?;
    Ok(Json(payments))
}

/// Review outcome. For settled upgrades the member's new tier rides along.
#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub payment: Payment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_tier: Option<Tier>,
}

/// POST /payments/:id/approve (admin)
async fn approve(
    _admin: AdminContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ReviewResponse>> {
    let payment = workflow::approve_payment(&state.db, id).await?;
    let new_tier = match (payment.kind, payment.status) {
        (PaymentKind::MembershipUpgrade, PaymentStatus::Settled) => {
            Tier::from_upgrade_fee(payment.amount)
        }
        _ => None,
    };
    Ok(Json(ReviewResponse { payment, new_tier }))
}

#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    pub reason: String,
}

/// POST /payments/:id/reject (admin)
async fn reject(
    _admin: AdminContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<RejectRequest>,
) -> ApiResult<Json<Payment>> {
    let reason = req.reason.trim();
    if reason.is_empty() {
        return Err(ApiError::BadRequest(
            "Rejection reason must not be empty".to_string(),
        ));
    }
    let payment = workflow::reject_payment(&state.db, id, reason).await?;
    Ok(Json(payment))
}

fn parse_mode(text: &str) -> Result<PaymentMode, ApiError> {
    text.parse()
        .map_err(|e: lodge_common::Error| ApiError::BadRequest(e.to_string()))
}
