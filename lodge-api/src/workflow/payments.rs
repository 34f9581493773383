//! Payment submission: pending ledger entries for tier upgrades and event
//! fees.
//!
//! Submission never mutates member or event state; it only appends a pending
//! row after every precondition holds. The duplicate checks are SELECTs for
//! the friendly error, backed by the partial unique indexes so a concurrent
//! double-submit still ends up with exactly one pending row.

use lodge_common::db::models::Payment;
use lodge_common::types::{PaymentKind, PaymentMode};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use super::{eligibility, is_unique_violation, CoreError};
use crate::db;

/// Submit a membership-upgrade payment for the member.
///
/// The amount must equal the upgrade fee of the member's immediate next
/// tier; members at the top of the ladder have nothing to upgrade to. At
/// most one pending upgrade payment may exist per member.
pub async fn submit_upgrade_payment(
    db: &SqlitePool,
    member_id: Uuid,
    amount: i64,
    mode: PaymentMode,
    receipt_url: Option<String>,
) -> Result<Payment, CoreError> {
    let member = db::members::get_member(db, member_id)
        .await?
        .ok_or(CoreError::NotFound("Member"))?;

    let next = member.tier.next().ok_or(CoreError::NoUpgradeAvailable)?;
    let expected = next.upgrade_fee();
    if amount != expected {
        return Err(CoreError::AmountMismatch {
            expected,
            actual: amount,
        });
    }

    if pending_upgrade_exists(db, member_id).await? {
        return Err(CoreError::PendingPaymentExists);
    }

    let new = db::payments::NewPayment {
        member_id,
        kind: PaymentKind::MembershipUpgrade,
        event_id: None,
        amount,
        mode,
        receipt_url,
    };
    let guid = match db::payments::insert_payment(db, &new).await {
        Ok(guid) => guid,
        // Lost the race against a concurrent submit; same outcome as the
        // pre-check above.
        Err(err) if is_unique_violation(&err) => return Err(CoreError::PendingPaymentExists),
        Err(err) => return Err(err.into()),
    };

    info!(
        payment_id = %guid,
        member_id = %member_id,
        target_tier = %next,
        amount,
        "Upgrade payment submitted"
    );

    db::payments::get_payment(db, guid)
        .await?
        .ok_or(CoreError::NotFound("Payment"))
}

/// Submit an event-fee payment for the member.
///
/// The event must be upcoming, the member eligible for it, the event must
/// actually charge a fee, and the amount must match it exactly. At most one
/// non-rejected event-fee payment may exist per (member, event).
pub async fn submit_event_payment(
    db: &SqlitePool,
    member_id: Uuid,
    event_id: Uuid,
    amount: i64,
    mode: PaymentMode,
    receipt_url: Option<String>,
) -> Result<Payment, CoreError> {
    let member = db::members::get_member(db, member_id)
        .await?
        .ok_or(CoreError::NotFound("Member"))?;
    let event = db::events::get_event(db, event_id)
        .await?
        .ok_or(CoreError::NotFound("Event"))?;

    eligibility::ensure_upcoming(&event)?;
    eligibility::check_eligibility(&member, &event)?;

    if event.is_free() {
        return Err(CoreError::EventIsFree);
    }
    if amount != event.fee {
        return Err(CoreError::AmountMismatch {
            expected: event.fee,
            actual: amount,
        });
    }

    if live_event_payment_exists(db, member_id, event_id).await? {
        return Err(CoreError::PaymentAlreadyExists);
    }

    let new = db::payments::NewPayment {
        member_id,
        kind: PaymentKind::EventFee,
        event_id: Some(event_id),
        amount,
        mode,
        receipt_url,
    };
    let guid = match db::payments::insert_payment(db, &new).await {
        Ok(guid) => guid,
        Err(err) if is_unique_violation(&err) => return Err(CoreError::PaymentAlreadyExists),
        Err(err) => return Err(err.into()),
    };

    info!(
        payment_id = %guid,
        member_id = %member_id,
        event_id = %event_id,
        amount,
        "Event-fee payment submitted"
    );

    db::payments::get_payment(db, guid)
        .await?
        .ok_or(CoreError::NotFound("Payment"))
}

async fn pending_upgrade_exists(db: &SqlitePool, member_id: Uuid) -> Result<bool, CoreError> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM payments \
         WHERE member_id = ? AND kind = 'membership_upgrade' AND status = 'pending')",
    )
    .bind(member_id.to_string())
    .fetch_one(db)
    .await?;
    Ok(exists)
}

async fn live_event_payment_exists(
    db: &SqlitePool,
    member_id: Uuid,
    event_id: Uuid,
) -> Result<bool, CoreError> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM payments \
         WHERE member_id = ? AND event_id = ? AND kind = 'event_fee' AND status <> 'rejected')",
    )
    .bind(member_id.to_string())
    .bind(event_id.to_string())
    .fetch_one(db)
    .await?;
    Ok(exists)
}
