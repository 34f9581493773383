//! Payment ledger queries
//!
//! Ledger rows are append-only apart from the status transition performed by
//! the reconciler. Timestamps are written by code as RFC 3339 TEXT so reads
//! round-trip through chrono without driver-specific decoding.

use chrono::Utc;
use lodge_common::db::models::{Payment, PaymentRow};
use lodge_common::types::{PaymentKind, PaymentMode};
use lodge_common::Result;
use sqlx::SqlitePool;
use uuid::Uuid;

const PAYMENT_COLUMNS: &str = "guid, member_id, kind, event_id, amount, mode, receipt_url, \
                               status, rejection_reason, created_at";

/// Insert payload for a ledger entry. Rows always start out pending.
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub member_id: Uuid,
    pub kind: PaymentKind,
    pub event_id: Option<Uuid>,
    pub amount: i64,
    pub mode: PaymentMode,
    pub receipt_url: Option<String>,
}

/// Insert a pending payment and return its generated guid.
///
/// The partial unique indexes on the payments table reject a second pending
/// upgrade for the same member and a second live event-fee payment for the
/// same (member, event); callers map those violations to conflict errors.
pub async fn insert_payment(db: &SqlitePool, new: &NewPayment) -> Result<Uuid> {
    let guid = Uuid::new_v4();
    let now = Utc::now().to_rfc3339();
    sqlx::query(
        "INSERT INTO payments \
             (guid, member_id, kind, event_id, amount, mode, receipt_url, status, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, 'pending', ?, ?)",
    )
    .bind(guid.to_string())
    .bind(new.member_id.to_string())
    .bind(new.kind.as_str())
    .bind(new.event_id.map(|id| id.to_string()))
    .bind(new.amount)
    .bind(new.mode.as_str())
    .bind(new.receipt_url.as_deref())
    .bind(&now)
    .bind(&now)
    .execute(db)
    .await?;
    Ok(guid)
}

/// Fetch a payment by guid.
pub async fn get_payment(db: &SqlitePool, guid: Uuid) -> Result<Option<Payment>> {
    let sql = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE guid = ?");
    let row = sqlx::query_as::<_, PaymentRow>(&sql)
        .bind(guid.to_string())
        .fetch_optional(db)
        .await?;
    row.map(Payment::try_from).transpose()
}

/// A member's full payment history, newest first.
pub async fn list_payments_for_member(db: &SqlitePool, member_id: Uuid) -> Result<Vec<Payment>> {
    let sql = format!(
        "SELECT {PAYMENT_COLUMNS} FROM payments \
         WHERE member_id = ? ORDER BY created_at DESC, guid"
    );
    let rows = sqlx::query_as::<_, PaymentRow>(&sql)
        .bind(member_id.to_string())
        .fetch_all(db)
        .await?;
    rows.into_iter().map(Payment::try_from).collect()
}

/// The admin review queue: every pending payment, newest first.
pub async fn list_pending_payments(db: &SqlitePool) -> Result<Vec<Payment>> {
    let sql = format!(
        "SELECT {PAYMENT_COLUMNS} FROM payments \
         WHERE status = 'pending' ORDER BY created_at DESC, guid"
    );
    let rows = sqlx::query_as::<_, PaymentRow>(&sql)
        .fetch_all(db)
        .await?;
    rows.into_iter().map(Payment::try_from).collect()
}

/// The settled event-fee payment for (member, event), if one exists.
///
/// The partial unique index guarantees at most one non-rejected row per
/// (member, event), so this can never be ambiguous.
pub async fn find_settled_event_payment(
    db: &SqlitePool,
    member_id: Uuid,
    event_id: Uuid,
) -> Result<Option<Payment>> {
    let sql = format!(
        "SELECT {PAYMENT_COLUMNS} FROM payments \
         WHERE member_id = ? AND event_id = ? AND kind = 'event_fee' AND status = 'settled'"
    );
    let row = sqlx::query_as::<_, PaymentRow>(&sql)
        .bind(member_id.to_string())
        .bind(event_id.to_string())
        .fetch_optional(db)
        .await?;
    row.map(Payment::try_from).transpose()
}
