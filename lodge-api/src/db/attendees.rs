//! Attendance queries

use chrono::Utc;
use lodge_common::db::models::{Attendee, AttendeeRow};
use lodge_common::Result;
use sqlx::SqlitePool;
use uuid::Uuid;

/// Record attendance. The composite primary key rejects duplicates.
pub async fn insert_attendee(
    db: &SqlitePool,
    event_id: Uuid,
    member_id: Uuid,
    payment_id: Option<Uuid>,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO attendees (event_id, member_id, payment_id, marked_at) VALUES (?, ?, ?, ?)",
    )
    .bind(event_id.to_string())
    .bind(member_id.to_string())
    .bind(payment_id.map(|id| id.to_string()))
    .bind(Utc::now().to_rfc3339())
    .execute(db)
    .await?;
    Ok(())
}

/// Fetch one attendance record.
pub async fn get_attendee(
    db: &SqlitePool,
    event_id: Uuid,
    member_id: Uuid,
) -> Result<Option<Attendee>> {
    let row = sqlx::query_as::<_, AttendeeRow>(
        "SELECT event_id, member_id, payment_id, marked_at
         FROM attendees WHERE event_id = ? AND member_id = ?",
    )
    .bind(event_id.to_string())
    .bind(member_id.to_string())
    .fetch_optional(db)
    .await?;
    row.map(Attendee::try_from).transpose()
}

/// True when the member is already on the event's attendance list.
pub async fn has_attended(db: &SqlitePool, event_id: Uuid, member_id: Uuid) -> Result<bool> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM attendees WHERE event_id = ? AND member_id = ?)",
    )
    .bind(event_id.to_string())
    .bind(member_id.to_string())
    .fetch_one(db)
    .await?;
    Ok(exists)
}
