//! Event queries

use lodge_common::db::models::{Event, EventRow};
use lodge_common::types::{EventStatus, Zone};
use lodge_common::{Result, Tier};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Insert payload for event creation.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub location: String,
    pub zones: Vec<Zone>,
    pub tiers_allowed: Vec<Tier>,
    pub fee: i64,
    pub status: EventStatus,
}

/// Insert an event row and return its generated guid.
///
/// Zone and tier sets are stored as JSON arrays in TEXT columns.
pub async fn insert_event(db: &SqlitePool, new: &NewEvent) -> Result<Uuid> {
    let guid = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO events (guid, title, location, zones, tiers_allowed, fee, status)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(guid.to_string())
    .bind(&new.title)
    .bind(&new.location)
    .bind(serde_json::to_string(&new.zones)?)
    .bind(serde_json::to_string(&new.tiers_allowed)?)
    .bind(new.fee)
    .bind(new.status.as_str())
    .execute(db)
    .await?;
    Ok(guid)
}

/// Fetch an event by guid.
pub async fn get_event(db: &SqlitePool, guid: Uuid) -> Result<Option<Event>> {
    let row = sqlx::query_as::<_, EventRow>(
        "SELECT guid, title, location, zones, tiers_allowed, fee, status
         FROM events WHERE guid = ?",
    )
    .bind(guid.to_string())
    .fetch_optional(db)
    .await?;
    row.map(Event::try_from).transpose()
}

/// List events in the given status, newest first.
pub async fn list_events_by_status(db: &SqlitePool, status: EventStatus) -> Result<Vec<Event>> {
    let rows = sqlx::query_as::<_, EventRow>(
        "SELECT guid, title, location, zones, tiers_allowed, fee, status
         FROM events WHERE status = ? ORDER BY created_at DESC, guid",
    )
    .bind(status.as_str())
    .fetch_all(db)
    .await?;
    rows.into_iter().map(Event::try_from).collect()
}

/// True when an upcoming event with this exact title already exists.
pub async fn upcoming_title_exists(db: &SqlitePool, title: &str) -> Result<bool> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM events WHERE title = ? AND status = 'upcoming'",
    )
    .bind(title)
    .fetch_one(db)
    .await?;
    Ok(count > 0)
}

/// Set an event's status. Returns false when the guid is unknown.
pub async fn set_event_status(db: &SqlitePool, guid: Uuid, status: EventStatus) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE events SET status = ?, updated_at = CURRENT_TIMESTAMP WHERE guid = ?",
    )
    .bind(status.as_str())
    .bind(guid.to_string())
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}
