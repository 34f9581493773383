//! Member queries

use lodge_common::db::models::{Member, MemberRow};
use lodge_common::types::{MemberStatus, Zone};
use lodge_common::{Result, Tier};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Insert payload for member registration.
#[derive(Debug, Clone)]
pub struct NewMember {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub password_salt: String,
    pub zone: Zone,
    pub tier: Tier,
}

/// Insert a member row and return its generated guid.
///
/// A duplicate email surfaces as a unique-constraint database error; callers
/// map that to their own conflict error.
pub async fn insert_member(db: &SqlitePool, new: &NewMember) -> Result<Uuid> {
    let guid = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO members (guid, name, email, password_hash, password_salt, zone, tier)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(guid.to_string())
    .bind(&new.name)
    .bind(&new.email)
    .bind(&new.password_hash)
    .bind(&new.password_salt)
    .bind(new.zone.as_str())
    .bind(new.tier.as_str())
    .execute(db)
    .await?;
    Ok(guid)
}

/// Fetch a member by guid.
pub async fn get_member(db: &SqlitePool, guid: Uuid) -> Result<Option<Member>> {
    let row = sqlx::query_as::<_, MemberRow>(
        "SELECT guid, name, email, password_hash, password_salt, zone, tier, status
         FROM members WHERE guid = ?",
    )
    .bind(guid.to_string())
    .fetch_optional(db)
    .await?;
    row.map(Member::try_from).transpose()
}

/// Fetch the raw member row by email, password material included.
///
/// Only the login handler needs the hash and salt; everything else goes
/// through [`get_member`].
pub async fn get_member_row_by_email(db: &SqlitePool, email: &str) -> Result<Option<MemberRow>> {
    let row = sqlx::query_as::<_, MemberRow>(
        "SELECT guid, name, email, password_hash, password_salt, zone, tier, status
         FROM members WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// List all members, ordered by name.
pub async fn list_members(db: &SqlitePool) -> Result<Vec<Member>> {
    let rows = sqlx::query_as::<_, MemberRow>(
        "SELECT guid, name, email, password_hash, password_salt, zone, tier, status
         FROM members ORDER BY name, guid",
    )
    .fetch_all(db)
    .await?;
    rows.into_iter().map(Member::try_from).collect()
}

/// Set a member's status. Returns false when the guid is unknown.
pub async fn set_member_status(
    db: &SqlitePool,
    guid: Uuid,
    status: MemberStatus,
) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE members SET status = ?, updated_at = CURRENT_TIMESTAMP WHERE guid = ?",
    )
    .bind(status.as_str())
    .bind(guid.to_string())
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}
