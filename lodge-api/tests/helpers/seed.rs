//! Seed data builders for integration tests

use anyhow::Result;
use lodge_api::db::events::NewEvent;
use lodge_api::db::members::NewMember;
use lodge_common::auth::{self, Claims, Role};
use lodge_common::types::{EventStatus, Zone};
use lodge_common::Tier;
use sqlx::SqlitePool;
use uuid::Uuid;

/// Password every seeded member can log in with.
pub const TEST_PASSWORD: &str = "correct-horse-battery-staple";

/// Insert a member with a real password hash so the login endpoint works
/// against it.
pub async fn seed_member(db: &SqlitePool, email: &str, zone: Zone, tier: Tier) -> Result<Uuid> {
    let salt = auth::generate_salt();
    let new = NewMember {
        name: format!("Member <{email}>"),
        email: email.to_string(),
        password_hash: auth::hash_password(TEST_PASSWORD, &salt),
        password_salt: salt,
        zone,
        tier,
    };
    Ok(lodge_api::db::members::insert_member(db, &new).await?)
}

/// Insert an upcoming event.
pub async fn seed_event(
    db: &SqlitePool,
    title: &str,
    zones: Vec<Zone>,
    tiers_allowed: Vec<Tier>,
    fee: i64,
) -> Result<Uuid> {
    let new = NewEvent {
        title: title.to_string(),
        location: "Assembly hall".to_string(),
        zones,
        tiers_allowed,
        fee,
        status: EventStatus::Upcoming,
    };
    Ok(lodge_api::db::events::insert_event(db, &new).await?)
}

/// Mint a member bearer token the way the login endpoint would.
pub fn member_token(member_id: Uuid, shared_secret: i64) -> String {
    let claims = Claims {
        sub: member_id.to_string(),
        role: Role::Member,
        exp: chrono::Utc::now().timestamp() + 3600,
    };
    auth::mint_token(&claims, shared_secret).unwrap()
}

/// Mint an admin bearer token for the seeded default admin.
pub fn admin_token(shared_secret: i64) -> String {
    let claims = Claims {
        sub: lodge_common::db::init::DEFAULT_ADMIN_EMAIL.to_string(),
        role: Role::Admin,
        exp: chrono::Utc::now().timestamp() + 3600,
    };
    auth::mint_token(&claims, shared_secret).unwrap()
}
