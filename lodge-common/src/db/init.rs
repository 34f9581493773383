//! Database initialization
//!
//! Creates the SQLite database on first run and brings the schema up
//! idempotently on every start. Business-rule uniqueness (one pending
//! upgrade per member, one live event payment per member and event) is
//! enforced here with partial unique indexes so concurrent submissions
//! cannot slip past the application-level checks.

use crate::auth;
use crate::db::settings::set_setting;
use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::{info, warn};

/// Default admin login seeded on first run
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@lodge.local";
const DEFAULT_ADMIN_PASSWORD: &str = "change-me-now";

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL allows concurrent readers while one writer holds the lock
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    // Writers wait instead of failing immediately on a locked database
    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_schema(&pool).await?;
    seed_defaults(&pool).await?;

    Ok(pool)
}

/// Create all tables and indexes (idempotent, safe to call repeatedly)
///
/// Exposed separately from [`init_database`] so tests can build the schema
/// on an in-memory pool.
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_settings_table(pool).await?;
    create_members_table(pool).await?;
    create_events_table(pool).await?;
    create_payments_table(pool).await?;
    create_attendees_table(pool).await?;
    Ok(())
}

/// Seed settings and the admin account; mint the token secret
pub async fn seed_defaults(pool: &SqlitePool) -> Result<()> {
    ensure_setting(pool, "session_lifetime_seconds", "86400").await?;
    ensure_setting(pool, "admin_email", DEFAULT_ADMIN_EMAIL).await?;
    seed_admin_password(pool).await?;

    auth::load_shared_secret(pool)
        .await
        .map_err(|e| crate::Error::Internal(e.to_string()))?;

    info!("Default settings initialized");
    Ok(())
}

/// Create the settings table
///
/// Stores application configuration key-value pairs.
pub async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the members table
///
/// One row per registered member. `tier` is only ever changed by upgrade
/// settlement; `status` gates both login and event eligibility.
pub async fn create_members_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS members (
            guid TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            password_salt TEXT NOT NULL,
            zone TEXT NOT NULL CHECK (zone IN ('North', 'South', 'East', 'West', 'Central')),
            tier TEXT NOT NULL DEFAULT 'Bronze' CHECK (tier IN ('Bronze', 'Silver', 'Gold', 'Platinum')),
            status TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'disabled')),
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_members_zone ON members(zone)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the events table
///
/// `zones` and `tiers_allowed` are JSON arrays of enum names; eligibility
/// is evaluated in code, not in SQL.
pub async fn create_events_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS events (
            guid TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            location TEXT NOT NULL,
            zones TEXT NOT NULL,
            tiers_allowed TEXT NOT NULL,
            fee INTEGER NOT NULL DEFAULT 0,
            status TEXT NOT NULL DEFAULT 'upcoming' CHECK (status IN ('upcoming', 'completed', 'cancelled')),
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            CHECK (fee >= 0)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_events_status ON events(status)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the payments table
///
/// Timestamps are written by code as RFC 3339 so settlement ordering
/// survives round-trips. The two partial unique indexes back the ledger
/// invariants: one pending upgrade per member, one non-rejected fee payment
/// per member and event.
pub async fn create_payments_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS payments (
            guid TEXT PRIMARY KEY,
            member_id TEXT NOT NULL REFERENCES members(guid) ON DELETE CASCADE,
            kind TEXT NOT NULL CHECK (kind IN ('membership_upgrade', 'event_fee')),
            event_id TEXT REFERENCES events(guid) ON DELETE CASCADE,
            amount INTEGER NOT NULL CHECK (amount > 0),
            mode TEXT NOT NULL CHECK (mode IN ('cash', 'upi', 'online', 'bank')),
            receipt_url TEXT,
            status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'settled', 'rejected')),
            rejection_reason TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            CHECK ((kind = 'event_fee' AND event_id IS NOT NULL)
                OR (kind = 'membership_upgrade' AND event_id IS NULL))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_payments_member ON payments(member_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_payments_status ON payments(status)")
        .execute(pool)
        .await?;

    // At most one pending upgrade payment per member
    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_payments_one_pending_upgrade
            ON payments(member_id)
            WHERE kind = 'membership_upgrade' AND status = 'pending'
        "#,
    )
    .execute(pool)
    .await?;

    // At most one non-rejected fee payment per member and event
    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_payments_one_live_event_fee
            ON payments(member_id, event_id)
            WHERE kind = 'event_fee' AND status <> 'rejected'
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the attendees table
///
/// The composite primary key makes duplicate admission impossible even
/// under concurrent marking.
pub async fn create_attendees_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS attendees (
            event_id TEXT NOT NULL REFERENCES events(guid) ON DELETE CASCADE,
            member_id TEXT NOT NULL REFERENCES members(guid) ON DELETE CASCADE,
            payment_id TEXT REFERENCES payments(guid),
            marked_at TEXT NOT NULL,
            PRIMARY KEY (event_id, member_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_attendees_member ON attendees(member_id)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Ensure a setting exists with the specified default value
///
/// If the setting doesn't exist, it is created with the default. If it
/// exists but holds NULL, it is reset to the default.
pub async fn ensure_setting(pool: &SqlitePool, key: &str, default_value: &str) -> Result<()> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM settings WHERE key = ?)")
        .bind(key)
        .fetch_one(pool)
        .await?;

    if !exists {
        // INSERT OR IGNORE so concurrent startups cannot race each other
        sqlx::query("INSERT OR IGNORE INTO settings (key, value) VALUES (?, ?)")
            .bind(key)
            .bind(default_value)
            .execute(pool)
            .await?;

        info!("Initialized setting '{}' with default value: {}", key, default_value);
        return Ok(());
    }

    let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_one(pool)
        .await?;

    if value.is_none() {
        sqlx::query("UPDATE settings SET value = ? WHERE key = ?")
            .bind(default_value)
            .bind(key)
            .execute(pool)
            .await?;

        warn!("Setting '{}' was NULL, reset to default: {}", key, default_value);
    }

    Ok(())
}

/// Seed the admin password hash on first run
///
/// The password itself is never stored; only the salted hash is. Warns
/// loudly while the compiled-in default is still in effect.
async fn seed_admin_password(pool: &SqlitePool) -> Result<()> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM settings WHERE key = 'admin_password_hash')",
    )
    .fetch_one(pool)
    .await?;

    if !exists {
        let salt = auth::generate_salt();
        let hash = auth::hash_password(DEFAULT_ADMIN_PASSWORD, &salt);
        set_setting(pool, "admin_password_salt", salt).await?;
        set_setting(pool, "admin_password_hash", hash).await?;
        warn!(
            "Seeded default admin credentials for {}; change the password before exposing this service",
            DEFAULT_ADMIN_EMAIL
        );
    }

    Ok(())
}
