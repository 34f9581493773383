//! Settings table access
//!
//! Read/write settings from the settings table (key-value store). All
//! settings are system-wide; per-member state lives on the member rows.

use crate::{Error, Result};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;

/// Admin login material stored in settings
///
/// There is exactly one admin identity; it is not a member row.
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    pub email: String,
    pub password_hash: String,
    pub password_salt: String,
}

/// Session lifetime for minted tokens, in seconds
///
/// Falls back to one day and writes the default back if unset.
pub async fn get_session_lifetime(db: &Pool<Sqlite>) -> Result<i64> {
    match get_setting::<i64>(db, "session_lifetime_seconds").await? {
        Some(seconds) if seconds > 0 => Ok(seconds),
        _ => {
            set_setting(db, "session_lifetime_seconds", 86400).await?;
            Ok(86400)
        }
    }
}

/// Load the seeded admin credentials
///
/// Errors with `NotFound` when seeding has not run yet.
pub async fn load_admin_credentials(db: &Pool<Sqlite>) -> Result<AdminCredentials> {
    let email = get_setting::<String>(db, "admin_email")
        .await?
        .ok_or_else(|| Error::NotFound("admin_email setting".to_string()))?;
    let password_hash = get_setting::<String>(db, "admin_password_hash")
        .await?
        .ok_or_else(|| Error::NotFound("admin_password_hash setting".to_string()))?;
    let password_salt = get_setting::<String>(db, "admin_password_salt")
        .await?
        .ok_or_else(|| Error::NotFound("admin_password_salt setting".to_string()))?;

    Ok(AdminCredentials {
        email,
        password_hash,
        password_salt,
    })
}

/// Generic setting getter
///
/// Returns None if the key doesn't exist. Parses the stored string via
/// FromStr.
pub async fn get_setting<T: FromStr>(db: &Pool<Sqlite>, key: &str) -> Result<Option<T>> {
    let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(db)
        .await?;

    match value {
        Some(s) => match s.parse::<T>() {
            Ok(parsed) => Ok(Some(parsed)),
            Err(_) => Err(Error::Config(format!(
                "Failed to parse setting '{}' value: {}",
                key, s
            ))),
        },
        None => Ok(None),
    }
}

/// Generic setting setter (insert or update)
pub async fn set_setting<T: ToString>(db: &Pool<Sqlite>, key: &str, value: T) -> Result<()> {
    let value_str = value.to_string();

    sqlx::query(
        r#"
        INSERT INTO settings (key, value)
        VALUES (?, ?)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value
        "#,
    )
    .bind(key)
    .bind(value_str)
    .execute(db)
    .await?;

    Ok(())
}
