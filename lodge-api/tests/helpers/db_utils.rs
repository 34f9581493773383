//! Database test utilities

use anyhow::Result;
use lodge_api::AppState;
use sqlx::SqlitePool;
use tempfile::TempDir;

/// Create a temporary file-backed test database with the full schema and
/// seeded defaults.
///
/// Returns (TempDir, SqlitePool) - TempDir must be kept alive for the
/// duration of the test. File-backed rather than in-memory: a pooled
/// `:memory:` database is per-connection, so multi-task tests would each
/// see their own empty database.
pub async fn create_test_db() -> Result<(TempDir, SqlitePool)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test_lodge.db");
    let pool = lodge_common::db::init::init_database(&db_path).await?;
    Ok((temp_dir, pool))
}

/// Create application state backed by a temporary database and receipts
/// directory, the way `main.rs` assembles it.
pub async fn create_test_state() -> Result<(TempDir, AppState)> {
    let (temp_dir, pool) = create_test_db().await?;
    let shared_secret = lodge_common::auth::load_shared_secret(&pool).await?;
    let receipts_dir = temp_dir.path().join("receipts");
    std::fs::create_dir_all(&receipts_dir)?;
    Ok((temp_dir, AppState::new(pool, shared_secret, receipts_dir)))
}
