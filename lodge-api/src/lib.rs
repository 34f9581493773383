//! lodge-api library interface
//!
//! Exposes the router, state and workflow for the binary and for
//! integration tests.

pub mod api;
pub mod db;
pub mod error;
pub mod workflow;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::path::PathBuf;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Token-signing secret, loaded from the settings table at startup
    pub shared_secret: i64,
    /// Directory receipt uploads are written to
    pub receipts_dir: PathBuf,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, shared_secret: i64, receipts_dir: PathBuf) -> Self {
        Self {
            db,
            shared_secret,
            receipts_dir,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let receipt_files = ServeDir::new(&state.receipts_dir);

    Router::new()
        .merge(api::auth_routes())
        .merge(api::member_routes())
        .merge(api::event_routes())
        .merge(api::payment_routes())
        .merge(api::receipt_routes())
        .merge(api::health_routes())
        .nest_service("/receipts/files", receipt_files)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
