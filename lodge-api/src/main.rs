//! Lodge membership service (lodge-api) - Main entry point
//!
//! Registers members, tracks zones and membership tiers, records events and
//! attendance, and reconciles the payments that drive tier upgrades.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lodge_api::{build_router, AppState};
use lodge_common::config;
use lodge_common::db::init::init_database;

/// Command-line arguments for lodge-api
#[derive(Parser, Debug)]
#[command(name = "lodge-api")]
#[command(about = "Membership management backend for Lodge")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5750", env = "LODGE_PORT")]
    port: u16,

    /// Data folder holding the database and receipt uploads
    /// (falls back to LODGE_DATA_DIR, then the config file, then the OS
    /// default data directory)
    #[arg(short, long)]
    data_dir: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lodge_api=debug,lodge_common=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse command-line arguments
    let args = Args::parse();

    info!("Starting Lodge membership service on port {}", args.port);

    let data_dir = config::resolve_data_dir(args.data_dir.as_deref())
        .context("Failed to resolve data directory")?;
    info!("Data directory: {}", data_dir.display());

    // Initialize database (creates schema and seeds defaults on first run)
    let db_path = data_dir.join("lodge.db");
    let db = init_database(&db_path)
        .await
        .context("Failed to initialize database")?;
    info!("Database ready at {}", db_path.display());

    let shared_secret = lodge_common::auth::load_shared_secret(&db)
        .await
        .context("Failed to load token-signing secret")?;

    // Receipts directory for uploaded payment evidence
    let receipts_dir = data_dir.join("receipts");
    tokio::fs::create_dir_all(&receipts_dir)
        .await
        .context("Failed to create receipts directory")?;

    // Build the application router
    let app_state = AppState::new(db, shared_secret, receipts_dir);
    let app = build_router(app_state);

    // Create socket address
    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));

    info!("Starting HTTP server on {}", addr);

    // Create and run the server
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
