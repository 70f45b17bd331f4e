//! # Bayon POS API Server
//!
//! HTTP boundary over the sale transaction engine.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        API Server                                       │
//! │                                                                         │
//! │  Register ───► HTTP (8080) ───► routes ───► bayon-db ledger ──► SQLite  │
//! │                                    │                                    │
//! │                                    ▼                                    │
//! │                              KHQR gateway                               │
//! │                            (status check)                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod dto;
mod error;
mod khqr;
mod routes;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;
use crate::khqr::KhqrClient;
use bayon_core::KhrPerUsd;
use bayon_db::{Database, DbConfig};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub default_rate: KhrPerUsd,
    /// Absent in development when no gateway is configured.
    pub khqr: Option<KhqrClient>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing (RUST_LOG overrides the default level)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting Bayon POS API server...");

    // Load configuration
    let config = ServerConfig::load()?;
    info!(
        bind = %config.bind_addr,
        db = %config.database_path,
        default_rate = %config.default_rate,
        "Configuration loaded"
    );

    // Connect to database (runs migrations)
    let db = Database::new(DbConfig::new(&config.database_path)).await?;
    info!("Connected to SQLite");

    // KHQR gateway is optional: without it, KHQR sales skip the status check
    let khqr = match &config.khqr_base_url {
        Some(url) => {
            info!(%url, "KHQR gateway configured");
            Some(KhqrClient::new(url.clone()))
        }
        None => {
            tracing::warn!("No KHQR gateway configured, KHQR sales will not be verified");
            None
        }
    };

    let state = AppState {
        db,
        default_rate: config.default_rate,
        khqr,
    };

    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %config.bind_addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
