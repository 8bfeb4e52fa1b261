// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Token Gate Service
//!
//! Serves the gate-owned endpoints behind the shared-secret gate:
//!
//! - `GET /api/health`: always open, reports `auth_required`
//! - `GET /api/auth/check`: succeeds only with a valid token
//! - `GET /metrics`: Prometheus metrics
//!
//! ## Configuration
//!
//! - `BIND_ADDR`: Server bind address (default: 127.0.0.1:4173)
//! - `AUTH_TOKEN`: Shared secret, at least 32 characters; unset disables auth
//! - `API_PREFIX`: Protected path prefix (default: /api)
//! - `HEALTH_PATH`: Exempt health check path (default: /api/health)
//! - `BASE_DELAY_MS`: Delay after the first failure (default: 1000)
//! - `MAX_DELAY_MS`: Delay ceiling, at most the window (default: 60000)
//! - `WINDOW_SECS`: Failure history lifetime (default: 900)
//! - `CLEANUP_INTERVAL_SECS`: Stale record sweep interval (default: 300)
//! - `METRICS_ENABLED`: Serve Prometheus metrics (default: true)
//! - `METRICS_PATH`: Metrics endpoint path (default: /metrics)

use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use token_gate::{config::Config, handlers::{self, AppState}};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Misconfiguration aborts startup
    let config = Config::from_env()?;
    info!(
        bind_addr = %config.bind_addr,
        auth_required = config.auth.is_enabled(),
        base_delay_ms = config.rate_limit.base_delay_ms,
        max_delay_ms = config.rate_limit.max_delay_ms,
        window_secs = config.rate_limit.window_secs,
        "Starting token gate"
    );
    if !config.auth.is_enabled() {
        warn!("AUTH_TOKEN not set, API requests are not authenticated");
    }

    let state = Arc::new(AppState::from_config(config)?);
    state.gate.limiter().start_cleanup();

    let app = handlers::router(state.clone(), Router::new());

    // Start server
    let addr: SocketAddr = state.config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    state.gate.limiter().stop();
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
