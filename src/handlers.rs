// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers and router assembly.
//!
//! The application's own API routes are mounted by the host; this module
//! provides the gate-owned endpoints (health, auth probe, metrics) and wires
//! the gate in front of everything.

use crate::config::Config;
use crate::gate::AuthGate;
use crate::limiter::RateLimiter;
use crate::metrics::GateMetrics;
use crate::middleware::auth_gate;
use axum::{
    extract::State,
    http::{header, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::error;

/// Shared application state.
pub struct AppState {
    pub gate: AuthGate,
    pub metrics: Option<GateMetrics>,
    pub config: Config,
}

impl AppState {
    /// Construct the limiter, then the gate around it, then metrics.
    pub fn from_config(config: Config) -> prometheus::Result<Self> {
        let limiter = Arc::new(RateLimiter::new(config.rate_limit.clone()));
        let gate = AuthGate::new(&config.auth, limiter);
        let metrics = if config.metrics.enabled {
            Some(GateMetrics::new()?)
        } else {
            None
        };

        Ok(Self {
            gate,
            metrics,
            config,
        })
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub auth_required: bool,
}

/// Auth probe response.
#[derive(Debug, Serialize)]
pub struct AuthCheckResponse {
    pub authenticated: bool,
    pub auth_required: bool,
}

/// Body for unmatched routes.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotFoundResponse {
    pub error: &'static str,
    pub message: &'static str,
    pub status_code: u16,
}

/// Health check endpoint. Reports whether the API requires a token.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "token-gate",
        version: env!("CARGO_PKG_VERSION"),
        auth_required: state.gate.is_enabled(),
    })
}

/// Only reachable once the gate has let the request through.
pub async fn auth_check(State(state): State<Arc<AppState>>) -> Json<AuthCheckResponse> {
    Json(AuthCheckResponse {
        authenticated: true,
        auth_required: state.gate.is_enabled(),
    })
}

/// Prometheus scrape endpoint.
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    let Some(metrics) = &state.metrics else {
        return StatusCode::NOT_FOUND.into_response();
    };

    metrics.set_tracked_clients(state.gate.limiter().tracked_clients());
    match metrics.render() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to render metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn not_found() -> (StatusCode, Json<NotFoundResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(NotFoundResponse {
            error: "Not Found",
            message: "Route not found",
            status_code: 404,
        }),
    )
}

/// Build the router with the gate in front of every route.
///
/// `api` holds the host application's routes; paths under the configured
/// prefix are protected, anything else is served unauthenticated.
pub fn router(state: Arc<AppState>, api: Router<Arc<AppState>>) -> Router {
    let mut router = Router::new()
        .route(&state.config.auth.health_path, get(health))
        .route(&state.config.auth.auth_check_path(), get(auth_check))
        .merge(api);

    if state.metrics.is_some() {
        router = router.route(&state.config.metrics.path, get(metrics));
    }

    router
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), auth_gate))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
