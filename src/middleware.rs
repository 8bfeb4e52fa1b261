// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! axum adapter for the gate.
//!
//! Registered with `middleware::from_fn_with_state` on the whole router, so it
//! also sees fallback (not-found) requests. Those carry no `MatchedPath`.

use crate::gate::{GateDecision, RequestContext};
use crate::handlers::AppState;
use axum::{
    extract::{ConnectInfo, MatchedPath, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

/// Build the typed context the gate evaluates.
pub fn request_context(request: &Request) -> RequestContext {
    let headers = request
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect();

    let query: HashMap<String, String> = request
        .uri()
        .query()
        .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default();

    RequestContext {
        method: request.method().to_string(),
        path: request.uri().path().to_string(),
        headers,
        query,
        remote_addr: request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip()),
        not_found: request.extensions().get::<MatchedPath>().is_none(),
    }
}

/// Run the gate before any handler.
pub async fn auth_gate(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let ctx = request_context(&request);
    let decision = state.gate.evaluate(&ctx);

    if let Some(metrics) = &state.metrics {
        metrics.observe(&decision);
    }

    match decision {
        GateDecision::Allow(_) => next.run(request).await,
        GateDecision::Reject(rejection) => rejection.into_response(),
    }
}
