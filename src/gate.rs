// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Per-request authentication decision.
//!
//! The gate is transport-agnostic: it looks only at a [`RequestContext`] and
//! returns a [`GateDecision`]. The axum adapter lives in
//! [`crate::middleware`].

use crate::compare::Secret;
use crate::config::AuthConfig;
use crate::error::AuthRejection;
use crate::limiter::RateLimiter;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, info};

/// Query parameter carrying the token for transports that cannot set headers.
pub const TOKEN_QUERY_PARAM: &str = "token";

/// Typed view of an incoming request.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub method: String,
    pub path: String,
    /// Header names are stored lowercase.
    pub headers: HashMap<String, String>,
    pub query: HashMap<String, String>,
    pub remote_addr: Option<IpAddr>,
    /// No route matched this request.
    pub not_found: bool,
}

impl RequestContext {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    pub fn with_remote_addr(mut self, addr: IpAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    pub fn with_not_found(mut self, not_found: bool) -> Self {
        self.not_found = not_found;
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// Token from `Authorization: Bearer <token>`, if well formed.
    pub fn bearer_token(&self) -> Option<&str> {
        let value = self.header("authorization")?;
        let (scheme, token) = value.trim().split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("bearer") {
            return None;
        }
        let token = token.trim();
        (!token.is_empty()).then_some(token)
    }

    pub fn query_token(&self) -> Option<&str> {
        self.query
            .get(TOKEN_QUERY_PARAM)
            .map(String::as_str)
            .filter(|token| !token.is_empty())
    }
}

/// Why a request was let through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowReason {
    /// No token configured
    Disabled,
    /// Health check, not-found, or outside the API prefix
    Exempt,
    /// Valid credential presented
    Authenticated,
}

/// Outcome of evaluating one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allow(AllowReason),
    Reject(AuthRejection),
}

impl GateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GateDecision::Allow(_))
    }

    /// Short label used for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Allow(AllowReason::Disabled) => "disabled",
            Self::Allow(AllowReason::Exempt) => "exempt",
            Self::Allow(AllowReason::Authenticated) => "authenticated",
            Self::Reject(AuthRejection::Unauthorized) => "unauthorized",
            Self::Reject(AuthRejection::RateLimited { .. }) => "rate_limited",
        }
    }
}

/// Shared-secret gate in front of the API routes.
pub struct AuthGate {
    secret: Option<Secret>,
    api_prefix: String,
    health_path: String,
    limiter: Arc<RateLimiter>,
}

impl AuthGate {
    /// Build the gate from validated configuration and the server's limiter.
    pub fn new(config: &AuthConfig, limiter: Arc<RateLimiter>) -> Self {
        Self {
            secret: config.token.as_deref().map(Secret::new),
            api_prefix: config.api_prefix.trim_end_matches('/').to_string(),
            health_path: config.health_path.clone(),
            limiter,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.secret.is_some()
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Requests that skip authentication even when a token is configured.
    pub fn is_exempt(&self, ctx: &RequestContext) -> bool {
        ctx.not_found || ctx.path == self.health_path || !self.is_protected_path(&ctx.path)
    }

    fn is_protected_path(&self, path: &str) -> bool {
        if self.api_prefix.is_empty() {
            return true;
        }
        match path.strip_prefix(&self.api_prefix) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }

    /// Decide whether the request may proceed.
    ///
    /// Calls `clear_attempts` on success and `record_failure` only when no
    /// backoff is active, so each request touches the limiter at most once for
    /// writing.
    pub fn evaluate(&self, ctx: &RequestContext) -> GateDecision {
        let Some(secret) = &self.secret else {
            return GateDecision::Allow(AllowReason::Disabled);
        };

        if self.is_exempt(ctx) {
            return GateDecision::Allow(AllowReason::Exempt);
        }

        let client_id = RateLimiter::client_id(ctx.remote_addr, ctx.header("user-agent"));

        if has_valid_credential(secret, ctx) {
            self.limiter.clear_attempts(&client_id);
            debug!(client_id = %client_id, path = %ctx.path, "Request authenticated");
            return GateDecision::Allow(AllowReason::Authenticated);
        }

        let retry_after = self.limiter.check_delay(&client_id);
        if retry_after > 0 {
            info!(
                client_id = %client_id,
                path = %ctx.path,
                retry_after_secs = retry_after,
                "Rejected during backoff"
            );
            return GateDecision::Reject(AuthRejection::RateLimited { retry_after });
        }

        let failures = self.limiter.record_failure(&client_id);
        info!(
            client_id = %client_id,
            method = %ctx.method,
            path = %ctx.path,
            failures,
            "Authentication failed"
        );
        GateDecision::Reject(AuthRejection::Unauthorized)
    }
}

// Header first, then query; an invalid header does not hide a valid query token.
fn has_valid_credential(secret: &Secret, ctx: &RequestContext) -> bool {
    if ctx.bearer_token().is_some_and(|token| secret.matches(token)) {
        return true;
    }
    ctx.query_token().is_some_and(|token| secret.matches(token))
}
