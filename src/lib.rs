// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Token Gate
//!
//! Shared-secret authentication for a local API server, with exponential
//! backoff against online token guessing:
//!
//! - Optional token; without one the gate is disabled and says so
//! - `Authorization: Bearer` header, `?token=` query fallback
//! - Constant-time comparison that does not leak the token length
//! - Per-client backoff of 1s, 2s, 4s ... capped at 60s, forgotten after 15 min
//! - Health check, not-found, and non-API paths are exempt

pub mod compare;
pub mod config;
pub mod error;
pub mod gate;
pub mod handlers;
pub mod limiter;
pub mod metrics;
pub mod middleware;

pub use config::Config;
pub use error::{AuthRejection, ConfigError};
pub use gate::{AllowReason, AuthGate, GateDecision, RequestContext};
pub use limiter::{AttemptRecord, RateLimiter};
