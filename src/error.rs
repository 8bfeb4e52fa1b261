// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Error types for the token gate.
//!
//! [`AuthRejection`] is the per-request outcome and always becomes a JSON
//! response; it never escapes into application handlers. [`ConfigError`] is
//! the only error allowed to abort startup.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Startup configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("AUTH_TOKEN must be at least {min} characters, got {actual}")]
    TokenTooShort { min: usize, actual: usize },

    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Route {path} is configured for more than one endpoint")]
    RouteConflict { path: String },

    #[error("MAX_DELAY_MS ({max_delay_ms}) must not exceed WINDOW_SECS ({window_secs}s)")]
    DelayExceedsWindow { max_delay_ms: u64, window_secs: u64 },
}

/// Why a request was turned away by the gate.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    /// No valid credential and no active backoff
    #[error("Missing or invalid authorization")]
    Unauthorized,

    /// Credential rejected while a backoff delay is still running
    #[error("Too many failed attempts. Retry in {retry_after} seconds.")]
    RateLimited { retry_after: u64 },
}

/// Error response body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: &'static str,
    pub message: String,
    pub status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

impl AuthRejection {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    /// Response body for this rejection.
    pub fn body(&self) -> ErrorResponse {
        let status = self.status();
        ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error"),
            message: self.to_string(),
            status_code: status.as_u16(),
            retry_after: match self {
                Self::Unauthorized => None,
                Self::RateLimited { retry_after } => Some(*retry_after),
            },
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let mut response = (self.status(), Json(self.body())).into_response();
        if let Self::RateLimited { retry_after } = self {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
        }
        response
    }
}
