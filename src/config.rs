// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the token gate.
//!
//! Values come from environment variables (see [`Config::from_env`]) and are
//! validated before the server starts. A token that is set but too short is a
//! startup error, never a weaker gate.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Minimum accepted length of the shared secret, in characters.
pub const MIN_TOKEN_LENGTH: usize = 32;

/// Configuration for the token gate service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 127.0.0.1:4173)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,

    /// Failure backoff configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Which requests are protected and by what secret.
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Shared secret. `None` disables the gate entirely.
    #[serde(default)]
    pub token: Option<String>,

    /// Paths under this prefix require the token (default: /api)
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// Health check path, always exempt (default: /api/health)
    #[serde(default = "default_health_path")]
    pub health_path: String,
}

/// Backoff parameters for failed authentication attempts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Delay after the first failure in milliseconds (default: 1000)
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Upper bound on the delay in milliseconds (default: 60000).
    /// Must not exceed the window, or records would expire mid-delay.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Failure history is forgotten after this many seconds (default: 900)
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Interval between stale-record sweeps in seconds (default: 300)
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint path (default: /metrics)
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

// Default value functions
fn default_bind_addr() -> String {
    "127.0.0.1:4173".to_string()
}

fn default_api_prefix() -> String {
    "/api".to_string()
}

fn default_health_path() -> String {
    "/api/health".to_string()
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    60_000
}

fn default_window_secs() -> u64 {
    15 * 60
}

fn default_cleanup_interval_secs() -> u64 {
    5 * 60
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            auth: AuthConfig::default(),
            rate_limit: RateLimitConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_prefix: default_api_prefix(),
            health_path: default_health_path(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            window_secs: default_window_secs(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_metrics_path(),
        }
    }
}

// The token must never end up in logs.
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("api_prefix", &self.api_prefix)
            .field("health_path", &self.health_path)
            .finish()
    }
}

impl AuthConfig {
    /// Whether requests under the API prefix must carry the token.
    pub fn is_enabled(&self) -> bool {
        self.token.is_some()
    }

    /// Path of the auth probe endpoint under the API prefix.
    pub fn auth_check_path(&self) -> String {
        format!("{}/auth/check", self.api_prefix.trim_end_matches('/'))
    }
}

impl RateLimitConfig {
    /// Get the delay applied after the first failure
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    /// Get the delay ceiling
    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    /// Get the failure history window
    pub fn window_duration(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    /// Get the sweep interval
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }
}

impl Config {
    /// Load configuration from environment variables and validate it.
    ///
    /// - `BIND_ADDR`: Server bind address (default: 127.0.0.1:4173)
    /// - `AUTH_TOKEN`: Shared secret; unset or empty disables authentication
    /// - `API_PREFIX` / `HEALTH_PATH`: Protected prefix and exempt health path
    /// - `BASE_DELAY_MS`, `MAX_DELAY_MS`, `WINDOW_SECS`, `CLEANUP_INTERVAL_SECS`
    /// - `METRICS_ENABLED`: `true` or `false` (default: true)
    /// - `METRICS_PATH`: Metrics endpoint path (default: /metrics)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let config = Config {
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            auth: AuthConfig {
                token: lookup("AUTH_TOKEN").filter(|t| !t.is_empty()),
                api_prefix: lookup("API_PREFIX").unwrap_or(defaults.auth.api_prefix),
                health_path: lookup("HEALTH_PATH").unwrap_or(defaults.auth.health_path),
            },
            rate_limit: RateLimitConfig {
                base_delay_ms: parse_or(
                    &lookup,
                    "BASE_DELAY_MS",
                    defaults.rate_limit.base_delay_ms,
                )?,
                max_delay_ms: parse_or(&lookup, "MAX_DELAY_MS", defaults.rate_limit.max_delay_ms)?,
                window_secs: parse_or(&lookup, "WINDOW_SECS", defaults.rate_limit.window_secs)?,
                cleanup_interval_secs: parse_or(
                    &lookup,
                    "CLEANUP_INTERVAL_SECS",
                    defaults.rate_limit.cleanup_interval_secs,
                )?,
            },
            metrics: MetricsConfig {
                enabled: parse_or(&lookup, "METRICS_ENABLED", defaults.metrics.enabled)?,
                path: lookup("METRICS_PATH").unwrap_or(defaults.metrics.path),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would weaken the gate.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(token) = &self.auth.token {
            let actual = token.chars().count();
            if actual < MIN_TOKEN_LENGTH {
                return Err(ConfigError::TokenTooShort {
                    min: MIN_TOKEN_LENGTH,
                    actual,
                });
            }
        }

        for (key, path) in [
            ("API_PREFIX", &self.auth.api_prefix),
            ("HEALTH_PATH", &self.auth.health_path),
            ("METRICS_PATH", &self.metrics.path),
        ] {
            if !path.starts_with('/') {
                return Err(ConfigError::InvalidValue {
                    key,
                    value: path.clone(),
                });
            }
        }

        let mut routes = vec![self.auth.health_path.clone(), self.auth.auth_check_path()];
        if self.metrics.enabled {
            routes.push(self.metrics.path.clone());
        }
        for (i, path) in routes.iter().enumerate() {
            if routes[..i].contains(path) {
                return Err(ConfigError::RouteConflict { path: path.clone() });
            }
        }

        if self.rate_limit.cleanup_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "CLEANUP_INTERVAL_SECS",
                value: "0".to_string(),
            });
        }

        if self.rate_limit.max_delay() > self.rate_limit.window_duration() {
            return Err(ConfigError::DelayExceedsWindow {
                max_delay_ms: self.rate_limit.max_delay_ms,
                window_secs: self.rate_limit.window_secs,
            });
        }

        Ok(())
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        None => Ok(default),
    }
}
