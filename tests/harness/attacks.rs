// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Guessing patterns for security testing.

use std::time::Duration;

/// Attack pattern configuration.
#[derive(Debug, Clone)]
pub struct AttackConfig {
    /// Total number of requests to send
    pub total_requests: usize,
    /// Requests per second rate (simulated clock)
    pub requests_per_second: f64,
    /// Number of distinct remote addresses
    pub unique_ips: usize,
    /// Number of distinct user-agent strings per address
    pub user_agents_per_ip: usize,
    /// Send the guess as `?token=` instead of a bearer header
    pub use_query: bool,
    /// Wait out the advertised `Retry-After` instead of hammering
    pub honor_retry_after: bool,
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            total_requests: 100,
            requests_per_second: 10.0,
            unique_ips: 1,
            user_agents_per_ip: 1,
            use_query: false,
            honor_retry_after: false,
        }
    }
}

/// Predefined attack patterns.
impl AttackConfig {
    /// One client guessing as fast as it can.
    pub fn single_client_flood() -> Self {
        Self {
            total_requests: 600,
            requests_per_second: 10.0,
            ..Default::default()
        }
    }

    /// One address cycling user-agents to get fresh buckets.
    pub fn user_agent_rotation() -> Self {
        Self {
            total_requests: 400,
            requests_per_second: 10.0,
            user_agents_per_ip: 20,
            ..Default::default()
        }
    }

    /// Many addresses, one guess stream each.
    pub fn distributed_guessing() -> Self {
        Self {
            total_requests: 500,
            requests_per_second: 50.0,
            unique_ips: 100,
            ..Default::default()
        }
    }

    /// Guesses through the query-string fallback.
    pub fn query_param_flood() -> Self {
        Self {
            total_requests: 300,
            requests_per_second: 10.0,
            use_query: true,
            ..Default::default()
        }
    }

    /// A patient guesser that sleeps exactly as long as told.
    pub fn patient_guesser() -> Self {
        Self {
            total_requests: 20,
            honor_retry_after: true,
            ..Default::default()
        }
    }

    /// Gap between consecutive requests.
    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.requests_per_second)
    }

    /// Number of distinct client fingerprints this pattern produces.
    pub fn unique_clients(&self) -> usize {
        self.unique_ips * self.user_agents_per_ip
    }
}

/// Upper bound on 401s one fingerprint can collect within `elapsed`.
///
/// Each recorded failure must wait out the previous delay, so the failure
/// timestamps are at least 0, 1, 3, 7, 15, 31, 63, 123, ... seconds.
pub fn max_failures_within(elapsed: Duration, base: Duration, max: Duration) -> usize {
    let mut at = Duration::ZERO;
    let mut failures = 0usize;
    while at <= elapsed {
        failures += 1;
        at += token_gate::limiter::backoff_delay(failures as u32, base, max);
    }
    failures
}
