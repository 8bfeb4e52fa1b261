// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Metrics collection for guessing simulation results.

use std::collections::HashMap;
use std::time::Duration;

/// Collects metrics during an attack simulation.
#[derive(Debug, Default)]
pub struct AttackMetrics {
    /// Simulated time covered by the attack
    elapsed: Duration,
    /// Count of requests by outcome
    outcomes: HashMap<Outcome, usize>,
    /// Count of requests by client fingerprint
    requests_per_client: HashMap<String, usize>,
    /// 401s by client fingerprint
    failures_per_client: HashMap<String, usize>,
    /// Largest Retry-After seen, in seconds
    max_retry_after: u64,
}

/// Possible outcomes for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Allowed,
    Unauthorized,
    RateLimited,
}

impl AttackMetrics {
    /// Create a new metrics collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a request outcome.
    pub fn record(&mut self, outcome: Outcome, client: &str, retry_after: Option<u64>) {
        *self.outcomes.entry(outcome).or_insert(0) += 1;
        *self.requests_per_client.entry(client.to_string()).or_insert(0) += 1;
        if outcome == Outcome::Unauthorized {
            *self.failures_per_client.entry(client.to_string()).or_insert(0) += 1;
        }
        if let Some(secs) = retry_after {
            self.max_retry_after = self.max_retry_after.max(secs);
        }
    }

    /// Add simulated time.
    pub fn advance(&mut self, by: Duration) {
        self.elapsed += by;
    }

    /// Get total request count.
    pub fn total_requests(&self) -> usize {
        self.outcomes.values().sum()
    }

    /// Get count for a specific outcome.
    pub fn count(&self, outcome: Outcome) -> usize {
        self.outcomes.get(&outcome).copied().unwrap_or(0)
    }

    /// Get block rate (ratio of rate-limited to total).
    pub fn block_rate(&self) -> f64 {
        let total = self.total_requests();
        if total == 0 {
            return 0.0;
        }
        self.count(Outcome::RateLimited) as f64 / total as f64
    }

    /// Most 401s any single fingerprint received.
    pub fn max_failures_per_client(&self) -> usize {
        self.failures_per_client.values().copied().max().unwrap_or(0)
    }

    /// Generate a summary report.
    pub fn report(&self) -> MetricsReport {
        MetricsReport {
            total_requests: self.total_requests(),
            allowed: self.count(Outcome::Allowed),
            unauthorized: self.count(Outcome::Unauthorized),
            rate_limited: self.count(Outcome::RateLimited),
            elapsed_secs: self.elapsed.as_secs_f64(),
            block_rate: self.block_rate(),
            unique_clients: self.requests_per_client.len(),
            max_failures_per_client: self.max_failures_per_client(),
            max_retry_after: self.max_retry_after,
        }
    }
}

/// Summary report of attack metrics.
#[derive(Debug, Clone)]
pub struct MetricsReport {
    pub total_requests: usize,
    pub allowed: usize,
    pub unauthorized: usize,
    pub rate_limited: usize,
    pub elapsed_secs: f64,
    pub block_rate: f64,
    pub unique_clients: usize,
    pub max_failures_per_client: usize,
    pub max_retry_after: u64,
}

impl std::fmt::Display for MetricsReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Guessing Attack Report ===")?;
        writeln!(f, "Simulated time:    {:.1} s", self.elapsed_secs)?;
        writeln!(f, "Total Requests:    {}", self.total_requests)?;
        writeln!(f)?;
        writeln!(f, "--- Outcomes ---")?;
        writeln!(f, "Allowed:           {}", self.allowed)?;
        writeln!(f, "Unauthorized:      {}", self.unauthorized)?;
        writeln!(f, "Rate Limited:      {}", self.rate_limited)?;
        writeln!(f, "Block Rate:        {:.1}%", self.block_rate * 100.0)?;
        writeln!(f, "Max Retry-After:   {} s", self.max_retry_after)?;
        writeln!(f)?;
        writeln!(f, "--- Distribution ---")?;
        writeln!(f, "Unique Clients:    {}", self.unique_clients)?;
        writeln!(f, "Max 401s/client:   {}", self.max_failures_per_client)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_collection() {
        let mut metrics = AttackMetrics::new();
        metrics.record(Outcome::Unauthorized, "a", None);
        metrics.record(Outcome::RateLimited, "a", Some(2));
        metrics.record(Outcome::Unauthorized, "b", None);
        metrics.record(Outcome::Unauthorized, "a", None);

        assert_eq!(metrics.total_requests(), 4);
        assert_eq!(metrics.count(Outcome::Unauthorized), 3);
        assert_eq!(metrics.max_failures_per_client(), 2);
        assert_eq!(metrics.report().unique_clients, 2);
        assert_eq!(metrics.report().max_retry_after, 2);
    }

    #[test]
    fn test_block_rate() {
        let mut metrics = AttackMetrics::new();
        for _ in 0..3 {
            metrics.record(Outcome::Unauthorized, "a", None);
        }
        for _ in 0..7 {
            metrics.record(Outcome::RateLimited, "a", Some(1));
        }

        assert!((metrics.block_rate() - 0.7).abs() < 0.01);
    }
}
