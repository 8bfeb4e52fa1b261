// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Failed-authentication backoff tracker.
//!
//! Each client fingerprint gets an [`AttemptRecord`] on its first failure.
//! Every further failure inside the window doubles the required wait, up to a
//! ceiling:
//!
//! - delay(n) = min(base * 2^(n-1), max)
//! - history older than the window is treated as absent
//! - a periodic sweep physically removes expired records
//!
//! All request-path operations are synchronous and hold the lock for a single
//! map operation. `check_delay` followed by `record_failure` is not atomic, so
//! truly concurrent failures from one client may be undercounted. That only
//! ever makes the limiter more permissive.

use crate::config::RateLimitConfig;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Placeholder for a missing user-agent or remote address.
const UNKNOWN: &str = "unknown";

/// Failure history for one client.
#[derive(Debug, Clone, Copy)]
pub struct AttemptRecord {
    /// Consecutive failures since the last reset
    pub failure_count: u32,
    /// When the most recent failure was recorded
    pub last_attempt_at: Instant,
    /// Retries before this instant are rejected without evaluation
    pub delay_until: Instant,
}

impl AttemptRecord {
    fn is_expired(&self, now: Instant, window: Duration) -> bool {
        now.saturating_duration_since(self.last_attempt_at) >= window
    }
}

/// Backoff required after `failures` consecutive failures.
pub fn backoff_delay(failures: u32, base: Duration, max: Duration) -> Duration {
    if failures == 0 {
        return Duration::ZERO;
    }
    let factor = 1u32.checked_shl(failures - 1).unwrap_or(u32::MAX);
    base.checked_mul(factor).map_or(max, |delay| delay.min(max))
}

/// Thread-safe failed-attempt tracker.
pub struct RateLimiter {
    /// Configuration
    config: RateLimitConfig,
    /// Per-client failure records
    records: Mutex<HashMap<String, AttemptRecord>>,
    /// Periodic sweep task, if running
    cleanup_handle: Mutex<Option<JoinHandle<()>>>,
}

impl RateLimiter {
    /// Create a new rate limiter with the given configuration.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            records: Mutex::new(HashMap::new()),
            cleanup_handle: Mutex::new(None),
        }
    }

    /// Bucketing key for a client: remote address plus user-agent.
    ///
    /// Only used for abuse accounting, never for identity.
    pub fn client_id(remote_addr: Option<IpAddr>, user_agent: Option<&str>) -> String {
        let addr = remote_addr.map_or_else(|| UNKNOWN.to_string(), |ip| ip.to_string());
        format!("{}:{}", addr, user_agent.unwrap_or(UNKNOWN))
    }

    /// Backoff for the given failure count under this limiter's configuration.
    pub fn delay_for(&self, failures: u32) -> Duration {
        backoff_delay(failures, self.config.base_delay(), self.config.max_delay())
    }

    /// Seconds the client must still wait, rounded up. 0 means no active delay.
    ///
    /// An expired record is removed as a side effect.
    pub fn check_delay(&self, client_id: &str) -> u64 {
        let now = Instant::now();
        let mut records = self.records();

        let Some(record) = records.get(client_id) else {
            return 0;
        };

        if record.is_expired(now, self.config.window_duration()) {
            records.remove(client_id);
            debug!(client_id, "Attempt record expired");
            return 0;
        }

        ceil_secs(record.delay_until.saturating_duration_since(now))
    }

    /// Record a failed attempt and return the resulting failure count.
    ///
    /// An absent or expired record is replaced by a fresh one, so the expiry
    /// check always precedes the increment.
    pub fn record_failure(&self, client_id: &str) -> u32 {
        let now = Instant::now();
        let window = self.config.window_duration();
        let fresh = AttemptRecord {
            failure_count: 1,
            last_attempt_at: now,
            delay_until: now + self.delay_for(1),
        };

        let mut records = self.records();
        let record = records
            .entry(client_id.to_string())
            .and_modify(|record| {
                if record.is_expired(now, window) {
                    *record = fresh;
                } else {
                    record.failure_count = record.failure_count.saturating_add(1);
                    record.last_attempt_at = now;
                    record.delay_until = now + self.delay_for(record.failure_count);
                }
            })
            .or_insert(fresh);

        let failures = record.failure_count;
        let delay = record.delay_until.saturating_duration_since(now);
        drop(records);

        if delay >= self.config.max_delay() {
            warn!(
                client_id,
                failures,
                delay_ms = delay.as_millis() as u64,
                "Backoff at maximum delay"
            );
        } else {
            debug!(
                client_id,
                failures,
                delay_ms = delay.as_millis() as u64,
                "Recorded failed attempt"
            );
        }

        failures
    }

    /// Forget a client's failure history. No-op if there is none.
    pub fn clear_attempts(&self, client_id: &str) {
        if let Some(record) = self.records().remove(client_id) {
            debug!(client_id, failures = record.failure_count, "Cleared failed attempts");
        }
    }

    /// Current failure count, treating expired records as absent.
    pub fn failure_count(&self, client_id: &str) -> u32 {
        let now = Instant::now();
        let window = self.config.window_duration();
        self.records()
            .get(client_id)
            .filter(|record| !record.is_expired(now, window))
            .map_or(0, |record| record.failure_count)
    }

    /// Number of records currently held, expired or not.
    pub fn tracked_clients(&self) -> usize {
        self.records().len()
    }

    /// Remove expired records. Returns how many were dropped.
    pub fn cleanup_stale(&self) -> usize {
        let now = Instant::now();
        let window = self.config.window_duration();

        let mut records = self.records();
        let before = records.len();
        records.retain(|_, record| !record.is_expired(now, window));
        let removed = before - records.len();

        if removed > 0 {
            debug!(removed, remaining = records.len(), "Removed stale attempt records");
        }
        removed
    }

    /// Spawn the periodic sweep on the current tokio runtime.
    ///
    /// The task only holds a weak reference, so it also ends once the last
    /// `Arc` to the limiter is gone. Calling this again replaces the task.
    pub fn start_cleanup(self: &Arc<Self>) {
        let limiter = Arc::downgrade(self);
        let period = self.config.cleanup_interval();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            interval.tick().await;

            loop {
                interval.tick().await;
                let Some(limiter) = limiter.upgrade() else {
                    break;
                };
                limiter.cleanup_stale();
            }
        });

        if let Some(previous) = self.cleanup_handle().replace(handle) {
            previous.abort();
        }
        info!(interval_secs = period.as_secs(), "Started attempt record cleanup");
    }

    /// Stop the periodic sweep.
    pub fn stop(&self) {
        if let Some(handle) = self.cleanup_handle().take() {
            handle.abort();
            info!("Stopped attempt record cleanup");
        }
    }

    pub fn is_cleanup_running(&self) -> bool {
        self.cleanup_handle()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    fn records(&self) -> MutexGuard<'_, HashMap<String, AttemptRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cleanup_handle(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.cleanup_handle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for RateLimiter {
    fn drop(&mut self) {
        let handle = self
            .cleanup_handle
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }
    }
}

fn ceil_secs(duration: Duration) -> u64 {
    duration.as_secs() + u64::from(duration.subsec_nanos() > 0)
}
