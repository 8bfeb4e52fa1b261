// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prometheus metrics for gate decisions.

use crate::gate::GateDecision;
use prometheus::{Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

/// Gate metrics in a private registry.
pub struct GateMetrics {
    registry: Registry,
    decisions: IntCounterVec,
    tracked_clients: IntGauge,
}

impl GateMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let decisions = IntCounterVec::new(
            Opts::new("token_gate_decisions_total", "Gate decisions by outcome"),
            &["outcome"],
        )?;
        let tracked_clients = IntGauge::new(
            "token_gate_tracked_clients",
            "Clients with failed-attempt records",
        )?;

        registry.register(Box::new(decisions.clone()))?;
        registry.register(Box::new(tracked_clients.clone()))?;

        Ok(Self {
            registry,
            decisions,
            tracked_clients,
        })
    }

    pub fn observe(&self, decision: &GateDecision) {
        self.decisions.with_label_values(&[decision.label()]).inc();
    }

    pub fn set_tracked_clients(&self, count: usize) {
        self.tracked_clients.set(count as i64);
    }

    pub fn decision_count(&self, outcome: &str) -> u64 {
        self.decisions.with_label_values(&[outcome]).get()
    }

    /// Render all metrics in the Prometheus text format.
    pub fn render(&self) -> prometheus::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| prometheus::Error::Msg(format!("metrics output is not UTF-8: {}", e)))
    }
}
