// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Test harness for token guessing simulation.
//!
//! Drives the gate with scripted guessing patterns on a paused tokio clock
//! and tallies how each request was decided.

pub mod attacks;
pub mod generators;
pub mod metrics;
