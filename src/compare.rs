// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Constant-time credential comparison.

use subtle::ConstantTimeEq;

/// Compare a presented credential against the configured secret.
///
/// Runtime does not depend on where the inputs first differ. On a length
/// mismatch the candidate is compared against itself so the work done matches
/// a same-length comparison, then `false` is returned.
pub fn compare(candidate: &str, secret: &str) -> bool {
    let candidate = candidate.as_bytes();
    let secret = secret.as_bytes();

    if candidate.len() != secret.len() {
        std::hint::black_box(candidate.ct_eq(candidate));
        return false;
    }

    candidate.ct_eq(secret).into()
}

/// Shared secret with a redacting `Debug`.
#[derive(Clone)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Check a candidate against this secret in constant time.
    pub fn matches(&self, candidate: &str) -> bool {
        compare(candidate, &self.0)
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Secret([REDACTED])")
    }
}
