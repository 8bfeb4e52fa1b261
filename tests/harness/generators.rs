// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Test data generators for guessing simulation.

use std::net::{IpAddr, Ipv4Addr};

/// Generate a pool of IP addresses for testing.
pub fn generate_ips(count: usize) -> Vec<IpAddr> {
    (0..count)
        .map(|i| {
            // Use 10.x.x.x private range
            let a = ((i >> 16) & 0xFF) as u8;
            let b = ((i >> 8) & 0xFF) as u8;
            let c = (i & 0xFF) as u8;
            IpAddr::V4(Ipv4Addr::new(10, a, b, c))
        })
        .collect()
}

/// Generate distinct user-agent strings.
pub fn generate_user_agents(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| format!("guesser/{}.0 (+bot-{})", i % 7, i))
        .collect()
}

/// Wrong guesses of assorted shapes for a secret.
///
/// Includes same-length guesses differing at the first and last byte, the
/// secret's prefixes, and the secret with extra characters.
pub fn generate_guesses(secret: &str, count: usize) -> Vec<String> {
    let mut guesses = Vec::with_capacity(count);
    let len = secret.len();

    for i in 0..count {
        let guess = match i % 5 {
            0 => format!("X{}", &secret[1..]),
            1 => format!("{}X", &secret[..len - 1]),
            2 => secret[..(i % len).max(1)].to_string(),
            3 => format!("{}{}", secret, i),
            _ => format!("{:0>width$}", i, width = len),
        };
        guesses.push(guess);
    }
    guesses
}

/// Candidate credentials for timing comparisons.
pub fn timing_candidates(secret: &str) -> Vec<(&'static str, String)> {
    let len = secret.len();
    vec![
        ("first byte differs", format!("X{}", &secret[1..])),
        ("last byte differs", format!("{}X", &secret[..len - 1])),
        ("shorter", secret[..len / 2].to_string()),
        ("longer", format!("{}{}", secret, secret)),
        ("empty", String::new()),
    ]
}
