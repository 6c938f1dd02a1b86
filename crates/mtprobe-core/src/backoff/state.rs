//! Per-identity backoff state.

use std::time::{Duration, Instant};

use super::BackoffPolicy;

/// Backoff bookkeeping for one host identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffState {
    /// Rate-limit signals observed while the delay sat at the maximum.
    pub retries: u32,
    /// Delay applied on the next rate-limit signal.
    pub delay: Duration,
    pub next_eligible: Instant,
    /// Rate-limit signals ever observed for this identity.
    pub throttle_pressure: u32,
}

impl BackoffState {
    pub(super) fn new(policy: &BackoffPolicy, now: Instant) -> Self {
        Self {
            retries: 0,
            delay: policy.initial_delay,
            next_eligible: now,
            throttle_pressure: 0,
        }
    }
}
