//! Per-identity backoff controller.
//!
//! One `BackoffState` per `HostIdentity`, created on first reference. The
//! controller is the only authority on whether a host may be probed again:
//! rate-limit signals push the next-eligible time out with a doubling delay,
//! a clean batch resets it. Throttle pressure survives resets and turns into
//! inter-variant pacing for hosts that have pushed back before.

mod state;

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::host_identity::HostIdentity;

pub use state::BackoffState;

/// Tunables for the controller (built from `[backoff]` in config.toml).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// Retries counted at the maximum delay before a server is given up on.
    pub max_retries: u32,
    pub pacing_per_pressure: Duration,
    pub max_pacing: Duration,
    pub reset_pressure_on_clean: bool,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(32),
            max_retries: 3,
            pacing_per_pressure: Duration::from_secs(1),
            max_pacing: Duration::from_secs(10),
            reset_pressure_on_clean: false,
        }
    }
}

/// What the controller decided after a rate-limit signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitVerdict {
    /// How long the identity is now ineligible.
    pub wait: Duration,
    pub retries: u32,
    /// True once `retries` reached `max_retries`; the server should be finalized.
    pub exhausted: bool,
}

/// Owner of every identity's backoff state for one run.
#[derive(Debug, Clone)]
pub struct BackoffController {
    policy: BackoffPolicy,
    entries: HashMap<HostIdentity, BackoffState>,
}

impl BackoffController {
    pub fn new(policy: BackoffPolicy) -> Self {
        Self {
            policy,
            entries: HashMap::new(),
        }
    }

    /// Look up the state for an identity without creating it.
    pub fn get(&self, identity: &HostIdentity) -> Option<&BackoffState> {
        self.entries.get(identity)
    }

    /// Number of identities seen so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the state for `identity`, default-constructing it at `now` if absent.
    pub fn state_or_default(&mut self, identity: HostIdentity, now: Instant) -> &mut BackoffState {
        let policy = &self.policy;
        self.entries
            .entry(identity)
            .or_insert_with(|| BackoffState::new(policy, now))
    }

    /// True iff `now` has reached the identity's next-eligible time.
    pub fn is_eligible(&mut self, identity: HostIdentity, now: Instant) -> bool {
        now >= self.state_or_default(identity, now).next_eligible
    }

    /// Time left until the identity becomes eligible (zero if it already is).
    pub fn remaining(&self, identity: &HostIdentity, now: Instant) -> Duration {
        self.entries
            .get(identity)
            .map(|s| s.next_eligible.saturating_duration_since(now))
            .unwrap_or_default()
    }

    /// Record a batch that showed a rate-limit signal.
    ///
    /// The current delay is applied, then doubled for next time (capped at the
    /// maximum). A signal that lands while the delay is already at the maximum
    /// counts as a retry.
    pub fn on_rate_limited(&mut self, identity: HostIdentity, now: Instant) -> RateLimitVerdict {
        let max_delay = self.policy.max_delay;
        let max_retries = self.policy.max_retries;
        let state = self.state_or_default(identity, now);

        let wait = state.delay.min(max_delay);
        if wait >= max_delay {
            state.retries = state.retries.saturating_add(1);
        }
        state.next_eligible = now + wait;
        state.throttle_pressure = state.throttle_pressure.saturating_add(1);
        state.delay = wait.saturating_mul(2).min(max_delay);

        RateLimitVerdict {
            wait,
            retries: state.retries,
            exhausted: state.retries >= max_retries,
        }
    }

    /// Record a batch with no rate-limit signal: back to initial delay, zero
    /// retries, eligible immediately. Throttle pressure is kept unless the
    /// policy says otherwise.
    pub fn on_clean(&mut self, identity: HostIdentity, now: Instant) {
        let policy = self.policy;
        let state = self.state_or_default(identity, now);
        state.retries = 0;
        state.delay = policy.initial_delay;
        state.next_eligible = now;
        if policy.reset_pressure_on_clean {
            state.throttle_pressure = 0;
        }
    }

    /// Extra sleep between variant requests to this identity.
    pub fn pacing_delay(&self, identity: &HostIdentity) -> Duration {
        let pressure = self
            .entries
            .get(identity)
            .map(|s| s.throttle_pressure)
            .unwrap_or(0);
        self.policy
            .pacing_per_pressure
            .saturating_mul(pressure)
            .min(self.policy.max_pacing)
    }
}

#[cfg(test)]
mod tests;
