//! Tests for the backoff controller.

use std::net::{IpAddr, Ipv4Addr};
use std::time::{Duration, Instant};

use super::{BackoffController, BackoffPolicy};
use crate::host_identity::HostIdentity;

fn ip(last: u8) -> HostIdentity {
    HostIdentity::Address(IpAddr::V4(Ipv4Addr::new(192, 0, 2, last)))
}

fn policy() -> BackoffPolicy {
    BackoffPolicy {
        initial_delay: Duration::from_secs(1),
        max_delay: Duration::from_secs(8),
        max_retries: 2,
        pacing_per_pressure: Duration::from_millis(500),
        max_pacing: Duration::from_secs(2),
        reset_pressure_on_clean: false,
    }
}

#[test]
fn first_reference_creates_default_state() {
    let mut ctl = BackoffController::new(policy());
    let now = Instant::now();
    assert!(ctl.get(&ip(1)).is_none());
    assert!(ctl.is_eligible(ip(1), now));
    let state = ctl.get(&ip(1)).expect("created on first access");
    assert_eq!(state.retries, 0);
    assert_eq!(state.delay, Duration::from_secs(1));
    assert_eq!(state.next_eligible, now);
    assert_eq!(state.throttle_pressure, 0);
}

#[test]
fn delay_doubles_is_non_decreasing_and_capped() {
    let mut ctl = BackoffController::new(policy());
    let now = Instant::now();
    let waits: Vec<Duration> = (0..7)
        .map(|_| ctl.on_rate_limited(ip(1), now).wait)
        .collect();
    assert_eq!(
        waits,
        [1, 2, 4, 8, 8, 8, 8].map(Duration::from_secs).to_vec()
    );
    assert!(waits.windows(2).all(|w| w[0] <= w[1]));
    assert!(ctl.get(&ip(1)).unwrap().delay <= policy().max_delay);
}

#[test]
fn retries_count_only_at_saturation() {
    let mut ctl = BackoffController::new(policy());
    let now = Instant::now();
    for _ in 0..3 {
        let v = ctl.on_rate_limited(ip(1), now);
        assert_eq!(v.retries, 0);
        assert!(!v.exhausted);
    }
    // Fourth signal applies the 8s maximum.
    let v = ctl.on_rate_limited(ip(1), now);
    assert_eq!(v.wait, Duration::from_secs(8));
    assert_eq!(v.retries, 1);
    assert!(!v.exhausted);
    let v = ctl.on_rate_limited(ip(1), now);
    assert_eq!(v.retries, 2);
    assert!(v.exhausted);
}

#[test]
fn rate_limit_defers_eligibility() {
    let mut ctl = BackoffController::new(policy());
    let now = Instant::now();
    ctl.on_rate_limited(ip(1), now);
    assert!(!ctl.is_eligible(ip(1), now));
    assert_eq!(ctl.remaining(&ip(1), now), Duration::from_secs(1));
    assert!(ctl.is_eligible(ip(1), now + Duration::from_secs(1)));
    // Other identities are unaffected.
    assert!(ctl.is_eligible(ip(2), now));
}

#[test]
fn clean_resets_delay_and_retries_but_keeps_pressure() {
    let mut ctl = BackoffController::new(policy());
    let now = Instant::now();
    for _ in 0..5 {
        ctl.on_rate_limited(ip(1), now);
    }
    let later = now + Duration::from_secs(30);
    ctl.on_clean(ip(1), later);
    let state = ctl.get(&ip(1)).unwrap();
    assert_eq!(state.retries, 0);
    assert_eq!(state.delay, Duration::from_secs(1));
    assert_eq!(state.next_eligible, later);
    assert_eq!(state.throttle_pressure, 5);
    assert!(ctl.is_eligible(ip(1), later));
}

#[test]
fn clean_can_reset_pressure_when_configured() {
    let mut ctl = BackoffController::new(BackoffPolicy {
        reset_pressure_on_clean: true,
        ..policy()
    });
    let now = Instant::now();
    ctl.on_rate_limited(ip(1), now);
    ctl.on_clean(ip(1), now);
    assert_eq!(ctl.get(&ip(1)).unwrap().throttle_pressure, 0);
    assert_eq!(ctl.pacing_delay(&ip(1)), Duration::ZERO);
}

#[test]
fn pacing_grows_with_pressure_up_to_cap() {
    let mut ctl = BackoffController::new(policy());
    let now = Instant::now();
    assert_eq!(ctl.pacing_delay(&ip(1)), Duration::ZERO);
    ctl.on_rate_limited(ip(1), now);
    assert_eq!(ctl.pacing_delay(&ip(1)), Duration::from_millis(500));
    ctl.on_rate_limited(ip(1), now);
    ctl.on_clean(ip(1), now);
    assert_eq!(ctl.pacing_delay(&ip(1)), Duration::from_secs(1));
    for _ in 0..10 {
        ctl.on_rate_limited(ip(1), now);
    }
    assert_eq!(ctl.pacing_delay(&ip(1)), Duration::from_secs(2));
}

#[test]
fn unresolved_endpoints_share_one_bucket() {
    let mut ctl = BackoffController::new(policy());
    let now = Instant::now();
    ctl.on_rate_limited(HostIdentity::Unresolved, now);
    assert_eq!(ctl.len(), 1);
    assert!(!ctl.is_eligible(HostIdentity::Unresolved, now));
    assert_eq!(
        ctl.get(&HostIdentity::Unresolved).unwrap().throttle_pressure,
        1
    );
}

#[test]
fn initial_delay_at_cap_counts_first_signal_as_retry() {
    let mut ctl = BackoffController::new(BackoffPolicy {
        initial_delay: Duration::from_secs(8),
        max_retries: 1,
        ..policy()
    });
    let v = ctl.on_rate_limited(ip(3), Instant::now());
    assert_eq!(v.wait, Duration::from_secs(8));
    assert!(v.exhausted);
}
