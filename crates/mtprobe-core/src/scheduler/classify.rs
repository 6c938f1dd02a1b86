//! Decide whether a probe batch carries a rate-limit signal.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::probe::{ProbeOutcome, ProbeSet, StatusMarker};

/// Which outcomes count as "slow down" (`[triggers]` in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerPolicy {
    /// Explicit status codes treated as rate limiting.
    pub statuses: Vec<u16>,
    /// Treat every 5xx as server overload.
    pub server_errors: bool,
    /// Treat connect/read timeouts as overload.
    pub timeouts: bool,
}

impl Default for TriggerPolicy {
    fn default() -> Self {
        Self {
            statuses: vec![403, 429],
            server_errors: true,
            timeouts: true,
        }
    }
}

/// Why a batch was treated as rate-limited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Timeout,
    Status(u16),
    ServerError(u16),
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Timeout => f.write_str("timeout"),
            Trigger::Status(code) => write!(f, "HTTP {code}"),
            Trigger::ServerError(code) => write!(f, "HTTP {code} (server error)"),
        }
    }
}

impl TriggerPolicy {
    /// Classify a single outcome. Generic transport errors never trigger.
    pub fn trigger_for(&self, outcome: &ProbeOutcome) -> Option<Trigger> {
        match outcome.status {
            StatusMarker::Timeout if self.timeouts => Some(Trigger::Timeout),
            StatusMarker::Http(code) if self.statuses.contains(&code) => Some(Trigger::Status(code)),
            StatusMarker::Http(code) if self.server_errors && (500..=599).contains(&code) => {
                Some(Trigger::ServerError(code))
            }
            _ => None,
        }
    }

    /// First triggering outcome in catalog order, if any.
    pub fn scan<'a>(&self, set: &'a ProbeSet) -> Option<(&'a str, Trigger)> {
        set.iter()
            .find_map(|(name, outcome)| self.trigger_for(outcome).map(|t| (name, t)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::{Exchange, TimeoutKind};

    fn http(code: u16) -> ProbeOutcome {
        ProbeOutcome::from_exchange(
            Exchange::Response {
                status: code,
                body: Vec::new(),
                content_type: None,
            },
            100,
        )
    }

    #[test]
    fn default_triggers() {
        let p = TriggerPolicy::default();
        assert_eq!(p.trigger_for(&http(429)), Some(Trigger::Status(429)));
        assert_eq!(p.trigger_for(&http(403)), Some(Trigger::Status(403)));
        assert_eq!(p.trigger_for(&http(503)), Some(Trigger::ServerError(503)));
        assert_eq!(p.trigger_for(&http(500)), Some(Trigger::ServerError(500)));
        let t = ProbeOutcome::from_exchange(Exchange::Timeout(TimeoutKind::Read), 100);
        assert_eq!(p.trigger_for(&t), Some(Trigger::Timeout));
    }

    #[test]
    fn non_triggers() {
        let p = TriggerPolicy::default();
        for code in [200, 301, 404, 406, 415] {
            assert_eq!(p.trigger_for(&http(code)), None, "HTTP {code}");
        }
        let e = ProbeOutcome::from_exchange(Exchange::Failed("refused".into()), 100);
        assert_eq!(p.trigger_for(&e), None);
    }

    #[test]
    fn triggers_are_configurable() {
        let p = TriggerPolicy {
            statuses: vec![429],
            server_errors: false,
            timeouts: false,
        };
        assert_eq!(p.trigger_for(&http(403)), None);
        assert_eq!(p.trigger_for(&http(502)), None);
        let t = ProbeOutcome::from_exchange(Exchange::Timeout(TimeoutKind::Connect), 100);
        assert_eq!(p.trigger_for(&t), None);
    }

    #[test]
    fn scan_reports_first_trigger_in_order() {
        let set = ProbeSet::new(
            vec![
                ("Ref".into(), http(200)),
                ("A".into(), http(503)),
                ("B".into(), http(429)),
            ],
            "Ref",
        )
        .unwrap();
        assert_eq!(
            TriggerPolicy::default().scan(&set),
            Some(("A", Trigger::ServerError(503)))
        );
        let clean = ProbeSet::new(vec![("Ref".into(), http(200))], "Ref").unwrap();
        assert_eq!(TriggerPolicy::default().scan(&clean), None);
    }
}
