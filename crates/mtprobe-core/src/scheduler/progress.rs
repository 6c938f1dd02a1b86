//! Progress events sent from the scheduler loop to the console.

use std::time::Duration;

use crate::compare::StatsReport;
use crate::host_identity::HostIdentity;

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// A server is about to be probed.
    Probing {
        server: String,
        identity: HostIdentity,
        queued: usize,
        attempt: u32,
    },
    /// The server's host is backing off; the item went back to the tail.
    Deferred {
        server: String,
        identity: HostIdentity,
        remaining: Duration,
    },
    /// A batch showed a rate-limit signal.
    RateLimited {
        server: String,
        identity: HostIdentity,
        reason: String,
        wait: Duration,
        retries: u32,
        requeued: bool,
    },
    /// A record was emitted for the server.
    Finalized {
        server: String,
        finalized: u64,
        queued: usize,
    },
    /// Periodic running statistics.
    Stats(StatsReport),
}
