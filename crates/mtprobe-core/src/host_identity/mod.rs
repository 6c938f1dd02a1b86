//! Host identity: the network address a server endpoint resolves to.
//!
//! Backoff is keyed by identity rather than hostname so that many RDAP
//! endpoints hosted on one address share a single rate budget. Endpoints
//! that fail to resolve all share the `Unresolved` bucket.

mod key;

use std::fmt;
use std::net::{IpAddr, ToSocketAddrs};

pub use key::EndpointHost;

/// Backoff-accounting key for a server endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HostIdentity {
    Address(IpAddr),
    /// Sentinel for any endpoint whose address could not be determined.
    Unresolved,
}

impl fmt::Display for HostIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostIdentity::Address(ip) => write!(f, "{ip}"),
            HostIdentity::Unresolved => f.write_str("unknown-host"),
        }
    }
}

/// Maps an endpoint URL to its identity. Never fails: unresolvable endpoints
/// degrade to `HostIdentity::Unresolved`.
pub trait HostResolver: Send + Sync {
    fn resolve(&self, endpoint: &str) -> HostIdentity;
}

/// Resolver backed by the system's address lookup.
#[derive(Debug, Clone, Copy, Default)]
pub struct DnsResolver;

impl HostResolver for DnsResolver {
    fn resolve(&self, endpoint: &str) -> HostIdentity {
        let host = match EndpointHost::from_url(endpoint) {
            Ok(h) => h,
            Err(e) => {
                tracing::debug!(endpoint, "cannot extract host: {:#}", e);
                return HostIdentity::Unresolved;
            }
        };
        if let Some(ip) = host.ip_literal() {
            return HostIdentity::Address(ip);
        }
        match (host.host.as_str(), host.port).to_socket_addrs() {
            Ok(mut addrs) => addrs
                .next()
                .map(|a| HostIdentity::Address(a.ip()))
                .unwrap_or(HostIdentity::Unresolved),
            Err(e) => {
                tracing::debug!(endpoint, host = %host.host, "address lookup failed: {}", e);
                HostIdentity::Unresolved
            }
        }
    }
}
