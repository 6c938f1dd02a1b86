use std::net::IpAddr;

use anyhow::{Context, Result};

/// Host and port extracted from a server endpoint URL, ready for lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointHost {
    pub host: String,
    pub port: u16,
}

impl EndpointHost {
    /// Construct from an endpoint URL string.
    pub fn from_url(url: &str) -> Result<Self> {
        let parsed = url::Url::parse(url).with_context(|| format!("invalid endpoint URL: {url}"))?;

        let host = match parsed.host() {
            Some(url::Host::Domain(d)) => d.to_string(),
            Some(url::Host::Ipv4(ip)) => ip.to_string(),
            Some(url::Host::Ipv6(ip)) => ip.to_string(),
            None => anyhow::bail!("endpoint URL has no host: {url}"),
        };
        let port = parsed
            .port_or_known_default()
            .ok_or_else(|| anyhow::anyhow!("endpoint URL missing port and unknown default: {url}"))?;

        Ok(Self { host, port })
    }

    /// The host as an address when the URL already names one.
    pub fn ip_literal(&self) -> Option<IpAddr> {
        self.host.parse().ok()
    }
}
