//! Run every catalog variant against one server.

use std::sync::Arc;
use std::time::Duration;

use super::outcome::ProbeOutcome;
use super::transport::{Exchange, ProbeRequest, Transport};
use super::variant::VariantCatalog;
use crate::registry::Server;

/// Outcomes for one server, in catalog order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeSet {
    outcomes: Vec<(String, ProbeOutcome)>,
    reference: usize,
}

impl ProbeSet {
    /// Build from `(variant name, outcome)` pairs; `reference` names the baseline.
    /// Returns `None` if the reference is missing.
    pub fn new(outcomes: Vec<(String, ProbeOutcome)>, reference: &str) -> Option<Self> {
        let reference = outcomes.iter().position(|(name, _)| name == reference)?;
        Some(Self {
            outcomes,
            reference,
        })
    }

    pub fn reference(&self) -> &ProbeOutcome {
        &self.outcomes[self.reference].1
    }

    pub fn get(&self, name: &str) -> Option<&ProbeOutcome> {
        self.outcomes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, o)| o)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ProbeOutcome)> {
        self.outcomes.iter().map(|(n, o)| (n.as_str(), o))
    }

    /// Outcomes other than the reference, in catalog order.
    pub fn non_reference(&self) -> impl Iterator<Item = (&str, &ProbeOutcome)> {
        let reference = self.reference;
        self.outcomes
            .iter()
            .enumerate()
            .filter(move |(i, _)| *i != reference)
            .map(|(_, (n, o))| (n.as_str(), o))
    }
}

/// Request settings shared by every probe.
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    /// Path joined onto each server base URL (e.g. `help`).
    pub probe_path: String,
    pub connect_timeout: Duration,
    pub timeout: Duration,
    pub preview_bytes: usize,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            probe_path: "help".to_string(),
            connect_timeout: Duration::from_secs(5),
            timeout: Duration::from_secs(5),
            preview_bytes: 1000,
        }
    }
}

/// Issues the variant requests for a server through a `Transport`.
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    settings: DispatchSettings,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn Transport>, settings: DispatchSettings) -> Self {
        Self {
            transport,
            settings,
        }
    }

    /// URL probed for a server: the probe path joined onto its base URL.
    pub fn probe_url(&self, server_url: &str) -> String {
        probe_url(server_url, &self.settings.probe_path)
    }

    /// Request every variant in catalog order. When `pacing` is non-zero it is
    /// slept between consecutive variant requests.
    pub async fn probe(&self, server: &Server, catalog: &VariantCatalog, pacing: Duration) -> ProbeSet {
        let url = self.probe_url(&server.url);
        let mut outcomes = Vec::with_capacity(catalog.len());

        for (i, variant) in catalog.iter().enumerate() {
            if i > 0 && !pacing.is_zero() {
                tracing::debug!(server = %server.url, ?pacing, "pacing between variants");
                tokio::time::sleep(pacing).await;
            }
            let request = ProbeRequest {
                url: url.clone(),
                accept: variant.accept.clone(),
                connect_timeout: self.settings.connect_timeout,
                timeout: self.settings.timeout,
            };
            let transport = Arc::clone(&self.transport);
            let exchange = tokio::task::spawn_blocking(move || transport.get(&request))
                .await
                .unwrap_or_else(|e| Exchange::Failed(format!("probe task failed: {e}")));
            let outcome = ProbeOutcome::from_exchange(exchange, self.settings.preview_bytes);
            tracing::debug!(
                server = %server.url,
                variant = %variant.name,
                status = %outcome.status,
                "variant probed"
            );
            outcomes.push((variant.name.clone(), outcome));
        }

        let reference = &catalog.reference().name;
        // The catalog always contains its reference, so this set does too.
        let reference_index = outcomes
            .iter()
            .position(|(n, _)| n == reference)
            .unwrap_or(0);
        ProbeSet {
            outcomes,
            reference: reference_index,
        }
    }
}

/// Join `path` onto `base`, treating `base` as a directory.
pub fn probe_url(base: &str, path: &str) -> String {
    let dir = if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{base}/")
    };
    match url::Url::parse(&dir).and_then(|u| u.join(path)) {
        Ok(joined) => joined.to_string(),
        Err(_) => format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/')),
    }
}
