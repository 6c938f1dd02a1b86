//! Service registry: RDAP bootstrap document → server endpoint index.
//!
//! The bootstrap file lists `[[tld...], [server...]]` pairs. A server may be
//! listed under several entries; its TLD set is the union of all of them.

mod fetch;

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::Deserialize;

pub use fetch::fetch_bootstrap;

/// Fatal setup errors while obtaining the registry. No probing starts after one.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("registry request failed: {0}")]
    Fetch(#[from] curl::Error),
    #[error("registry {url} returned HTTP {status}")]
    Http { url: String, status: u32 },
    #[error("registry document is not valid bootstrap JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("read registry file: {0}")]
    Io(#[from] std::io::Error),
}

/// Parsed bootstrap document. Only `services` drives probing.
#[derive(Debug, Clone, Deserialize)]
pub struct Bootstrap {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub publication: Option<String>,
    pub services: Vec<(Vec<String>, Vec<String>)>,
}

/// Server endpoint URL → TLDs served by it.
pub type ServerIndex = BTreeMap<String, BTreeSet<String>>;

/// One probe target. Immutable once built from the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Server {
    pub url: String,
    pub tlds: BTreeSet<String>,
}

impl Server {
    pub fn new(url: impl Into<String>, tlds: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            url: url.into(),
            tlds: tlds.into_iter().map(Into::into).collect(),
        }
    }

    /// TLDs joined for display and output rows.
    pub fn tld_list(&self) -> String {
        self.tlds.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
    }
}

/// Parse a bootstrap document from raw bytes.
pub fn parse_bootstrap(bytes: &[u8]) -> Result<Bootstrap, RegistryError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Load a bootstrap document from a local file (offline runs).
pub fn load_bootstrap(path: &Path) -> Result<Bootstrap, RegistryError> {
    let bytes = std::fs::read(path)?;
    parse_bootstrap(&bytes)
}

/// Accumulate every entry's TLDs into each of its servers' TLD sets.
pub fn build_server_index(services: &[(Vec<String>, Vec<String>)]) -> ServerIndex {
    let mut index = ServerIndex::new();
    for (tlds, servers) in services {
        for server in servers {
            index
                .entry(server.clone())
                .or_default()
                .extend(tlds.iter().cloned());
        }
    }
    index
}

/// Flatten the index into probe targets (index order, i.e. sorted by URL).
pub fn servers_from_index(index: ServerIndex) -> Vec<Server> {
    index
        .into_iter()
        .map(|(url, tlds)| Server { url, tlds })
        .collect()
}
