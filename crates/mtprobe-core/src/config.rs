use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::backoff::BackoffPolicy;
use crate::compare::EquivalenceFields;
use crate::probe::{ProbeVariant, VariantCatalog};
use crate::scheduler::TriggerPolicy;

/// Well-known location of the IANA RDAP bootstrap file for DNS.
pub const DEFAULT_REGISTRY_URL: &str = "https://data.iana.org/rdap/dns.json";

/// Validation failures in a loaded config. All of them abort before probing.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("variant catalog is empty")]
    EmptyCatalog,
    #[error("duplicate variant name: {0}")]
    DuplicateVariant(String),
    #[error("reference variant {0:?} is not in the catalog")]
    UnknownReference(String),
    #[error("{0} must be a positive number of seconds")]
    InvalidDuration(&'static str),
    #[error("backoff max_delay_secs must be >= initial_delay_secs")]
    BackoffBounds,
}

/// Backoff parameters (`[backoff]` section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    /// First deferral after a rate-limit signal, in seconds.
    pub initial_delay_secs: f64,
    /// Upper bound on the deferral delay, in seconds.
    pub max_delay_secs: f64,
    /// Rate-limit signals at the maximum delay before a server is finalized anyway.
    pub max_retries: u32,
    /// Extra sleep between variants per unit of throttle pressure, in seconds.
    pub pacing_per_pressure_secs: f64,
    /// Cap on the inter-variant pacing sleep, in seconds.
    pub max_pacing_secs: f64,
    /// Clear throttle pressure when a host answers cleanly (default keeps it).
    pub reset_pressure_on_clean: bool,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay_secs: 1.0,
            max_delay_secs: 32.0,
            max_retries: 3,
            pacing_per_pressure_secs: 1.0,
            max_pacing_secs: 10.0,
            reset_pressure_on_clean: false,
        }
    }
}

impl BackoffConfig {
    pub fn policy(&self) -> Result<BackoffPolicy, ConfigError> {
        let initial = positive_secs(self.initial_delay_secs, "backoff.initial_delay_secs")?;
        let max = positive_secs(self.max_delay_secs, "backoff.max_delay_secs")?;
        if max < initial {
            return Err(ConfigError::BackoffBounds);
        }
        Ok(BackoffPolicy {
            initial_delay: initial,
            max_delay: max,
            max_retries: self.max_retries,
            pacing_per_pressure: non_negative_secs(
                self.pacing_per_pressure_secs,
                "backoff.pacing_per_pressure_secs",
            )?,
            max_pacing: non_negative_secs(self.max_pacing_secs, "backoff.max_pacing_secs")?,
            reset_pressure_on_clean: self.reset_pressure_on_clean,
        })
    }
}

/// Catalog entry as written in config.toml.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantConfig {
    pub name: String,
    pub accept: String,
}

impl VariantConfig {
    fn new(name: &str, accept: &str) -> Self {
        Self {
            name: name.to_string(),
            accept: accept.to_string(),
        }
    }
}

/// Default variant catalog: the plain media type first, then parameterised,
/// bogus and multi-type Accept headers.
pub fn default_variants() -> Vec<VariantConfig> {
    vec![
        VariantConfig::new("RFC conform", "application/rdap+json"),
        VariantConfig::new(
            "With parameter",
            "application/rdap+json;extensions=\"rdap_level_0 rdapx foo\"",
        ),
        VariantConfig::new("Bogus", "application/x.foobar"),
        VariantConfig::new("Multiple types", "application/rdap+json, application/json"),
        VariantConfig::new("JSON only", "application/json"),
        VariantConfig::new("Wildcard", "*/*"),
    ]
}

/// Global configuration loaded from `~/.config/mtprobe/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Where the RDAP bootstrap document is fetched from.
    pub registry_url: String,
    /// Path appended to every server base URL.
    pub probe_path: String,
    /// Whole-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Connection-establishment timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Bytes of response body kept for comparison and output.
    pub preview_bytes: usize,
    /// Sleep between queue passes when the head item is not yet eligible.
    pub defer_interval_ms: u64,
    /// Print running statistics every N finalized servers (0 disables).
    pub report_every: usize,
    /// Name of the variant every other variant is compared against.
    pub reference_variant: String,
    pub backoff: BackoffConfig,
    pub triggers: TriggerPolicy,
    pub equivalence: EquivalenceFields,
    pub variants: Vec<VariantConfig>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
            probe_path: "help".to_string(),
            request_timeout_secs: 5,
            connect_timeout_secs: 5,
            preview_bytes: 1000,
            defer_interval_ms: 1000,
            report_every: 10,
            reference_variant: "RFC conform".to_string(),
            backoff: BackoffConfig::default(),
            triggers: TriggerPolicy::default(),
            equivalence: EquivalenceFields::default(),
            variants: default_variants(),
        }
    }
}

impl ProbeConfig {
    /// Check invariants that the scheduler relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.catalog()?;
        self.backoff.policy()?;
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidDuration("request_timeout_secs"));
        }
        if self.connect_timeout_secs == 0 {
            return Err(ConfigError::InvalidDuration("connect_timeout_secs"));
        }
        Ok(())
    }

    /// Build the ordered variant catalog with the reference variant marked.
    pub fn catalog(&self) -> Result<VariantCatalog, ConfigError> {
        let variants = self
            .variants
            .iter()
            .map(|v| ProbeVariant::new(&v.name, &v.accept))
            .collect();
        VariantCatalog::new(variants, &self.reference_variant)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn defer_interval(&self) -> Duration {
        Duration::from_millis(self.defer_interval_ms)
    }
}

fn positive_secs(secs: f64, field: &'static str) -> Result<Duration, ConfigError> {
    match Duration::try_from_secs_f64(secs) {
        Ok(d) if !d.is_zero() => Ok(d),
        _ => Err(ConfigError::InvalidDuration(field)),
    }
}

fn non_negative_secs(secs: f64, field: &'static str) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(secs).map_err(|_| ConfigError::InvalidDuration(field))
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("mtprobe")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<ProbeConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = ProbeConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)
        .with_context(|| format!("read config: {}", path.display()))?;
    let cfg: ProbeConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config: {}", path.display()))?;
    Ok(cfg)
}
