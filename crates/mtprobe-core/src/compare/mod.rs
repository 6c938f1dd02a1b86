//! Response equivalence and running aggregate statistics.
//!
//! A variant's outcome is equivalent to the reference when the configured
//! fields match. By default that is status marker and (truncated) body;
//! content-type is left out because servers legitimately vary it for the
//! same content.

mod report;
mod stats;

use serde::{Deserialize, Serialize};

use crate::probe::ProbeOutcome;

pub use report::{RateLine, StatsReport, VariantReport};
pub use stats::{AggregateStats, VariantCounters};

/// Fields that must match for two outcomes to be equivalent
/// (`[equivalence]` in config.toml).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EquivalenceFields {
    pub status: bool,
    pub body: bool,
    pub content_type: bool,
}

impl Default for EquivalenceFields {
    fn default() -> Self {
        Self {
            status: true,
            body: true,
            content_type: false,
        }
    }
}

impl EquivalenceFields {
    pub fn is_equivalent(&self, test: &ProbeOutcome, reference: &ProbeOutcome) -> bool {
        (!self.status || test.status == reference.status)
            && (!self.body || test.content == reference.content)
            && (!self.content_type || test.content_type == reference.content_type)
    }
}
