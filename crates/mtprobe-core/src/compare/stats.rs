//! Running counters, updated once per finalized server.

use super::report::{RateLine, StatsReport, VariantReport};
use super::EquivalenceFields;
use crate::probe::{ProbeSet, VariantCatalog};

/// Counters for one non-reference variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VariantCounters {
    /// Servers where this variant was equivalent to the reference.
    pub matches: u64,
    /// Of those, servers where this variant's outcome was also healthy
    /// (HTTP 200 with an RDAP conformance declaration).
    pub healthy_matches: u64,
}

/// Aggregate comparison results over all finalized servers.
#[derive(Debug, Clone)]
pub struct AggregateStats {
    fields: EquivalenceFields,
    reference: String,
    variants: Vec<(String, VariantCounters)>,
    reference_healthy: u64,
    finalized: u64,
}

impl AggregateStats {
    pub fn new(catalog: &VariantCatalog, fields: EquivalenceFields) -> Self {
        Self {
            fields,
            reference: catalog.reference().name.clone(),
            variants: catalog
                .non_reference()
                .map(|v| (v.name.clone(), VariantCounters::default()))
                .collect(),
            reference_healthy: 0,
            finalized: 0,
        }
    }

    /// Fold one finalized server's outcomes into the totals. Returns the
    /// equivalence verdict for each non-reference variant, in catalog order.
    pub fn record(&mut self, set: &ProbeSet) -> Vec<(String, bool)> {
        let reference = set.reference();
        let reference_healthy = reference.is_healthy();
        self.finalized += 1;
        if reference_healthy {
            self.reference_healthy += 1;
        }

        let mut verdicts = Vec::with_capacity(self.variants.len());
        for (name, counters) in &mut self.variants {
            let Some(outcome) = set.get(name) else {
                tracing::warn!(variant = %name, "variant missing from probe set");
                continue;
            };
            let equivalent = self.fields.is_equivalent(outcome, reference);
            if equivalent {
                counters.matches += 1;
                // Subset of reference_healthy, which is its denominator.
                if reference_healthy && outcome.is_healthy() {
                    counters.healthy_matches += 1;
                }
            }
            verdicts.push((name.clone(), equivalent));
        }
        verdicts
    }

    pub fn finalized(&self) -> u64 {
        self.finalized
    }

    pub fn reference_healthy(&self) -> u64 {
        self.reference_healthy
    }

    pub fn counters(&self, variant: &str) -> Option<VariantCounters> {
        self.variants
            .iter()
            .find(|(n, _)| n == variant)
            .map(|(_, c)| *c)
    }

    /// Snapshot of the current percentages.
    pub fn report(&self) -> StatsReport {
        StatsReport {
            reference: self.reference.clone(),
            finalized: self.finalized,
            reference_healthy: self.reference_healthy,
            variants: self
                .variants
                .iter()
                .map(|(name, c)| VariantReport {
                    variant: name.clone(),
                    matches: RateLine::over_finalized(c.matches, self.finalized),
                    healthy_matches: RateLine::over_healthy_reference(
                        c.healthy_matches,
                        self.reference_healthy,
                    ),
                })
                .collect(),
        }
    }
}
