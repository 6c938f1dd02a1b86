//! Variant catalog: named Accept-header configurations.

use std::collections::HashSet;

use crate::config::ConfigError;

/// One named Accept-header configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeVariant {
    pub name: String,
    /// Value sent in the `Accept` request header.
    pub accept: String,
}

impl ProbeVariant {
    pub fn new(name: &str, accept: &str) -> Self {
        Self {
            name: name.to_string(),
            accept: accept.to_string(),
        }
    }
}

/// Ordered, non-empty set of variants with one marked as the reference.
/// Variants are dispatched and recorded in catalog order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantCatalog {
    variants: Vec<ProbeVariant>,
    reference: usize,
}

impl VariantCatalog {
    pub fn new(variants: Vec<ProbeVariant>, reference: &str) -> Result<Self, ConfigError> {
        if variants.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }
        let mut seen = HashSet::new();
        for v in &variants {
            if !seen.insert(v.name.as_str()) {
                return Err(ConfigError::DuplicateVariant(v.name.clone()));
            }
        }
        let reference = variants
            .iter()
            .position(|v| v.name == reference)
            .ok_or_else(|| ConfigError::UnknownReference(reference.to_string()))?;
        Ok(Self {
            variants,
            reference,
        })
    }

    pub fn reference(&self) -> &ProbeVariant {
        &self.variants[self.reference]
    }

    pub fn is_reference(&self, name: &str) -> bool {
        self.reference().name == name
    }

    /// All variants in dispatch order, reference included.
    pub fn iter(&self) -> impl Iterator<Item = &ProbeVariant> {
        self.variants.iter()
    }

    /// Variants compared against the reference, in dispatch order.
    pub fn non_reference(&self) -> impl Iterator<Item = &ProbeVariant> {
        let reference = self.reference;
        self.variants
            .iter()
            .enumerate()
            .filter(move |(i, _)| *i != reference)
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}
