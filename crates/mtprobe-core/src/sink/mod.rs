//! Result sink: consumes one record per finalized server.

mod csv;

use anyhow::Result;

use crate::probe::{ProbeSet, StatusMarker};
use crate::registry::Server;

pub use self::csv::CsvSink;

/// One variant's columns in a finalized record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantRecord {
    pub variant: String,
    pub status: StatusMarker,
    pub content: String,
    pub content_type: Option<String>,
    pub is_json: bool,
    pub has_conformance: bool,
    /// Equivalence to the reference; `None` for the reference itself.
    pub equivalent: Option<bool>,
}

/// Finalized result for one server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeRecord {
    pub server: String,
    pub tlds: Vec<String>,
    pub variants: Vec<VariantRecord>,
    /// The server was still rate-limited when its retries ran out.
    pub retries_exhausted: bool,
}

impl ProbeRecord {
    /// Assemble a record from the final probe set and the comparator's verdicts.
    pub fn new(
        server: &Server,
        set: &ProbeSet,
        verdicts: &[(String, bool)],
        retries_exhausted: bool,
    ) -> Self {
        let variants = set
            .iter()
            .map(|(name, outcome)| VariantRecord {
                variant: name.to_string(),
                status: outcome.status,
                content: outcome.content.clone(),
                content_type: outcome.content_type.clone(),
                is_json: outcome.is_json,
                has_conformance: outcome.has_conformance,
                equivalent: verdicts
                    .iter()
                    .find(|(n, _)| n == name)
                    .map(|(_, eq)| *eq),
            })
            .collect();
        Self {
            server: server.url.clone(),
            tlds: server.tlds.iter().cloned().collect(),
            variants,
            retries_exhausted,
        }
    }

    pub fn variant(&self, name: &str) -> Option<&VariantRecord> {
        self.variants.iter().find(|v| v.variant == name)
    }
}

/// Destination for finalized records.
pub trait ResultSink {
    fn write(&mut self, record: &ProbeRecord) -> Result<()>;

    /// Flush everything written so far. Called once when the run drains.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Keeps records in memory (tests, or callers that post-process results).
#[derive(Debug, Default)]
pub struct MemorySink {
    pub records: Vec<ProbeRecord>,
    pub finished: bool,
}

impl ResultSink for MemorySink {
    fn write(&mut self, record: &ProbeRecord) -> Result<()> {
        self.records.push(record.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}
