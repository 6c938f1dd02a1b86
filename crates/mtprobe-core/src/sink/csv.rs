//! Semicolon-delimited output with spreadsheet-style minimal quoting.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use super::{ProbeRecord, ResultSink};
use crate::probe::VariantCatalog;

const DELIMITER: char = ';';
const LINE_END: &str = "\r\n";

/// Writes one row per record after a header derived from the catalog.
pub struct CsvSink<W: Write> {
    out: W,
    rows: usize,
}

impl CsvSink<BufWriter<File>> {
    /// Create (truncate) `path` and write the header row.
    pub fn create(path: &Path, catalog: &VariantCatalog) -> Result<Self> {
        let file =
            File::create(path).with_context(|| format!("create output: {}", path.display()))?;
        Self::new(BufWriter::new(file), catalog)
    }
}

impl<W: Write> CsvSink<W> {
    pub fn new(mut out: W, catalog: &VariantCatalog) -> Result<Self> {
        write_row(&mut out, &header(catalog)).context("write header row")?;
        Ok(Self { out, rows: 0 })
    }

    /// Data rows written so far.
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ResultSink for CsvSink<W> {
    fn write(&mut self, record: &ProbeRecord) -> Result<()> {
        write_row(&mut self.out, &row(record))
            .with_context(|| format!("write row for {}", record.server))?;
        self.rows += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush().context("flush output")
    }
}

fn header(catalog: &VariantCatalog) -> Vec<String> {
    let mut cols = vec!["Server URL".to_string(), "TLDs".to_string()];
    for v in catalog.iter() {
        let n = &v.name;
        cols.push(format!("{n} status"));
        cols.push(format!("{n} content"));
        cols.push(format!("{n} content type"));
        cols.push(format!("{n} JSON"));
        cols.push(format!("{n} RDAP conformance"));
        if !catalog.is_reference(n) {
            cols.push(format!("{n} same as reference"));
        }
    }
    cols
}

fn row(record: &ProbeRecord) -> Vec<String> {
    let mut cols = vec![record.server.clone(), record.tlds.join(", ")];
    for v in &record.variants {
        cols.push(v.status.to_string());
        cols.push(v.content.clone());
        cols.push(v.content_type.clone().unwrap_or_default());
        cols.push(flag(v.is_json));
        cols.push(flag(v.has_conformance));
        if let Some(eq) = v.equivalent {
            cols.push(flag(eq));
        }
    }
    cols
}

fn flag(b: bool) -> String {
    if b { "True" } else { "False" }.to_string()
}

fn write_row<W: Write>(out: &mut W, fields: &[String]) -> std::io::Result<()> {
    let line = fields
        .iter()
        .map(|f| quote(f))
        .collect::<Vec<_>>()
        .join(&DELIMITER.to_string());
    out.write_all(line.as_bytes())?;
    out.write_all(LINE_END.as_bytes())
}

/// Quote only when the field contains the delimiter, a quote or a line break.
fn quote(field: &str) -> String {
    if field.contains([DELIMITER, '"', '\r', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
