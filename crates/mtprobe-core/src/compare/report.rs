//! Printable statistics snapshot.

use std::fmt;

/// A ratio printed as a percentage with raw counts, or a fallback message
/// when the denominator is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLine {
    pub numerator: u64,
    pub denominator: u64,
    empty: &'static str,
}

impl RateLine {
    pub fn over_finalized(numerator: u64, denominator: u64) -> Self {
        Self {
            numerator,
            denominator,
            empty: "no finalized servers",
        }
    }

    pub fn over_healthy_reference(numerator: u64, denominator: u64) -> Self {
        Self {
            numerator,
            denominator,
            empty: "no successful reference responses",
        }
    }

    /// Percentage in [0, 100], or `None` for a zero denominator.
    pub fn percentage(&self) -> Option<f64> {
        if self.denominator == 0 {
            return None;
        }
        Some(self.numerator as f64 * 100.0 / self.denominator as f64)
    }
}

impl fmt::Display for RateLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.percentage() {
            Some(pct) => write!(f, "{:.2}% ({}/{})", pct, self.numerator, self.denominator),
            None => f.write_str(self.empty),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariantReport {
    pub variant: String,
    /// Equivalent responses over finalized servers.
    pub matches: RateLine,
    /// Equivalent healthy responses over healthy reference responses.
    pub healthy_matches: RateLine,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatsReport {
    pub reference: String,
    pub finalized: u64,
    pub reference_healthy: u64,
    pub variants: Vec<VariantReport>,
}

impl fmt::Display for StatsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Statistics over {} server(s), compared against \"{}\" ({} healthy reference response(s)):",
            self.finalized, self.reference, self.reference_healthy
        )?;
        for v in &self.variants {
            writeln!(f, "  {}:", v.variant)?;
            writeln!(f, "    same response:         {}", v.matches)?;
            writeln!(f, "    same healthy response: {}", v.healthy_matches)?;
        }
        Ok(())
    }
}
