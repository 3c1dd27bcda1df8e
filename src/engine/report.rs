//! Report rendering.
//!
//! Turns the ordered opportunities of one scan into the plain-text trade
//! report printed at the end of a run.

use chrono::{DateTime, Utc};
use crate::types::Opportunity;

const DEFAULT_TITLE: &str = "KALSHI ALPHA TRADING REPORT";
const RULE_WIDTH: usize = 80;

/// Renders scan results as a human-readable report.
#[derive(Debug, Clone)]
pub struct ReportBuilder {
    title: String,
}

impl Default for ReportBuilder {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
        }
    }
}

impl ReportBuilder {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }

    /// Render the report for one run, stamped with when the scan started
    /// and when it finished.
    pub fn render(
        &self,
        opportunities: &[Opportunity],
        started_at: DateTime<Utc>,
        generated_at: DateTime<Utc>,
    ) -> String {
        let heavy = "=".repeat(RULE_WIDTH);
        let light = "-".repeat(RULE_WIDTH);
        let mut out = String::with_capacity(1024 + opportunities.len() * 2048);

        out.push_str(&heavy);
        out.push('\n');
        out.push_str(&format!("{}\n", self.title));
        out.push_str(&format!("{}\n", generated_at.format("%Y-%m-%d %H:%M:%S UTC")));
        let elapsed = (generated_at - started_at).num_seconds().max(0);
        out.push_str(&format!(
            "Scan started {} ({elapsed}s)\n",
            started_at.format("%H:%M:%S UTC")
        ));
        out.push_str(&format!("{heavy}\n"));
        out.push_str(&format!("\nFound {} actionable opportunities\n\n", opportunities.len()));

        if opportunities.is_empty() {
            out.push_str("No BUY recommendations today.\n");
        }

        for (i, opp) in opportunities.iter().enumerate() {
            let m = opp.market();
            out.push_str(&format!("\nOPPORTUNITY #{}: {}\n", i + 1, opp.verdict.recommendation));
            out.push_str(&format!("Confidence: {}\n", opp.verdict.confidence));
            out.push_str(&format!("\nMARKET: {}\n", or_na(&m.title)));
            out.push_str(&format!("Ticker: {}\n", or_na(&m.ticker)));
            out.push_str(&format!("Alpha score: {}\n", opp.scored.score));
            out.push_str("\nCURRENT ODDS:\n");
            out.push_str(&format!("  YES: {:.1}%\n", m.yes_probability() * 100.0));
            out.push_str(&format!("  NO: {:.1}%\n", m.no_probability() * 100.0));
            out.push_str(&format!("\nVolume: ${}\n", format_thousands(m.volume)));
            out.push_str("\nANALYSIS:\n");
            out.push_str(&format!("{}\n", opp.verdict.narrative));
            out.push_str(&format!("\n{light}\n"));
        }

        out
    }
}

fn or_na(s: &str) -> &str {
    if s.is_empty() {
        "N/A"
    } else {
        s
    }
}

/// Round to a whole number and group digits in threes: 1234567.8 → "1,234,568".
pub fn format_thousands(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0.0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}
