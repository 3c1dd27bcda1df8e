//! Shared types for the alpha scanner.
//!
//! Every stage of a scan produces a new value from these types; nothing
//! downstream mutates what an upstream stage handed it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Market snapshot
// ---------------------------------------------------------------------------

/// One tradeable market as quoted by the venue at fetch time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub ticker: String,
    pub title: String,
    pub category: String,
    /// Best YES bid in cents (0–100). Zero means no bid.
    pub yes_bid: u32,
    /// Best NO bid in cents (0–100). Zero means no bid.
    pub no_bid: u32,
    /// Contracts traded.
    pub volume: f64,
    /// Outstanding contracts.
    pub open_interest: f64,
    /// Absent when the venue omitted it or sent something unparseable.
    pub close_time: Option<DateTime<Utc>>,
}

impl MarketSnapshot {
    /// YES bid as a probability (0.0–1.0). Zero when there is no bid.
    pub fn yes_probability(&self) -> f64 {
        self.yes_bid as f64 / 100.0
    }

    /// NO bid as a probability (0.0–1.0). Zero when there is no bid.
    pub fn no_probability(&self) -> f64 {
        self.no_bid as f64 / 100.0
    }

    /// Whole days until close, relative to `now`. `None` without a close time.
    pub fn days_until_close(&self, now: DateTime<Utc>) -> Option<i64> {
        self.close_time.map(|close| (close - now).num_days())
    }

    /// Helper to build a test market with sensible defaults.
    #[cfg(test)]
    pub fn sample() -> Self {
        MarketSnapshot {
            ticker: "KXFEDDECISION-26DEC-H0".to_string(),
            title: "Will the Fed hold the interest rate in December?".to_string(),
            category: "Economics".to_string(),
            yes_bid: 45,
            no_bid: 53,
            volume: 60_000.0,
            open_interest: 20_000.0,
            close_time: Some(Utc::now() + chrono::Duration::days(30)),
        }
    }
}

impl fmt::Display for MarketSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} (YES: {}¢ | NO: {}¢ | vol: {:.0} | {})",
            self.ticker, self.title, self.yes_bid, self.no_bid, self.volume, self.category,
        )
    }
}

/// A snapshot annotated with its alpha score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredMarket {
    pub market: MarketSnapshot,
    pub score: u32,
}

impl fmt::Display for ScoredMarket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [alpha {}]", self.market, self.score)
    }
}

// ---------------------------------------------------------------------------
// Research verdict
// ---------------------------------------------------------------------------

/// Trade direction suggested by research.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Recommendation {
    BuyYes,
    BuyNo,
    Pass,
}

impl Recommendation {
    /// Whether the verdict asks for a position at all.
    pub fn is_actionable(&self) -> bool {
        !matches!(self, Recommendation::Pass)
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recommendation::BuyYes => write!(f, "BUY YES"),
            Recommendation::BuyNo => write!(f, "BUY NO"),
            Recommendation::Pass => write!(f, "PASS"),
        }
    }
}

/// How sure the research service claims to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Medium,
    Low,
    Unknown,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::High => write!(f, "HIGH"),
            Confidence::Medium => write!(f, "MEDIUM"),
            Confidence::Low => write!(f, "LOW"),
            Confidence::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Outcome of researching one market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchVerdict {
    pub recommendation: Recommendation,
    pub confidence: Confidence,
    /// Full model response, or a description of the failure.
    pub narrative: String,
    pub success: bool,
}

impl ResearchVerdict {
    /// Verdict substituted when the research call itself failed.
    pub fn failed(reason: impl fmt::Display) -> Self {
        Self {
            recommendation: Recommendation::Pass,
            confidence: Confidence::Unknown,
            narrative: format!("Error: {reason}"),
            success: false,
        }
    }
}

impl fmt::Display for ResearchVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.success {
            write!(f, "{} | {} confidence", self.recommendation, self.confidence)
        } else {
            write!(f, "FAILED ({})", self.narrative)
        }
    }
}

/// A researched market with a non-PASS recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    pub scored: ScoredMarket,
    pub verdict: ResearchVerdict,
}

impl Opportunity {
    /// Pair a market with its verdict, refusing PASS and failed verdicts.
    pub fn new(scored: ScoredMarket, verdict: ResearchVerdict) -> Option<Self> {
        if verdict.success && verdict.recommendation.is_actionable() {
            Some(Self { scored, verdict })
        } else {
            None
        }
    }

    pub fn market(&self) -> &MarketSnapshot {
        &self.scored.market
    }
}

// ---------------------------------------------------------------------------
// Scan outcome
// ---------------------------------------------------------------------------

/// How a scan run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanStatus {
    /// Research loop ran over every selected market.
    Completed,
    /// The venue returned zero open markets.
    NoMarkets,
    /// No market reached the minimum alpha score.
    NoQualifyingMarkets,
    /// The venue could not be reached or refused our credentials.
    AcquisitionFailed(String),
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanStatus::Completed => write!(f, "completed"),
            ScanStatus::NoMarkets => write!(f, "no open markets"),
            ScanStatus::NoQualifyingMarkets => write!(f, "no qualifying markets"),
            ScanStatus::AcquisitionFailed(reason) => write!(f, "acquisition failed: {reason}"),
        }
    }
}

/// Counters collected while a scan runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    pub markets_fetched: usize,
    pub markets_qualified: usize,
    pub markets_researched: usize,
    pub research_failures: usize,
    pub passes: usize,
}

/// Everything a scan run hands back to its caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanOutcome {
    pub status: ScanStatus,
    pub opportunities: Vec<Opportunity>,
    pub stats: ScanStats,
    /// Rendered report. Only produced once the research loop has run.
    pub report: Option<String>,
    pub started_at: DateTime<Utc>,
}

impl ScanOutcome {
    /// Outcome for a run that stopped before the research loop.
    pub fn early_exit(status: ScanStatus, stats: ScanStats, started_at: DateTime<Utc>) -> Self {
        Self {
            status,
            opportunities: Vec::new(),
            stats,
            report: None,
            started_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types.
#[derive(Debug, thiserror::Error)]
pub enum AlphaError {
    #[error("Venue error ({venue}): {message}")]
    Venue { venue: String, message: String },

    #[error("Authentication failed ({venue}): {message}")]
    Authentication { venue: String, message: String },

    #[error("LLM error ({model}): {message}")]
    Llm { model: String, message: String },

    #[error("Missing credential: environment variable {0} is not set")]
    MissingCredential(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
