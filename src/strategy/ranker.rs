//! Filter and rank scored markets.

use chrono::{DateTime, Utc};
use tracing::info;

use super::alpha::AlphaScorer;
use crate::types::{MarketSnapshot, ScoredMarket};

/// Drop markets scoring below `min_score` and order the rest best-first.
///
/// The sort is stable, so equal scores keep their input order.
pub fn rank(scored: Vec<ScoredMarket>, min_score: u32) -> Vec<ScoredMarket> {
    let mut kept: Vec<ScoredMarket> = scored
        .into_iter()
        .filter(|s| s.score >= min_score)
        .collect();
    kept.sort_by(|a, b| b.score.cmp(&a.score));
    kept
}

/// Score every market with `scorer`, then filter and rank.
pub fn select(
    markets: &[MarketSnapshot],
    scorer: &AlphaScorer,
    min_score: u32,
    now: DateTime<Utc>,
) -> Vec<ScoredMarket> {
    let scored = markets
        .iter()
        .map(|m| ScoredMarket {
            market: m.clone(),
            score: scorer.score(m, now),
        })
        .collect();

    let ranked = rank(scored, min_score);
    info!(
        input = markets.len(),
        kept = ranked.len(),
        min_score,
        "Filtered to high-alpha markets"
    );
    ranked
}
