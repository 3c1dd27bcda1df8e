//! Alpha scoring.
//!
//! Maps one market snapshot to a non-negative integer score: a heuristic
//! proxy for how much research could say about the market, not a
//! probability. Two named policies exist; one is picked when the scorer is
//! built and its weights can be overridden from config.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use super::keywords::{classify_topic, TopicMatch};
use crate::config::ScoringConfig;
use crate::types::MarketSnapshot;

// ---------------------------------------------------------------------------
// Policy & weights
// ---------------------------------------------------------------------------

/// Named scoring strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringPolicy {
    /// Off-topic markets score 0 outright; everything else is additive.
    #[default]
    Gated,
    /// Off-topic markets keep scoring, with a small bonus for related topics,
    /// a penalty for sports/entertainment and a penalty for far horizons.
    Graded,
}

impl ScoringPolicy {
    pub fn default_weights(&self) -> ScoringWeights {
        match self {
            ScoringPolicy::Gated => ScoringWeights {
                topic_bonus: 3,
                related_topic_bonus: 0,
                noise_topic_penalty: 0,
                volume_tiers: vec![
                    Tier::new(50_000.0, 3),
                    Tier::new(10_000.0, 2),
                    Tier::new(5_000.0, 1),
                ],
                open_interest_tiers: vec![Tier::new(50_000.0, 2), Tier::new(10_000.0, 1)],
                horizon_min_days: 3,
                horizon_max_days: 90,
                horizon_bonus: 2,
                imminent_penalty: 1,
                far_horizon_penalty: 0,
                odds_low: 0.20,
                odds_high: 0.80,
                odds_bonus: 2,
            },
            ScoringPolicy::Graded => ScoringWeights {
                topic_bonus: 3,
                related_topic_bonus: 1,
                noise_topic_penalty: 2,
                volume_tiers: vec![
                    Tier::new(100_000.0, 3),
                    Tier::new(50_000.0, 2),
                    Tier::new(10_000.0, 1),
                ],
                open_interest_tiers: vec![Tier::new(50_000.0, 2), Tier::new(10_000.0, 1)],
                horizon_min_days: 3,
                horizon_max_days: 60,
                horizon_bonus: 2,
                imminent_penalty: 1,
                far_horizon_penalty: 1,
                odds_low: 0.20,
                odds_high: 0.80,
                odds_bonus: 2,
            },
        }
    }
}

/// A threshold bonus: `points` when the value is strictly above `above`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Tier {
    pub above: f64,
    pub points: i32,
}

impl Tier {
    pub const fn new(above: f64, points: i32) -> Self {
        Self { above, points }
    }
}

/// Tunable constants for a scoring policy. Penalties are magnitudes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScoringWeights {
    pub topic_bonus: i32,
    pub related_topic_bonus: i32,
    pub noise_topic_penalty: i32,
    pub volume_tiers: Vec<Tier>,
    pub open_interest_tiers: Vec<Tier>,
    pub horizon_min_days: i64,
    pub horizon_max_days: i64,
    pub horizon_bonus: i32,
    pub imminent_penalty: i32,
    pub far_horizon_penalty: i32,
    pub odds_low: f64,
    pub odds_high: f64,
    pub odds_bonus: i32,
}

impl ScoringWeights {
    /// Reject weights that would invert a band or flip a penalty's sign.
    pub fn validate(&self) -> Result<(), String> {
        let penalties = [
            ("noise_topic_penalty", self.noise_topic_penalty),
            ("imminent_penalty", self.imminent_penalty),
            ("far_horizon_penalty", self.far_horizon_penalty),
        ];
        if let Some((name, _)) = penalties.iter().find(|(_, v)| *v < 0) {
            return Err(format!("{name} is a magnitude and must not be negative"));
        }
        if !(0.0..=1.0).contains(&self.odds_low) || !(0.0..=1.0).contains(&self.odds_high) {
            return Err("odds_low and odds_high must lie within 0..=1".into());
        }
        if self.odds_low > self.odds_high {
            return Err(format!(
                "odds_low ({}) exceeds odds_high ({})",
                self.odds_low, self.odds_high
            ));
        }
        if self.horizon_min_days > self.horizon_max_days {
            return Err(format!(
                "horizon_min_days ({}) exceeds horizon_max_days ({})",
                self.horizon_min_days, self.horizon_max_days
            ));
        }
        let mut tiers = self.volume_tiers.iter().chain(&self.open_interest_tiers);
        if tiers.any(|t| !t.above.is_finite()) {
            return Err("tier thresholds must be finite".into());
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Breakdown
// ---------------------------------------------------------------------------

/// Per-term contributions, kept for debug logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreBreakdown {
    /// Set when the gated policy rejected the market on topic.
    pub gated_out: bool,
    pub topic: i32,
    pub liquidity: i32,
    pub interest: i32,
    pub horizon: i32,
    pub odds: i32,
}

impl ScoreBreakdown {
    /// Unclamped sum of all terms.
    pub fn raw(&self) -> i32 {
        [self.liquidity, self.interest, self.horizon, self.odds]
            .into_iter()
            .fold(self.topic, i32::saturating_add)
    }

    /// Final score, floored at zero.
    pub fn total(&self) -> u32 {
        if self.gated_out {
            0
        } else {
            self.raw().max(0) as u32
        }
    }
}

// ---------------------------------------------------------------------------
// Scorer
// ---------------------------------------------------------------------------

/// Pure, deterministic market scorer.
#[derive(Debug, Clone)]
pub struct AlphaScorer {
    policy: ScoringPolicy,
    weights: ScoringWeights,
}

impl AlphaScorer {
    pub fn new(policy: ScoringPolicy) -> Self {
        Self::with_weights(policy, policy.default_weights())
    }

    pub fn with_weights(policy: ScoringPolicy, mut weights: ScoringWeights) -> Self {
        // Tier lookup takes the first match, so highest thresholds go first.
        let by_threshold_desc = |a: &Tier, b: &Tier| b.above.total_cmp(&a.above);
        weights.volume_tiers.sort_by(by_threshold_desc);
        weights.open_interest_tiers.sort_by(by_threshold_desc);
        Self { policy, weights }
    }

    pub fn from_config(cfg: &ScoringConfig) -> Self {
        match &cfg.weights {
            Some(w) => Self::with_weights(cfg.policy, w.clone()),
            None => Self::new(cfg.policy),
        }
    }

    pub fn policy(&self) -> ScoringPolicy {
        self.policy
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Score a market relative to `now`.
    pub fn score(&self, market: &MarketSnapshot, now: DateTime<Utc>) -> u32 {
        let breakdown = self.breakdown(market, now);
        debug!(
            ticker = %market.ticker,
            gated_out = breakdown.gated_out,
            topic = breakdown.topic,
            liquidity = breakdown.liquidity,
            interest = breakdown.interest,
            horizon = breakdown.horizon,
            odds = breakdown.odds,
            total = breakdown.total(),
            "Scored market"
        );
        breakdown.total()
    }

    /// Compute every term of the score.
    pub fn breakdown(&self, market: &MarketSnapshot, now: DateTime<Utc>) -> ScoreBreakdown {
        let w = &self.weights;

        let topic = match (classify_topic(market), self.policy) {
            (TopicMatch::Core, _) => w.topic_bonus,
            (_, ScoringPolicy::Gated) => {
                return ScoreBreakdown {
                    gated_out: true,
                    ..ScoreBreakdown::default()
                };
            }
            (TopicMatch::Related, ScoringPolicy::Graded) => w.related_topic_bonus,
            (TopicMatch::Noise, ScoringPolicy::Graded) => w.noise_topic_penalty.saturating_neg(),
            (TopicMatch::Unmatched, ScoringPolicy::Graded) => 0,
        };

        ScoreBreakdown {
            gated_out: false,
            topic,
            liquidity: tier_points(&w.volume_tiers, market.volume),
            interest: tier_points(&w.open_interest_tiers, market.open_interest),
            horizon: self.horizon_points(market, now),
            odds: self.odds_points(market),
        }
    }

    /// Bonus inside the research window, penalty outside it, zero when the
    /// close time is unknown.
    fn horizon_points(&self, market: &MarketSnapshot, now: DateTime<Utc>) -> i32 {
        let w = &self.weights;
        match market.days_until_close(now) {
            None => 0,
            Some(days) if days < w.horizon_min_days => w.imminent_penalty.saturating_neg(),
            Some(days) if days <= w.horizon_max_days => w.horizon_bonus,
            Some(_) => w.far_horizon_penalty.saturating_neg(),
        }
    }

    /// Bonus when the implied YES probability sits in the balanced band.
    /// A missing bid counts as an even market.
    fn odds_points(&self, market: &MarketSnapshot) -> i32 {
        let w = &self.weights;
        let prob = if market.yes_bid == 0 {
            0.5
        } else {
            market.yes_probability()
        };
        if (w.odds_low..=w.odds_high).contains(&prob) {
            w.odds_bonus
        } else {
            0
        }
    }
}

impl Default for AlphaScorer {
    fn default() -> Self {
        Self::new(ScoringPolicy::default())
    }
}

fn tier_points(tiers: &[Tier], value: f64) -> i32 {
    // NaN compares false everywhere and falls through to zero.
    tiers
        .iter()
        .find(|t| value > t.above)
        .map(|t| t.points)
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
