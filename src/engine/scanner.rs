//! Scan orchestrator.
//!
//! One run walks five phases in order and never goes back:
//! acquire → filter/rank → truncate → research loop → report.
//! Only the research loop talks to the reasoning service, and it does so
//! one market at a time with a pause between calls.

use chrono::Utc;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::pacing::Pacer;
use super::report::ReportBuilder;
use super::research::Researcher;
use crate::config::ScanConfig;
use crate::platforms::MarketSource;
use crate::strategy::{select, AlphaScorer};
use crate::types::{Opportunity, ScanOutcome, ScanStats, ScanStatus};

/// Thresholds the orchestrator applies to every run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanSettings {
    pub min_alpha_score: u32,
    /// Maximum number of research calls per run. Always at least 1.
    pub top_n: usize,
}

impl From<&ScanConfig> for ScanSettings {
    fn from(cfg: &ScanConfig) -> Self {
        Self {
            min_alpha_score: cfg.min_alpha_score,
            top_n: cfg.top_n.max(1),
        }
    }
}

pub struct ScanOrchestrator {
    source: Box<dyn MarketSource>,
    researcher: Researcher,
    scorer: AlphaScorer,
    pacer: Box<dyn Pacer>,
    report: ReportBuilder,
    settings: ScanSettings,
}

impl ScanOrchestrator {
    pub fn new(
        source: Box<dyn MarketSource>,
        researcher: Researcher,
        scorer: AlphaScorer,
        pacer: Box<dyn Pacer>,
        settings: ScanSettings,
    ) -> Self {
        Self {
            source,
            researcher,
            scorer,
            pacer,
            report: ReportBuilder::default(),
            settings: ScanSettings {
                top_n: settings.top_n.max(1),
                ..settings
            },
        }
    }

    pub fn with_report(mut self, report: ReportBuilder) -> Self {
        self.report = report;
        self
    }

    pub fn settings(&self) -> ScanSettings {
        self.settings
    }

    /// Run one complete scan. Every failure mode is reported through the
    /// returned `ScanOutcome` status.
    pub async fn run(&self) -> ScanOutcome {
        let run_id = Uuid::new_v4();
        let span = info_span!("scan", run_id = %run_id);
        self.run_phases().instrument(span).await
    }

    async fn run_phases(&self) -> ScanOutcome {
        let started_at = Utc::now();
        let mut stats = ScanStats::default();

        info!(
            min_alpha_score = self.settings.min_alpha_score,
            top_n = self.settings.top_n,
            policy = ?self.scorer.policy(),
            "Starting Kalshi alpha scan"
        );

        // 1. Acquire
        let markets = match self.source.fetch_open_markets().await {
            Ok(m) => m,
            Err(e) => {
                error!(error = %e, "Failed to fetch markets");
                return ScanOutcome::early_exit(
                    ScanStatus::AcquisitionFailed(format!("{e:#}")),
                    stats,
                    started_at,
                );
            }
        };
        stats.markets_fetched = markets.len();

        if markets.is_empty() {
            warn!("No markets found");
            return ScanOutcome::early_exit(ScanStatus::NoMarkets, stats, started_at);
        }

        // 2. Filter and rank
        let mut selected = select(
            &markets,
            &self.scorer,
            self.settings.min_alpha_score,
            Utc::now(),
        );
        stats.markets_qualified = selected.len();

        if selected.is_empty() {
            warn!(
                min_alpha_score = self.settings.min_alpha_score,
                "No markets reached the minimum alpha score"
            );
            return ScanOutcome::early_exit(ScanStatus::NoQualifyingMarkets, stats, started_at);
        }

        // 3. Truncate
        selected.truncate(self.settings.top_n);
        let total = selected.len();
        info!(count = total, "Researching top markets");

        // 4. Research loop
        let mut opportunities = Vec::new();
        for (idx, scored) in selected.into_iter().enumerate() {
            info!(
                n = idx + 1,
                of = total,
                ticker = %scored.market.ticker,
                score = scored.score,
                title = %scored.market.title,
                "Researching market"
            );

            let verdict = self.researcher.research(&scored.market).await;
            stats.markets_researched += 1;

            if !verdict.success {
                stats.research_failures += 1;
                warn!(ticker = %scored.market.ticker, "Research unsuccessful, skipping");
            } else if let Some(opp) = Opportunity::new(scored, verdict) {
                info!(
                    ticker = %opp.market().ticker,
                    recommendation = %opp.verdict.recommendation,
                    confidence = %opp.verdict.confidence,
                    "Opportunity found"
                );
                opportunities.push(opp);
            } else {
                stats.passes += 1;
            }

            if idx + 1 < total {
                self.pacer.pause().await;
            }
        }

        // 5. Report
        let report = self.report.render(&opportunities, started_at, Utc::now());
        info!(
            opportunities = opportunities.len(),
            researched = stats.markets_researched,
            failures = stats.research_failures,
            passes = stats.passes,
            "Scan complete"
        );

        ScanOutcome {
            status: ScanStatus::Completed,
            opportunities,
            stats,
            report: Some(report),
            started_at,
        }
    }
}
