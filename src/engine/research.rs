//! Research step: one market in, one verdict out.
//!
//! Builds the research prompt, sends it to the configured
//! `ResearchService`, and classifies the free-text answer. Failures of the
//! outbound call are folded into a failed verdict here and never reach the
//! orchestrator as errors.

use tracing::{debug, info, warn};

use super::classifier;
use super::report::format_thousands;
use crate::llm::ResearchService;
use crate::types::{MarketSnapshot, ResearchVerdict};

pub struct Researcher {
    service: Box<dyn ResearchService>,
}

impl Researcher {
    pub fn new(service: Box<dyn ResearchService>) -> Self {
        Self { service }
    }

    /// Research one market. Never fails: service errors become a verdict
    /// with `success == false`, PASS and UNKNOWN.
    pub async fn research(&self, market: &MarketSnapshot) -> ResearchVerdict {
        let prompt = build_prompt(market);
        debug!(ticker = %market.ticker, prompt_len = prompt.len(), "Sending research request");

        match self.service.complete(&prompt).await {
            Ok(response) => {
                let (recommendation, confidence) = classifier::classify(&response);
                info!(
                    ticker = %market.ticker,
                    recommendation = %recommendation,
                    confidence = %confidence,
                    "Research complete"
                );
                ResearchVerdict {
                    recommendation,
                    confidence,
                    narrative: response,
                    success: true,
                }
            }
            Err(e) => {
                warn!(ticker = %market.ticker, error = %e, "Research failed");
                ResearchVerdict::failed(format!("{e:#}"))
            }
        }
    }
}

/// Build the research prompt for a single market.
pub fn build_prompt(market: &MarketSnapshot) -> String {
    let close_date = market
        .close_time
        .map(|t| t.format("%B %d, %Y").to_string())
        .unwrap_or_else(|| "Unknown".to_string());

    let mut prompt = String::with_capacity(2048);

    prompt.push_str(
        "You are an expert prediction market analyst researching Kalshi opportunities.\n\n",
    );

    prompt.push_str("MARKET DETAILS:\n");
    prompt.push_str(&format!("Title: {}\n", market.title));
    prompt.push_str(&format!("Category: {}\n", market.category));
    prompt.push_str(&format!("Ticker: {}\n\n", market.ticker));

    prompt.push_str("CURRENT MARKET ODDS:\n");
    prompt.push_str(&format!("- YES: {:.1}%\n", market.yes_probability() * 100.0));
    prompt.push_str(&format!("- NO: {:.1}%\n\n", market.no_probability() * 100.0));

    prompt.push_str("MARKET INFO:\n");
    prompt.push_str(&format!("- Volume: ${}\n", format_thousands(market.volume)));
    prompt.push_str(&format!("- Closes: {close_date}\n\n"));

    prompt.push_str(
        "Search the web for current information, expert predictions and data on this \
         question. Form your own probability estimate independently of the market price \
         above, then decide whether the market is mispriced.\n\n",
    );

    prompt.push_str("Provide:\n");
    prompt.push_str("- Research summary\n");
    prompt.push_str("- Key factors\n");
    prompt.push_str("- Your true probability estimate\n");
    prompt.push_str("- Recommendation: exactly one of BUY YES, BUY NO, or PASS\n");
    prompt.push_str("- Confidence: exactly one of HIGH, MEDIUM, LOW, or UNKNOWN\n");
    prompt.push_str("- Position size suggestion\n");
    prompt.push_str("- Reasoning with sources\n\n");

    prompt.push_str(
        "Default to PASS. Only recommend BUY YES or BUY NO if there is clear evidence \
         of mispricing.",
    );

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockResearchService;
    use crate::types::{Confidence, Recommendation};
    use chrono::{TimeZone, Utc};

    fn market() -> MarketSnapshot {
        let mut m = MarketSnapshot::sample();
        m.volume = 1_250_000.0;
        m.close_time = Some(Utc.with_ymd_and_hms(2026, 12, 10, 19, 0, 0).unwrap());
        m
    }

    #[test]
    fn test_prompt_contains_market_details() {
        let prompt = build_prompt(&market());
        assert!(prompt.contains("Title: Will the Fed hold the interest rate in December?"));
        assert!(prompt.contains("Category: Economics"));
        assert!(prompt.contains("Ticker: KXFEDDECISION-26DEC-H0"));
        assert!(prompt.contains("YES: 45.0%"));
        assert!(prompt.contains("NO: 53.0%"));
        assert!(prompt.contains("Volume: $1,250,000"));
        assert!(prompt.contains("Closes: December 10, 2026"));
    }

    #[test]
    fn test_prompt_instructions() {
        let prompt = build_prompt(&market());
        assert!(prompt.contains("Search the web"));
        assert!(prompt.contains("independently of the market price"));
        assert!(prompt.contains("BUY YES, BUY NO, or PASS"));
        assert!(prompt.contains("HIGH, MEDIUM, LOW, or UNKNOWN"));
        assert!(prompt.contains("Default to PASS"));
    }

    #[test]
    fn test_prompt_missing_close_and_bids() {
        let mut m = market();
        m.close_time = None;
        m.yes_bid = 0;
        m.no_bid = 0;
        let prompt = build_prompt(&m);
        assert!(prompt.contains("Closes: Unknown"));
        assert!(prompt.contains("YES: 0.0%"));
        assert!(prompt.contains("NO: 0.0%"));
    }

    #[tokio::test]
    async fn test_research_classifies_response() {
        let mut service = MockResearchService::new();
        service
            .expect_complete()
            .withf(|prompt| prompt.contains("KXFEDDECISION-26DEC-H0"))
            .times(1)
            .returning(|_| Ok("Estimate 62%. Recommendation: BUY YES. Confidence: MEDIUM".into()));

        let verdict = Researcher::new(Box::new(service)).research(&market()).await;
        assert!(verdict.success);
        assert_eq!(verdict.recommendation, Recommendation::BuyYes);
        assert_eq!(verdict.confidence, Confidence::Medium);
        assert!(verdict.narrative.contains("Estimate 62%"));
    }

    #[tokio::test]
    async fn test_research_failure_never_raises() {
        let mut service = MockResearchService::new();
        service
            .expect_complete()
            .times(1)
            .returning(|_| Err(anyhow::anyhow!("connection reset")));

        let verdict = Researcher::new(Box::new(service)).research(&market()).await;
        assert!(!verdict.success);
        assert_eq!(verdict.recommendation, Recommendation::Pass);
        assert_eq!(verdict.confidence, Confidence::Unknown);
        assert!(verdict.narrative.contains("connection reset"));
    }

    #[tokio::test]
    async fn test_research_unlabelled_response_is_pass() {
        let mut service = MockResearchService::new();
        service
            .expect_complete()
            .returning(|_| Ok("The market looks fairly priced.".into()));

        let verdict = Researcher::new(Box::new(service)).research(&market()).await;
        assert!(verdict.success);
        assert_eq!(verdict.recommendation, Recommendation::Pass);
        assert_eq!(verdict.confidence, Confidence::Unknown);
    }
}
