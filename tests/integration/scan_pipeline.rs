//! End-to-end scan scenarios.

use chrono::Utc;
use std::sync::atomic::Ordering;

use kalshi_alpha::engine::{FixedDelay, Researcher, ScanOrchestrator, ScanSettings};
use kalshi_alpha::strategy::{select, AlphaScorer, ScoringPolicy};
use kalshi_alpha::types::{Confidence, Recommendation, ScanStatus};

use crate::mock_platform::*;

fn settings(min_alpha_score: u32, top_n: usize) -> ScanSettings {
    ScanSettings {
        min_alpha_score,
        top_n,
    }
}

#[test]
fn test_select_keeps_two_highest_in_order() {
    // Fed, 20k volume, 20k OI, no close date, 95¢ YES: 3 + 2 + 1 = 6
    let six = market("SIX", "Fed decision", "Economics", 20_000.0, 20_000.0, 95, None);
    // Fed, nothing else: 3
    let three = market("THREE", "Fed decision", "Economics", 0.0, 0.0, 95, None);
    // Off-topic under the gated policy: 0
    let zero = sports_market("ZERO");

    let scorer = AlphaScorer::default();
    let now = Utc::now();
    assert_eq!(scorer.score(&six, now), 6);
    assert_eq!(scorer.score(&three, now), 3);
    assert_eq!(scorer.score(&zero, now), 0);

    let picked = select(&[three, zero, six], &scorer, 2, now);
    let tickers: Vec<_> = picked.iter().map(|s| s.market.ticker.as_str()).collect();
    assert_eq!(tickers, ["SIX", "THREE"]);
    assert_eq!(picked[0].score, 6);
    assert_eq!(picked[1].score, 3);
}

#[tokio::test]
async fn test_top_n_caps_research_calls() {
    let markets = (1..=5).map(|i| fed_market(&format!("KXFED-{i}"))).collect();
    let research = MockResearch::always("Recommendation: BUY NO. Confidence: LOW");
    let prompts = research.prompt_log();
    let pacer = CountingPacer::default();
    let pauses = pacer.counter();

    let orch = ScanOrchestrator::new(
        Box::new(MockVenue::with_markets(markets)),
        Researcher::new(Box::new(research)),
        AlphaScorer::default(),
        Box::new(pacer),
        settings(2, 2),
    );
    let outcome = orch.run().await;

    assert_eq!(outcome.status, ScanStatus::Completed);
    assert_eq!(prompts.lock().unwrap().len(), 2);
    assert!(pauses.load(Ordering::SeqCst) <= 1);
    assert_eq!(outcome.opportunities.len(), 2);
    assert!(prompts.lock().unwrap()[0].contains("KXFED-1"));
    assert!(prompts.lock().unwrap()[1].contains("KXFED-2"));
}

#[tokio::test]
async fn test_all_pass_reports_zero() {
    let markets = vec![fed_market("A"), fed_market("B"), fed_market("C")];
    let research = MockResearch::always("The price looks right to me. PASS.");

    let orch = ScanOrchestrator::new(
        Box::new(MockVenue::with_markets(markets)),
        Researcher::new(Box::new(research)),
        AlphaScorer::default(),
        Box::new(FixedDelay::from_secs(0)),
        settings(2, 5),
    );
    let outcome = orch.run().await;

    assert_eq!(outcome.status, ScanStatus::Completed);
    assert!(outcome.opportunities.is_empty());
    assert_eq!(outcome.stats.passes, 3);
    let report = outcome.report.unwrap();
    assert!(report.contains("Found 0 actionable opportunities"));
    assert!(report.contains("No BUY recommendations today."));
}

#[tokio::test]
async fn test_empty_venue_never_researches() {
    let venue = MockVenue::with_markets(Vec::new());
    let fetches = venue.fetch_counter();
    let research = MockResearch::always("BUY YES");
    let prompts = research.prompt_log();

    let orch = ScanOrchestrator::new(
        Box::new(venue),
        Researcher::new(Box::new(research)),
        AlphaScorer::default(),
        Box::new(CountingPacer::default()),
        settings(2, 5),
    );
    let outcome = orch.run().await;

    assert_eq!(outcome.status, ScanStatus::NoMarkets);
    assert_eq!(fetches.load(Ordering::SeqCst), 1);
    assert!(prompts.lock().unwrap().is_empty());
    assert!(outcome.opportunities.is_empty());
    assert!(outcome.report.is_none());
}

#[tokio::test]
async fn test_venue_failure_is_reported_not_raised() {
    let research = MockResearch::always("BUY YES");
    let prompts = research.prompt_log();

    let orch = ScanOrchestrator::new(
        Box::new(MockVenue::failing("Authentication failed (kalshi): 401")),
        Researcher::new(Box::new(research)),
        AlphaScorer::default(),
        Box::new(CountingPacer::default()),
        settings(2, 5),
    );
    let outcome = orch.run().await;

    assert!(matches!(outcome.status, ScanStatus::AcquisitionFailed(ref r) if r.contains("401")));
    assert!(prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_mixed_results_keep_rank_order() {
    // Extra open interest puts BEST on top; MID and LAST tie and keep venue order.
    let mut best = fed_market("BEST");
    best.open_interest = 90_000.0;
    let markets = vec![fed_market("MID"), sports_market("OFF"), best, fed_market("LAST")];

    let research = MockResearch::scripted(
        vec![
            Ok("Strong evidence. BUY YES, HIGH confidence."),
            Err("connection reset by peer"),
        ],
        "Mispriced. BUY NO, MEDIUM confidence.",
    );
    let pacer = CountingPacer::default();
    let pauses = pacer.counter();

    let orch = ScanOrchestrator::new(
        Box::new(MockVenue::with_markets(markets)),
        Researcher::new(Box::new(research)),
        AlphaScorer::default(),
        Box::new(pacer),
        settings(2, 5),
    );
    let outcome = orch.run().await;

    assert_eq!(outcome.status, ScanStatus::Completed);
    assert_eq!(outcome.stats.markets_fetched, 4);
    assert_eq!(outcome.stats.markets_qualified, 3);
    assert_eq!(outcome.stats.markets_researched, 3);
    assert_eq!(outcome.stats.research_failures, 1);
    assert_eq!(pauses.load(Ordering::SeqCst), 2);

    let opps = &outcome.opportunities;
    assert_eq!(opps.len(), 2);
    assert_eq!(opps[0].market().ticker, "BEST");
    assert_eq!(opps[0].verdict.recommendation, Recommendation::BuyYes);
    assert_eq!(opps[0].verdict.confidence, Confidence::High);
    assert_eq!(opps[1].market().ticker, "LAST");
    assert_eq!(opps[1].verdict.recommendation, Recommendation::BuyNo);

    let report = outcome.report.unwrap();
    let first = report.find("Ticker: BEST").unwrap();
    let second = report.find("Ticker: LAST").unwrap();
    assert!(first < second);
    assert!(!report.contains("Ticker: MID"));
}

#[tokio::test]
async fn test_graded_policy_admits_related_topics() {
    let crypto = market(
        "KXBTC-26DEC",
        "Bitcoin above $150k on Dec 31?",
        "Crypto",
        60_000.0,
        20_000.0,
        30,
        Some(40),
    );

    // Noise penalty with nothing to offset it.
    let thin_sports = market("NBA-G1", "Lakers vs Celtics", "Sports", 0.0, 0.0, 97, None);

    let gated = AlphaScorer::new(ScoringPolicy::Gated);
    assert_eq!(gated.score(&crypto, Utc::now()), 0);

    let research = MockResearch::always("BUY YES with LOW confidence");
    let orch = ScanOrchestrator::new(
        Box::new(MockVenue::with_markets(vec![crypto, thin_sports])),
        Researcher::new(Box::new(research)),
        AlphaScorer::new(ScoringPolicy::Graded),
        Box::new(CountingPacer::default()),
        settings(2, 5),
    );
    let outcome = orch.run().await;

    assert_eq!(outcome.status, ScanStatus::Completed);
    assert_eq!(outcome.stats.markets_qualified, 1);
    assert_eq!(outcome.opportunities.len(), 1);
    assert_eq!(outcome.opportunities[0].market().ticker, "KXBTC-26DEC");
}
