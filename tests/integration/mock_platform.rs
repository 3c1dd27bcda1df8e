//! Mock venue and research service for integration testing.
//!
//! Deterministic, in-memory stand-ins for Kalshi and Claude. Both record
//! how they were called so tests can assert on call counts and order.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use kalshi_alpha::engine::Pacer;
use kalshi_alpha::llm::ResearchService;
use kalshi_alpha::platforms::MarketSource;
use kalshi_alpha::types::MarketSnapshot;

/// A venue serving a fixed list of markets.
pub struct MockVenue {
    markets: Vec<MarketSnapshot>,
    fetches: Arc<AtomicUsize>,
    /// If set, every fetch returns this error.
    force_error: Option<String>,
}

impl MockVenue {
    pub fn with_markets(markets: Vec<MarketSnapshot>) -> Self {
        Self {
            markets,
            fetches: Arc::new(AtomicUsize::new(0)),
            force_error: None,
        }
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            force_error: Some(msg.to_string()),
            ..Self::with_markets(Vec::new())
        }
    }

    /// Shared fetch counter, still readable after the venue is boxed.
    pub fn fetch_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.fetches)
    }
}

#[async_trait]
impl MarketSource for MockVenue {
    async fn fetch_open_markets(&self) -> Result<Vec<MarketSnapshot>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        match &self.force_error {
            Some(msg) => Err(anyhow!("{msg}")),
            None => Ok(self.markets.clone()),
        }
    }
}

/// A research service replaying scripted responses in order.
///
/// When the script runs out, the fallback response is used.
pub struct MockResearch {
    script: Mutex<VecDeque<Result<String, String>>>,
    fallback: String,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockResearch {
    /// Always answer with `response`.
    pub fn always(response: &str) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: response.to_string(),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Answer from `script` first (`Err` entries simulate call failures).
    pub fn scripted(script: Vec<Result<&str, &str>>, fallback: &str) -> Self {
        let script = script
            .into_iter()
            .map(|r| r.map(str::to_string).map_err(str::to_string))
            .collect();
        Self {
            script: Mutex::new(script),
            fallback: fallback.to_string(),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every prompt received so far, in call order.
    pub fn prompt_log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.prompts)
    }
}

#[async_trait]
impl ResearchService for MockResearch {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match self.script.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(msg)) => Err(anyhow!("{msg}")),
            None => Ok(self.fallback.clone()),
        }
    }
}

/// Pacer that only counts how often it was asked to wait.
#[derive(Default)]
pub struct CountingPacer {
    pauses: Arc<AtomicUsize>,
}

impl CountingPacer {
    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.pauses)
    }
}

#[async_trait]
impl Pacer for CountingPacer {
    async fn pause(&self) {
        self.pauses.fetch_add(1, Ordering::SeqCst);
    }
}

/// Build a market. `close_in_days = None` leaves the close time unset.
pub fn market(
    ticker: &str,
    title: &str,
    category: &str,
    volume: f64,
    open_interest: f64,
    yes_bid: u32,
    close_in_days: Option<i64>,
) -> MarketSnapshot {
    MarketSnapshot {
        ticker: ticker.to_string(),
        title: title.to_string(),
        category: category.to_string(),
        yes_bid,
        no_bid: 100u32.saturating_sub(yes_bid + 2),
        volume,
        open_interest,
        close_time: close_in_days.map(|d| Utc::now() + Duration::days(d) + Duration::hours(6)),
    }
}

/// A liquid Fed market that clears the default policy with room to spare.
pub fn fed_market(ticker: &str) -> MarketSnapshot {
    market(
        ticker,
        "Will the Fed cut interest rates at the next FOMC meeting?",
        "Economics",
        80_000.0,
        30_000.0,
        42,
        Some(21),
    )
}

/// A sports market the default policy gates out.
pub fn sports_market(ticker: &str) -> MarketSnapshot {
    market(
        ticker,
        "Will the Lakers win the NBA championship?",
        "Sports",
        900_000.0,
        400_000.0,
        35,
        Some(30),
    )
}
