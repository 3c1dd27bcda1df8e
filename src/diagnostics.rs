//! Setup diagnostics for the `check` subcommand.
//!
//! Verifies the environment, the reasoning service and the venue before a
//! real scan is attempted, and renders a PASS/FAIL table.

use tracing::{info, warn};

use crate::config::AppConfig;
use crate::llm::anthropic::AnthropicClient;
use crate::platforms::auth::KalshiCredentials;
use crate::platforms::kalshi::KalshiClient;
use crate::platforms::MarketSource;

const SAMPLE_TITLE_CHARS: usize = 60;
const MASK: &str = "********";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    pub detail: String,
}

impl CheckResult {
    pub fn pass(name: &str, detail: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            passed: true,
            detail: detail.into(),
        }
    }

    pub fn fail(name: &str, detail: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            passed: false,
            detail: detail.into(),
        }
    }
}

/// Show a value safely: secrets fully masked, anything else truncated.
pub fn mask(value: &str, secret: bool) -> String {
    if secret {
        return MASK.to_string();
    }
    let shown: String = value.chars().take(15).collect();
    if shown.len() < value.len() {
        format!("{shown}...")
    } else {
        shown
    }
}

/// Check that the variables named in config are set.
///
/// `lookup` stands in for the process environment so tests can supply
/// their own values.
pub fn check_environment<F>(cfg: &AppConfig, lookup: F) -> Vec<CheckResult>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|v| !v.is_empty());
    let mut results = Vec::with_capacity(2);

    let llm_var = &cfg.llm.api_key_env;
    results.push(match get(llm_var) {
        Some(v) => CheckResult::pass("Claude API key", format!("{llm_var}: {}", mask(&v, true))),
        None => CheckResult::fail("Claude API key", format!("{llm_var}: NOT SET")),
    });

    let k = &cfg.kalshi;
    let kalshi = if get(&k.api_key_env).is_some() {
        CheckResult::pass("Kalshi credentials", format!("{}: {MASK}", k.api_key_env))
    } else {
        match (get(&k.email_env), get(&k.password_env)) {
            (Some(email), Some(_)) => CheckResult::pass(
                "Kalshi credentials",
                format!("{}: {}, {}: {MASK}", k.email_env, mask(&email, false), k.password_env),
            ),
            (Some(_), None) => CheckResult::fail(
                "Kalshi credentials",
                format!("{} is set but {} is NOT SET", k.email_env, k.password_env),
            ),
            (None, _) => CheckResult::pass(
                "Kalshi credentials",
                "none set, public endpoints only",
            ),
        }
    };
    results.push(kalshi);

    results
}

/// Ask the reasoning service for a tiny reply.
pub async fn check_llm(client: &AnthropicClient) -> CheckResult {
    match client.ping().await {
        Ok(reply) => CheckResult::pass("Claude API", format!("{}: {}", client.model_name(), reply.trim())),
        Err(e) => CheckResult::fail("Claude API", format!("{e:#}")),
    }
}

/// Fetch markets and report how many came back, with one sample title.
pub async fn check_market_source(source: &dyn MarketSource) -> CheckResult {
    match source.fetch_open_markets().await {
        Ok(markets) => match markets.first() {
            Some(first) => {
                let title = if first.title.is_empty() { "N/A" } else { first.title.as_str() };
                let sample: String = title.chars().take(SAMPLE_TITLE_CHARS).collect();
                CheckResult::pass(
                    "Kalshi API",
                    format!("Found {} active markets. Sample: {sample}", markets.len()),
                )
            }
            None => CheckResult::fail("Kalshi API", "No markets returned"),
        },
        Err(e) => CheckResult::fail("Kalshi API", format!("{e:#}")),
    }
}

/// Authenticate, then fetch a sample of markets.
pub async fn check_venue(client: &KalshiClient) -> CheckResult {
    if let Err(e) = client.login().await {
        return CheckResult::fail("Kalshi API", format!("Authentication failed: {e:#}"));
    }
    check_market_source(client).await
}

/// Run every check in order. Later checks are still attempted when
/// earlier ones fail.
pub async fn run_checks(cfg: &AppConfig) -> Vec<CheckResult> {
    let mut results = check_environment(cfg, |name| std::env::var(name).ok());

    let llm = match AppConfig::resolve_secret(&cfg.llm.api_key_env) {
        Ok(key) => match AnthropicClient::new(key, &cfg.llm) {
            Ok(client) => check_llm(&client).await,
            Err(e) => CheckResult::fail("Claude API", format!("{e:#}")),
        },
        Err(e) => CheckResult::fail("Claude API", format!("skipped: {e}")),
    };
    results.push(llm);

    let venue = match KalshiCredentials::from_env(&cfg.kalshi) {
        Ok(creds) => match KalshiClient::new(&cfg.kalshi, creds) {
            Ok(client) => check_venue(&client).await,
            Err(e) => CheckResult::fail("Kalshi API", format!("{e:#}")),
        },
        Err(e) => CheckResult::fail("Kalshi API", format!("skipped: {e}")),
    };
    results.push(venue);

    for r in &results {
        if r.passed {
            info!(check = %r.name, detail = %r.detail, "Check passed");
        } else {
            warn!(check = %r.name, detail = %r.detail, "Check failed");
        }
    }
    results
}

pub fn all_passed(results: &[CheckResult]) -> bool {
    results.iter().all(|r| r.passed)
}

/// Render results as a PASS/FAIL table.
pub fn render(results: &[CheckResult]) -> String {
    let rule = "=".repeat(60);
    let width = results.iter().map(|r| r.name.len()).max().unwrap_or(0);
    let mut out = String::new();

    out.push_str(&format!("{rule}\nKALSHI ALPHA SETUP CHECK\n{rule}\n\n"));
    for r in results {
        let status = if r.passed { "PASS" } else { "FAIL" };
        out.push_str(&format!("  {:<width$}  {status}  {}\n", r.name, r.detail));
    }
    out.push('\n');
    if all_passed(results) {
        out.push_str("All checks passed. Run `kalshi-alpha scan` to start.\n");
    } else {
        let failed = results.iter().filter(|r| !r.passed).count();
        out.push_str(&format!("{failed} check(s) failed. Fix them before scanning.\n"));
    }
    out
}
