//! Kalshi market listing.
//!
//! Uses `GET /markets?status=open` on the trade API v2, following the
//! response cursor for a bounded number of pages.
//!
//! Base URL: https://api.elections.kalshi.com/trade-api/v2
//! Auth: `Authorization: Bearer {token}` (API key or `/login` session token).

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::auth::{authenticate, KalshiCredentials, Session};
use super::MarketSource;
use crate::config::KalshiConfig;
use crate::types::{AlphaError, MarketSnapshot};

const VENUE: &str = "kalshi";

// ---------------------------------------------------------------------------
// API response types (Kalshi JSON → Rust)
// ---------------------------------------------------------------------------

/// One `/markets` page. Items stay as raw JSON so a single malformed
/// market can be dropped without losing the page.
#[derive(Debug, Deserialize)]
struct MarketsPage {
    #[serde(default)]
    markets: Vec<serde_json::Value>,
    #[serde(default)]
    cursor: Option<String>,
}

/// One market as returned by `/markets`. Only the fields we score on.
#[derive(Debug, Deserialize)]
struct KalshiMarket {
    #[serde(default)]
    ticker: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    yes_bid: Option<f64>,
    #[serde(default)]
    no_bid: Option<f64>,
    #[serde(default)]
    volume: Option<f64>,
    #[serde(default)]
    open_interest: Option<f64>,
    #[serde(default)]
    close_time: Option<String>,
}

/// Status and body of one `/markets` request.
#[derive(Debug, Clone)]
struct RawResponse {
    status: StatusCode,
    body: String,
}

/// The HTTP side of market listing, separated from paging and
/// re-authentication so those can run against scripted responses.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
trait MarketsTransport: Send + Sync {
    /// Issue one `/markets` request with the current session.
    async fn get_markets(&self, cursor: Option<String>) -> Result<RawResponse>;

    /// Replace the current session.
    async fn relogin(&self) -> Result<()>;

    /// Whether a 401 can be answered by logging in again.
    fn can_relogin(&self) -> bool;
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Kalshi REST client. Holds its own credentials and session.
pub struct KalshiClient {
    http: Client,
    base_url: String,
    credentials: KalshiCredentials,
    session: RwLock<Option<Session>>,
    page_limit: u32,
    max_pages: u32,
}

impl KalshiClient {
    pub fn new(cfg: &KalshiConfig, credentials: KalshiCredentials) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(cfg.timeout_secs))
            .user_agent(concat!("kalshi-alpha/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client for Kalshi")?;

        Ok(Self {
            http,
            base_url: cfg.base_url.trim().trim_end_matches('/').to_string(),
            credentials,
            session: RwLock::new(None),
            page_limit: cfg.page_limit,
            max_pages: cfg.max_pages.max(1),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> &KalshiCredentials {
        &self.credentials
    }

    // -- Authentication ----------------------------------------------------

    /// Authenticate now and keep the session. Used by diagnostics and
    /// implicitly by the first fetch.
    pub async fn login(&self) -> Result<()> {
        let session = authenticate(&self.http, &self.base_url, &self.credentials).await?;
        *self.session.write().await = session;
        Ok(())
    }

    async fn ensure_session(&self) -> Result<()> {
        if self.session.read().await.is_none() && self.can_relogin() {
            self.login().await?;
        }
        Ok(())
    }

    async fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        match self.session.read().await.as_ref() {
            Some(session) => req.bearer_auth(session.token()),
            None => req,
        }
    }

    /// Convert a raw Kalshi market into a snapshot. Missing numbers become
    /// zero and an unparseable close time becomes `None`.
    fn to_snapshot(m: KalshiMarket) -> MarketSnapshot {
        let finite = |v: Option<f64>| v.filter(|n| n.is_finite()).unwrap_or(0.0);
        let cents = |v: Option<f64>| finite(v).clamp(0.0, 100.0).round() as u32;
        let count = |v: Option<f64>| finite(v).max(0.0);

        let ticker = m.ticker.unwrap_or_default();
        let close_time = m.close_time.as_deref().and_then(|s| {
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| {
                    debug!(ticker = %ticker, close_time = s, error = %e, "Unparseable close time")
                })
                .ok()
        });

        MarketSnapshot {
            yes_bid: cents(m.yes_bid),
            no_bid: cents(m.no_bid),
            volume: count(m.volume),
            open_interest: count(m.open_interest),
            close_time,
            category: m.category.unwrap_or_default(),
            title: m.title.unwrap_or_default(),
            ticker,
        }
    }
}

#[async_trait]
impl MarketsTransport for KalshiClient {
    async fn get_markets(&self, cursor: Option<String>) -> Result<RawResponse> {
        self.ensure_session().await?;

        let limit = self.page_limit.to_string();
        let mut query: Vec<(&str, &str)> = vec![("status", "open"), ("limit", limit.as_str())];
        if let Some(c) = cursor.as_deref() {
            query.push(("cursor", c));
        }
        let url = format!("{}/markets", self.base_url);

        debug!(url = %url, cursor = ?cursor, "Fetching Kalshi markets page");

        let resp = self
            .authorized(self.http.get(&url).query(&query))
            .await
            .send()
            .await
            .context("Kalshi markets request failed")?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .context("Failed to read Kalshi markets response")?;
        Ok(RawResponse { status, body })
    }

    async fn relogin(&self) -> Result<()> {
        self.login().await
    }

    fn can_relogin(&self) -> bool {
        !matches!(self.credentials, KalshiCredentials::Anonymous)
    }
}

// ---------------------------------------------------------------------------
// Paging
// ---------------------------------------------------------------------------

/// Fetch one page of open markets, re-authenticating at most once on 401.
async fn fetch_page(transport: &dyn MarketsTransport, cursor: Option<&str>) -> Result<MarketsPage> {
    let cursor = cursor.map(str::to_string);
    let mut resp = transport.get_markets(cursor.clone()).await?;

    if resp.status == StatusCode::UNAUTHORIZED && transport.can_relogin() {
        warn!("Kalshi session rejected, re-authenticating...");
        transport.relogin().await?;
        resp = transport
            .get_markets(cursor)
            .await
            .context("Kalshi markets retry failed")?;
    }

    let status = resp.status;
    if !status.is_success() {
        let message = format!("{status}: {}", resp.body);
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(AlphaError::Authentication { venue: VENUE.into(), message }.into());
        }
        return Err(AlphaError::Venue { venue: VENUE.into(), message }.into());
    }

    serde_json::from_str(&resp.body).context("Failed to parse Kalshi markets response")
}

/// Decode raw market items, dropping any that do not fit the expected shape.
fn decode_markets(items: Vec<serde_json::Value>) -> Vec<MarketSnapshot> {
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<KalshiMarket>(item) {
            Ok(m) => Some(KalshiClient::to_snapshot(m)),
            Err(e) => {
                debug!(error = %e, "Skipping malformed Kalshi market");
                None
            }
        })
        .collect()
}

/// Follow the response cursor until it runs out, a page comes back empty,
/// or `max_pages` requests have been made.
async fn collect_pages(
    transport: &dyn MarketsTransport,
    max_pages: u32,
) -> Result<Vec<MarketSnapshot>> {
    let mut markets = Vec::new();
    let mut cursor: Option<String> = None;

    for page_no in 1..=max_pages.max(1) {
        let page = fetch_page(transport, cursor.as_deref()).await?;
        let count = page.markets.len();
        let decoded = decode_markets(page.markets);
        if decoded.len() < count {
            warn!(page = page_no, dropped = count - decoded.len(), "Dropped malformed Kalshi markets");
        }
        markets.extend(decoded);
        debug!(page = page_no, count, "Kalshi page fetched");

        cursor = page.cursor.filter(|c| !c.is_empty());
        if cursor.is_none() || count == 0 {
            break;
        }
    }

    Ok(markets)
}

// ---------------------------------------------------------------------------
// MarketSource implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl MarketSource for KalshiClient {
    async fn fetch_open_markets(&self) -> Result<Vec<MarketSnapshot>> {
        info!(max_pages = self.max_pages, "Fetching active Kalshi markets...");
        let markets = collect_pages(self, self.max_pages).await?;
        info!(count = markets.len(), "Found active markets");
        Ok(markets)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
