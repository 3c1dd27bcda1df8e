//! Venue integrations.
//!
//! Defines the `MarketSource` trait consumed by the scan orchestrator and
//! the Kalshi REST implementation with its credential handling.

pub mod auth;
pub mod kalshi;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::MarketSnapshot;

/// A venue that can list its currently open markets.
///
/// Zero open markets is a valid answer, not an error. Errors mean the venue
/// could not be reached or refused our credentials.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketSource: Send + Sync {
    /// Fetch a point-in-time snapshot of every open market.
    async fn fetch_open_markets(&self) -> Result<Vec<MarketSnapshot>>;
}
