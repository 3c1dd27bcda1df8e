//! Reasoning-service integration.
//!
//! Defines the `ResearchService` trait and the Anthropic Claude
//! implementation that researches markets with the web-search tool.

pub mod anthropic;

use anyhow::Result;
use async_trait::async_trait;

/// A text-in, text-out reasoning service able to search the web.
///
/// Implementors return the concatenated text content of the response.
/// Any transport, auth or decoding failure is an `Err`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResearchService: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

#[async_trait]
impl<T: ResearchService + ?Sized> ResearchService for std::sync::Arc<T> {
    async fn complete(&self, prompt: &str) -> Result<String> {
        (**self).complete(prompt).await
    }
}
