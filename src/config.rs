//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Every section has defaults, so a partial file (or none at all) is valid.
//! Secrets are referenced by env-var name and resolved at runtime.

use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::strategy::alpha::{ScoringPolicy, ScoringWeights};
use crate::types::AlphaError;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub scan: ScanConfig,
    pub scoring: ScoringConfig,
    pub kalshi: KalshiConfig,
    pub llm: LlmConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ScanConfig {
    pub min_alpha_score: u32,
    /// Cap on research calls per run.
    pub top_n: usize,
    /// Pause between consecutive research calls.
    pub research_delay_secs: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            min_alpha_score: 2,
            top_n: 5,
            research_delay_secs: 20,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct ScoringConfig {
    pub policy: ScoringPolicy,
    /// Overrides the policy's built-in weights when present.
    pub weights: Option<ScoringWeights>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct KalshiConfig {
    pub base_url: String,
    pub page_limit: u32,
    pub max_pages: u32,
    pub timeout_secs: u64,
    pub api_key_env: String,
    pub email_env: String,
    pub password_env: String,
}

impl Default for KalshiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.elections.kalshi.com/trade-api/v2".to_string(),
            page_limit: 200,
            max_pages: 1,
            timeout_secs: 30,
            api_key_env: "KALSHI_API_KEY".to_string(),
            email_env: "KALSHI_EMAIL".to_string(),
            password_env: "KALSHI_PASSWORD".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    pub api_key_env: String,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    pub web_search_max_uses: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-20250514".to_string(),
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            max_tokens: 2000,
            timeout_secs: 90,
            web_search_max_uses: 5,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::parse(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Load from `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::load(path)
        } else {
            info!(path, "No config file found, using defaults");
            Ok(Self::default())
        }
    }

    /// Parse and validate configuration from TOML text.
    pub fn parse(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AlphaError> {
        if self.scan.top_n == 0 {
            return Err(AlphaError::Config("scan.top_n must be positive".into()));
        }
        if self.kalshi.page_limit == 0 {
            return Err(AlphaError::Config("kalshi.page_limit must be positive".into()));
        }
        if self.kalshi.max_pages == 0 {
            return Err(AlphaError::Config("kalshi.max_pages must be positive".into()));
        }
        if let Some(weights) = &self.scoring.weights {
            weights
                .validate()
                .map_err(|e| AlphaError::Config(format!("scoring.weights: {e}")))?;
        }
        Ok(())
    }

    /// Resolve an environment variable name to its value.
    pub fn resolve_env(env_name: &str) -> Result<String, AlphaError> {
        std::env::var(env_name)
            .ok()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AlphaError::MissingCredential(env_name.to_string()))
    }

    /// Resolve a secret, keeping it wrapped from the moment it is read.
    pub fn resolve_secret(env_name: &str) -> Result<SecretString, AlphaError> {
        Self::resolve_env(env_name).map(SecretString::new)
    }
}
