//! Kalshi credentials and session handshake.
//!
//! Credentials are resolved once at start-up into an explicit value and
//! handed to the client; nothing reads the environment after that. A
//! `Session` lives inside the client for the duration of one run.

use anyhow::{Context, Result};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

use crate::config::{AppConfig, KalshiConfig};
use crate::types::AlphaError;

const VENUE: &str = "kalshi";

/// How we prove who we are to Kalshi.
pub enum KalshiCredentials {
    /// Pre-issued API key, sent as a bearer token.
    ApiKey(SecretString),
    /// Email/password exchanged for a session token at `/login`.
    Login { email: String, password: SecretString },
    /// No credentials: public read endpoints only.
    Anonymous,
}

impl KalshiCredentials {
    /// Resolve credentials from the environment variables named in config.
    ///
    /// An API key wins over email/password. With neither set the client runs
    /// anonymously; an email without a password is an error.
    pub fn from_env(cfg: &KalshiConfig) -> Result<Self, AlphaError> {
        if let Ok(key) = AppConfig::resolve_secret(&cfg.api_key_env) {
            return Ok(Self::ApiKey(key));
        }

        match AppConfig::resolve_env(&cfg.email_env) {
            Ok(email) => {
                let password = AppConfig::resolve_secret(&cfg.password_env)?;
                Ok(Self::Login { email, password })
            }
            Err(_) => {
                warn!(
                    api_key_env = %cfg.api_key_env,
                    email_env = %cfg.email_env,
                    "No Kalshi credentials configured, using public endpoints"
                );
                Ok(Self::Anonymous)
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::ApiKey(_) => "api-key",
            Self::Login { .. } => "login",
            Self::Anonymous => "anonymous",
        }
    }
}

impl fmt::Debug for KalshiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApiKey(_) => write!(f, "ApiKey(********)"),
            Self::Login { email, .. } => write!(f, "Login {{ email: {email:?}, password: ******** }}"),
            Self::Anonymous => write!(f, "Anonymous"),
        }
    }
}

/// An authenticated session: the bearer token sent with every request.
pub struct Session {
    token: SecretString,
}

impl Session {
    pub fn new(token: SecretString) -> Self {
        Self { token }
    }

    pub fn token(&self) -> &str {
        self.token.expose_secret()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"********")
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    member_id: Option<String>,
}

/// Exchange credentials for a session.
///
/// Returns `Ok(None)` for anonymous access. API keys need no round-trip.
pub async fn authenticate(
    http: &Client,
    base_url: &str,
    credentials: &KalshiCredentials,
) -> Result<Option<Session>> {
    match credentials {
        KalshiCredentials::Anonymous => Ok(None),
        KalshiCredentials::ApiKey(key) => Ok(Some(Session::new(SecretString::new(
            key.expose_secret().clone(),
        )))),
        KalshiCredentials::Login { email, password } => {
            info!("Authenticating with Kalshi...");

            let resp = http
                .post(format!("{base_url}/login"))
                .json(&LoginRequest {
                    email,
                    password: password.expose_secret(),
                })
                .send()
                .await
                .context("Kalshi login request failed")?;

            if !resp.status().is_success() {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                return Err(AlphaError::Authentication {
                    venue: VENUE.into(),
                    message: format!("{status}: {body}"),
                }
                .into());
            }

            let login: LoginResponse = resp
                .json()
                .await
                .context("Failed to parse Kalshi login response")?;

            let token = login.token.filter(|t| !t.is_empty()).ok_or_else(|| {
                AlphaError::Authentication {
                    venue: VENUE.into(),
                    message: "login succeeded but no session token returned".into(),
                }
            })?;

            info!(member_id = ?login.member_id, "Kalshi authentication successful");
            Ok(Some(Session::new(SecretString::new(token))))
        }
    }
}
