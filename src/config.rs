//! Configuration module for environment variables and application settings

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use url::Url;

const DEFAULT_API_URL: &str = "http://127.0.0.1:5000/";
const DEFAULT_TOKEN_CHECK_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct Config {
    /// Journal API configuration
    pub api: ApiConfig,

    /// Token lifecycle configuration
    pub session: SessionConfig,

    /// Account used by commands that need to log in
    pub credentials: Option<CredentialsConfig>,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: Url,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Tokens expiring within this window are refreshed before use
    pub expiry_margin: chrono::Duration,
    /// Period of the background token check
    pub check_interval: Duration,
}

#[derive(Clone)]
pub struct CredentialsConfig {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup; unset or unparsable numbers
    /// fall back to their defaults, as does a zero token-check period.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let number = |key: &str, default: u64| -> u64 {
            lookup(key)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default)
        };

        let raw_url = lookup("DREAM_JOURNAL_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let base_url = Url::parse(&raw_url)
            .with_context(|| format!("DREAM_JOURNAL_API_URL is not a valid URL: {raw_url}"))?;

        let credentials = match (
            lookup("DREAM_JOURNAL_USERNAME"),
            lookup("DREAM_JOURNAL_PASSWORD"),
        ) {
            (Some(username), Some(password)) => Some(CredentialsConfig { username, password }),
            _ => None,
        };

        Ok(Self {
            api: ApiConfig {
                base_url,
                timeout: Duration::from_secs(number("DREAM_JOURNAL_HTTP_TIMEOUT_SECS", 30)),
            },
            session: SessionConfig {
                expiry_margin: chrono::Duration::seconds(
                    number("DREAM_JOURNAL_TOKEN_MARGIN_SECS", 300) as i64,
                ),
                check_interval: Duration::from_secs(
                    match number("DREAM_JOURNAL_TOKEN_CHECK_SECS", DEFAULT_TOKEN_CHECK_SECS) {
                        0 => DEFAULT_TOKEN_CHECK_SECS,
                        secs => secs,
                    },
                ),
            },
            credentials,
        })
    }
}
