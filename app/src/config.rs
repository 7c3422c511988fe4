//! Environment-driven configuration.

use std::time::Duration;

use thiserror::Error;

pub const BASE_URL_VAR: &str = "TASKS_API_URL";
pub const TIMEOUT_VAR: &str = "TASKS_API_TIMEOUT_SECS";
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("TASKS_API_URL must be an http:// or https:// URL, got {0:?}")]
    InvalidBaseUrl(String),
    #[error("TASKS_API_TIMEOUT_SECS must be a positive number of seconds, got {0:?}")]
    InvalidTimeout(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub base_url: String,
    /// `None` leaves requests without a deadline.
    pub timeout: Option<Duration>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let base_url = match get(BASE_URL_VAR) {
            Some(raw) => parse_base_url(&raw)?,
            None => DEFAULT_BASE_URL.to_string(),
        };
        let timeout = get(TIMEOUT_VAR).map(|raw| parse_timeout(&raw)).transpose()?;

        Ok(Self { base_url, timeout })
    }
}

fn parse_base_url(raw: &str) -> Result<String, ConfigError> {
    let url = raw.trim().trim_end_matches('/');
    let host = url
        .strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"))
        .ok_or_else(|| ConfigError::InvalidBaseUrl(raw.to_string()))?;
    if host.is_empty() {
        return Err(ConfigError::InvalidBaseUrl(raw.to_string()));
    }
    Ok(url.to_string())
}

fn parse_timeout(raw: &str) -> Result<Duration, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidTimeout(raw.to_string())),
    }
}
