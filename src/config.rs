//! Configuration loading from TOML.
//!
//! Reads `config.toml` (or the path in `GE_ORACLE_CONFIG`) and
//! deserializes into strongly-typed structs. Every section has defaults,
//! so a missing file or a partial file is fine.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::engine::recommender::DEFAULT_TOP_N;
use crate::types::TraderError;

/// Environment variable overriding the config file path.
pub const CONFIG_PATH_ENV: &str = "GE_ORACLE_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
/// Upper bound for `api.quote_retries`.
pub const MAX_QUOTE_RETRIES: u32 = 10;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub trading: TradingConfig,
    pub logging: LoggingConfig,
}

/// Pricing API endpoint and request behaviour.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Extra retries for the batched quote fetch. The catalog is never retried.
    pub quote_retries: u32,
    pub retry_backoff_ms: u64,
    /// Additional headers sent with every request.
    pub headers: BTreeMap<String, String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://prices.runescape.wiki/api/v1/osrs".to_string(),
            user_agent: "ge-oracle/0.1.0 (grand-exchange profit ranker)".to_string(),
            timeout_secs: 30,
            quote_retries: 2,
            retry_backoff_ms: 500,
            headers: BTreeMap::from([("PriceCalc".to_string(), "Cheeto".to_string())]),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Tax rule and ranking size.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct TradingConfig {
    /// Sell-side tax in basis points (100 = 1%).
    pub tax_rate_bps: u32,
    /// Maximum tax charged on a single sale, in gp.
    pub tax_cap: u64,
    /// Number of recommendations returned per round.
    pub top_n: usize,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            tax_rate_bps: 100,
            tax_cap: 5_000_000,
            top_n: DEFAULT_TOP_N,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Application log file. The terminal is reserved for the table.
    pub file: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: "app.log".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::from_toml(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// The config path from `GE_ORACLE_CONFIG`, or `config.toml`.
    pub fn default_path() -> String {
        std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make every round meaningless.
    pub fn validate(&self) -> Result<(), TraderError> {
        if self.api.base_url.trim().is_empty() {
            return Err(TraderError::Config("api.base_url must not be empty".into()));
        }
        if self.api.quote_retries > MAX_QUOTE_RETRIES {
            return Err(TraderError::Config(format!(
                "api.quote_retries must be <= {MAX_QUOTE_RETRIES}, got {}",
                self.api.quote_retries
            )));
        }
        if self.trading.top_n == 0 {
            return Err(TraderError::Config("trading.top_n must be at least 1".into()));
        }
        if self.trading.tax_rate_bps > 10_000 {
            return Err(TraderError::Config(format!(
                "trading.tax_rate_bps must be <= 10000, got {}",
                self.trading.tax_rate_bps
            )));
        }
        Ok(())
    }
}
