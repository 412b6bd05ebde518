//! OSRS Wiki real-time prices integration.
//!
//! API docs: https://prices.runescape.wiki/api/v1/osrs
//! Endpoints: `/mapping` (item catalog), `/latest` (instant high/low).
//! The API asks every client to send a descriptive User-Agent.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::PriceSource;
use crate::config::ApiConfig;
use crate::types::{Catalog, Item, ItemId, PriceQuote, QuoteBook, TraderError};

const SOURCE_NAME: &str = "osrs-wiki";

// ---------------------------------------------------------------------------
// API response types (wiki JSON → Rust)
// ---------------------------------------------------------------------------

/// One `/mapping` entry. Only the fields we need are deserialized.
#[derive(Debug, Deserialize)]
struct MappingEntry {
    id: ItemId,
    name: String,
    /// GE buy limit; absent for items without a published limit.
    #[serde(default, alias = "buy_limit")]
    limit: Option<u64>,
    /// High-alchemy value, used as the reference buy price.
    #[serde(default, alias = "high_alch")]
    highalch: Option<u64>,
    #[serde(default)]
    members: bool,
    #[serde(default)]
    value: Option<u64>,
}

impl From<MappingEntry> for Item {
    fn from(e: MappingEntry) -> Self {
        Item {
            id: e.id,
            name: e.name,
            buy_limit: e.limit,
            reference_buy_price: e.highalch,
            members: e.members,
            value: e.value,
        }
    }
}

/// The live API returns a list; older snapshots are keyed by id string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MappingResponse {
    List(Vec<MappingEntry>),
    Keyed(BTreeMap<String, MappingEntry>),
}

/// One `/latest` entry. Any field may be null for thinly traded items.
#[derive(Debug, Deserialize)]
struct LatestEntry {
    #[serde(default)]
    high: Option<u64>,
    #[serde(default, rename = "highTime")]
    high_time: Option<i64>,
    #[serde(default)]
    low: Option<u64>,
    #[serde(default, rename = "lowTime")]
    low_time: Option<i64>,
}

/// `{"data": {...}}` from the live API, or a bare id → entry map.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LatestResponse {
    Envelope { data: HashMap<String, LatestEntry> },
    Bare(HashMap<String, LatestEntry>),
}

impl LatestResponse {
    fn into_entries(self) -> HashMap<String, LatestEntry> {
        match self {
            LatestResponse::Envelope { data } => data,
            LatestResponse::Bare(map) => map,
        }
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse a `/mapping` body into a catalog.
///
/// List responses keep their order; keyed responses are ordered by item id.
/// Duplicate names keep the first entry.
pub fn parse_catalog(body: &str) -> Result<Catalog> {
    let response: MappingResponse =
        serde_json::from_str(body).context("Failed to parse mapping response")?;

    let entries = match response {
        MappingResponse::List(list) => list,
        MappingResponse::Keyed(map) => {
            let mut list: Vec<MappingEntry> = map.into_values().collect();
            list.sort_by_key(|e| e.id);
            list
        }
    };

    let mut catalog = Catalog::new();
    for entry in entries {
        let name = entry.name.clone();
        if !catalog.insert(Item::from(entry)) {
            debug!(name = %name, "Duplicate item name in mapping, keeping first");
        }
    }
    Ok(catalog)
}

/// Parse a `/latest` body, keeping only the requested identifiers.
///
/// Requested ids missing from the body, or present with neither a high
/// nor a low price, are recorded as absent.
pub fn parse_quotes(body: &str, ids: &BTreeSet<ItemId>) -> Result<QuoteBook> {
    let response: LatestResponse =
        serde_json::from_str(body).context("Failed to parse latest response")?;

    let mut by_id: HashMap<ItemId, LatestEntry> = HashMap::new();
    for (key, entry) in response.into_entries() {
        match key.parse::<ItemId>() {
            Ok(id) => {
                by_id.insert(id, entry);
            }
            Err(_) => debug!(key = %key, "Skipping non-numeric quote key"),
        }
    }

    let mut book = QuoteBook::new();
    for id in ids {
        let quote = by_id.remove(id).and_then(|e| {
            if e.high.is_none() && e.low.is_none() {
                return None;
            }
            Some(PriceQuote {
                high: e.high,
                high_time: e.high_time.and_then(secs_to_datetime),
                low: e.low,
                low_time: e.low_time.and_then(secs_to_datetime),
            })
        });
        book.insert(*id, quote);
    }
    Ok(book)
}

/// Convert a wiki timestamp (seconds since epoch) to `DateTime<Utc>`.
fn secs_to_datetime(secs: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0).single()
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Why a quote attempt failed, and whether another attempt may help.
enum FetchFailure {
    Retryable(String),
    Fatal(String),
}

/// Delay before retry number `attempt` (1-based): `base * 2^(attempt - 1)`,
/// saturating instead of overflowing.
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
}

/// OSRS Wiki prices client.
pub struct WikiPriceClient {
    http: Client,
    base_url: String,
    quote_retries: u32,
    retry_backoff: Duration,
}

impl WikiPriceClient {
    /// Build a client from the `[api]` config section.
    pub fn new(cfg: &ApiConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        for (name, value) in &cfg.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .with_context(|| format!("Invalid header name in config: {name}"))?;
            let value = HeaderValue::from_str(value)
                .with_context(|| format!("Invalid header value for {name}"))?;
            headers.insert(name, value);
        }

        let http = Client::builder()
            .timeout(cfg.timeout())
            .user_agent(cfg.user_agent.clone())
            .default_headers(headers)
            .build()
            .context("Failed to build HTTP client for OSRS Wiki")?;

        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            quote_retries: cfg.quote_retries,
            retry_backoff: Duration::from_millis(cfg.retry_backoff_ms),
        })
    }

    fn mapping_url(&self) -> String {
        format!("{}/mapping", self.base_url)
    }

    fn latest_url(&self, ids: &BTreeSet<ItemId>) -> String {
        let joined = ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(",");
        format!("{}/latest?ids={}", self.base_url, urlencoding::encode(&joined))
    }

    async fn get_catalog(&self) -> Result<Catalog> {
        let url = self.mapping_url();
        debug!(url = %url, "Fetching item mapping");

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .context("Mapping request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Mapping API error {status}: {body}");
        }

        let body = resp.text().await.context("Failed to read mapping body")?;
        parse_catalog(&body)
    }

    /// One attempt at the batched quote request.
    async fn try_quotes(&self, url: &str, ids: &BTreeSet<ItemId>) -> Result<QuoteBook, FetchFailure> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| FetchFailure::Retryable(format!("Request error: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let msg = format!("HTTP {status}: {body}");
            return Err(if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                FetchFailure::Retryable(msg)
            } else {
                FetchFailure::Fatal(msg)
            });
        }

        let body = resp
            .text()
            .await
            .map_err(|e| FetchFailure::Retryable(format!("Body read error: {e}")))?;
        parse_quotes(&body, ids).map_err(|e| FetchFailure::Fatal(format!("{e:#}")))
    }

    /// Batched quote request with bounded retry + exponential backoff.
    async fn get_quotes(&self, ids: &BTreeSet<ItemId>) -> Result<QuoteBook> {
        let url = self.latest_url(ids);
        let mut last_error = None;

        for attempt in 0..=self.quote_retries {
            if attempt > 0 {
                let delay = backoff_delay(self.retry_backoff, attempt);
                debug!(attempt, delay_ms = delay.as_millis() as u64, "Retrying quote fetch");
                tokio::time::sleep(delay).await;
            }

            match self.try_quotes(&url, ids).await {
                Ok(book) => return Ok(book),
                Err(FetchFailure::Retryable(msg)) => {
                    warn!(attempt, error = %msg, "Retryable quote fetch error");
                    last_error = Some(msg);
                }
                Err(FetchFailure::Fatal(msg)) => anyhow::bail!("Quote fetch failed: {msg}"),
            }
        }

        anyhow::bail!(
            "Quote fetch failed after {} retries: {}",
            self.quote_retries,
            last_error.unwrap_or_default()
        )
    }
}

// ---------------------------------------------------------------------------
// PriceSource trait implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl PriceSource for WikiPriceClient {
    async fn fetch_catalog(&self) -> Result<Catalog, TraderError> {
        match self.get_catalog().await {
            Ok(catalog) => {
                info!(items = catalog.len(), "Item catalog fetched");
                Ok(catalog)
            }
            Err(e) => Err(TraderError::data_unavailable("fetch_catalog", format!("{e:#}"))),
        }
    }

    async fn fetch_quotes(&self, ids: &BTreeSet<ItemId>) -> QuoteBook {
        if ids.is_empty() {
            return QuoteBook::new();
        }

        match self.get_quotes(ids).await {
            Ok(book) => {
                info!(
                    requested = ids.len(),
                    quoted = book.quoted_count(),
                    "Quotes fetched"
                );
                book
            }
            Err(e) => {
                error!(
                    operation = "fetch_quotes",
                    requested = ids.len(),
                    error = %format!("{e:#}"),
                    "Quote fetch failed, treating every item as unquoted"
                );
                QuoteBook::all_absent(ids)
            }
        }
    }

    fn name(&self) -> &'static str {
        SOURCE_NAME
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
