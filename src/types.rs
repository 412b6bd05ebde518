//! Shared types for GE ORACLE.
//!
//! The data model flowing between the price source, the profit
//! calculator, the recommendation engine and the renderer. Kept free of
//! I/O so every layer can depend on it without cycles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Amount of gold pieces available for one computation.
pub type Capital = u64;

/// Numeric Grand Exchange item identifier.
pub type ItemId = u32;

// ---------------------------------------------------------------------------
// Item catalog
// ---------------------------------------------------------------------------

/// A tradeable item from the catalog snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    /// Units per GE buy-limit window. `None` means unbounded.
    pub buy_limit: Option<u64>,
    /// Acquisition cost basis (the catalog's high-alchemy valuation).
    pub reference_buy_price: Option<u64>,
    pub members: bool,
    /// Store value, informational only.
    pub value: Option<u64>,
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let limit = self
            .buy_limit
            .map(|l| l.to_string())
            .unwrap_or_else(|| "unbounded".to_string());
        let price = self
            .reference_buy_price
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".to_string());
        write!(f, "{} (#{}, buy {price} gp, limit {limit})", self.name, self.id)
    }
}

impl Item {
    /// Helper to build a test/sample item.
    #[cfg(test)]
    pub fn sample(id: ItemId, name: &str, buy_price: u64, limit: Option<u64>) -> Self {
        Item {
            id,
            name: name.to_string(),
            buy_limit: limit,
            reference_buy_price: Some(buy_price),
            members: false,
            value: None,
        }
    }
}

/// Catalog snapshot keyed by item name, preserving response order.
///
/// Names are unique: inserting a second item with an existing name is
/// rejected and the first-seen entry is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    items: Vec<Item>,
    by_name: HashMap<String, usize>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an item. Returns `false` if the name was already present.
    pub fn insert(&mut self, item: Item) -> bool {
        if self.by_name.contains_key(&item.name) {
            return false;
        }
        self.by_name.insert(item.name.clone(), self.items.len());
        self.items.push(item);
        true
    }

    pub fn get(&self, name: &str) -> Option<&Item> {
        self.by_name.get(name).map(|&idx| &self.items[idx])
    }

    /// Items in catalog iteration order.
    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.iter()
    }

    /// All item identifiers in the snapshot.
    pub fn ids(&self) -> BTreeSet<ItemId> {
        self.items.iter().map(|i| i.id).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl FromIterator<Item> for Catalog {
    fn from_iter<T: IntoIterator<Item = Item>>(iter: T) -> Self {
        let mut catalog = Catalog::new();
        for item in iter {
            catalog.insert(item);
        }
        catalog
    }
}

// ---------------------------------------------------------------------------
// Quotes
// ---------------------------------------------------------------------------

/// Latest instant-buy (high) and instant-sell (low) trade for an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub high: Option<u64>,
    pub high_time: Option<DateTime<Utc>>,
    pub low: Option<u64>,
    pub low_time: Option<DateTime<Utc>>,
}

impl PriceQuote {
    /// Quote with prices only, no timestamps.
    pub fn new(high: Option<u64>, low: Option<u64>) -> Self {
        Self {
            high,
            high_time: None,
            low,
            low_time: None,
        }
    }
}

impl fmt::Display for PriceQuote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |p: Option<u64>| p.map(|v| v.to_string()).unwrap_or_else(|| "-".into());
        write!(f, "high {} / low {}", show(self.high), show(self.low))
    }
}

/// Result of one batched quote fetch: a quote or explicit absence per
/// requested identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuoteBook {
    quotes: HashMap<ItemId, Option<PriceQuote>>,
}

impl QuoteBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every requested identifier marked absent. Used when the fetch fails.
    pub fn all_absent(ids: &BTreeSet<ItemId>) -> Self {
        Self {
            quotes: ids.iter().map(|id| (*id, None)).collect(),
        }
    }

    pub fn insert(&mut self, id: ItemId, quote: Option<PriceQuote>) {
        self.quotes.insert(id, quote);
    }

    /// The quote for `id`, or `None` if absent or never requested.
    pub fn get(&self, id: ItemId) -> Option<&PriceQuote> {
        self.quotes.get(&id).and_then(|q| q.as_ref())
    }

    /// Number of identifiers that actually have a quote.
    pub fn quoted_count(&self) -> usize {
        self.quotes.values().filter(|q| q.is_some()).count()
    }

    /// Number of identifiers covered (quoted or absent).
    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Recommendations
// ---------------------------------------------------------------------------

/// One ranked trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub item_id: ItemId,
    pub item_name: String,
    /// Net profit per gp committed. Negative means a loss.
    pub profit_ratio: f64,
    pub high_price: Option<u64>,
    pub low_price: Option<u64>,
    pub max_units: u64,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({:+.3} per gp, {} units)",
            self.item_name, self.profit_ratio, self.max_units
        )
    }
}

/// Ranked output of one recommendation round.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RecommendationSet {
    /// Capital the ranking was computed for. `None` when no valid capital
    /// was supplied.
    pub capital: Option<Capital>,
    pub items: Vec<Recommendation>,
}

impl RecommendationSet {
    pub fn empty(capital: Option<Capital>) -> Self {
        Self {
            capital,
            items: Vec::new(),
        }
    }

    /// Sum of the profit ratios. Dimensionless, display only.
    pub fn total_profit_ratio(&self) -> f64 {
        self.items.iter().map(|r| r.profit_ratio).sum()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Recoverable failure conditions.
#[derive(Debug, thiserror::Error)]
pub enum TraderError {
    #[error("Invalid gp amount: {0:?}")]
    InvalidCapitalInput(String),

    #[error("Price data unavailable ({operation}): {cause}")]
    DataUnavailable { operation: String, cause: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl TraderError {
    pub fn data_unavailable(operation: &str, cause: impl fmt::Display) -> Self {
        TraderError::DataUnavailable {
            operation: operation.to_string(),
            cause: cause.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
