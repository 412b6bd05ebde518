//! Price data sources.
//!
//! Defines the `PriceSource` trait and provides the OSRS Wiki
//! real-time prices implementation.

pub mod wiki;

use async_trait::async_trait;
use std::collections::BTreeSet;

use crate::types::{Catalog, ItemId, QuoteBook, TraderError};

/// Abstraction over a Grand Exchange price feed.
///
/// One recommendation round calls `fetch_catalog` once and
/// `fetch_quotes` once with every catalog identifier.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Fetch the item catalog (names, ids, buy limits, reference prices).
    ///
    /// Fails with `TraderError::DataUnavailable` on network or parse errors.
    async fn fetch_catalog(&self) -> Result<Catalog, TraderError>;

    /// Fetch the latest high/low quote for every identifier in one batch.
    ///
    /// Never fails: on error every requested identifier is marked absent.
    async fn fetch_quotes(&self, ids: &BTreeSet<ItemId>) -> QuoteBook;

    /// Source name for logging.
    fn name(&self) -> &'static str;
}
