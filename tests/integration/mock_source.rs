//! Mock price source for integration testing.
//!
//! Provides a deterministic `PriceSource` that serves a fixed catalog and
//! quote snapshot, counts calls and can be forced to fail. Everything stays
//! in-memory with no network.

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use ge_oracle::prices::PriceSource;
use ge_oracle::types::*;

/// Shared handles so tests can inspect or re-configure the source after
/// handing a clone to the recommender.
#[derive(Clone, Default)]
pub struct MockPriceSource {
    items: Vec<Item>,
    quotes: HashMap<ItemId, PriceQuote>,
    catalog_calls: Arc<Mutex<u32>>,
    quote_calls: Arc<Mutex<u32>>,
    requested: Arc<Mutex<Vec<BTreeSet<ItemId>>>>,
    fail_catalog: Arc<Mutex<Option<String>>>,
    fail_quotes: Arc<Mutex<bool>>,
}

pub fn item(id: ItemId, name: &str, buy_price: Option<u64>, limit: Option<u64>) -> Item {
    Item {
        id,
        name: name.to_string(),
        buy_limit: limit,
        reference_buy_price: buy_price,
        members: false,
        value: None,
    }
}

impl MockPriceSource {
    pub fn new(items: Vec<Item>, quotes: Vec<(ItemId, u64, u64)>) -> Self {
        Self {
            items,
            quotes: quotes
                .into_iter()
                .map(|(id, high, low)| (id, PriceQuote::new(Some(high), Some(low))))
                .collect(),
            ..Self::default()
        }
    }

    /// Catalog {A: id 1, buy 100, limit 5; B: id 2, buy 50, unbounded}
    /// with quotes {1: 150/140, 2: 40/35}.
    pub fn two_item_scenario() -> Self {
        Self::new(
            vec![item(1, "A", Some(100), Some(5)), item(2, "B", Some(50), None)],
            vec![(1, 150, 140), (2, 40, 35)],
        )
    }

    /// A slice of the real catalog with realistic prices. Some items have
    /// no quote and one has no alchemy value.
    pub fn grand_exchange_snapshot() -> Self {
        Self::new(
            vec![
                item(2, "Cannonball", Some(3), Some(11_000)),
                item(453, "Coal", Some(27), Some(13_000)),
                item(440, "Iron ore", Some(21), Some(13_000)),
                item(561, "Nature rune", Some(108), Some(18_000)),
                item(1515, "Yew logs", Some(96), Some(25_000)),
                item(4151, "Abyssal whip", Some(72_000), Some(70)),
                item(11832, "Bandos chestplate", Some(159_000), Some(8)),
                item(1061, "Leather boots", Some(3), Some(125)),
                item(1923, "Bowl", Some(2), None),
                item(6685, "Saradomin brew(4)", Some(120), Some(2_000)),
                item(385, "Shark", Some(180), Some(10_000)),
                item(13190, "Old school bond", None, Some(100)),
                item(20997, "Twisted bow", Some(720_000), Some(8)),
                item(1944, "Egg", Some(2), Some(13_000)),
            ],
            vec![
                (2, 185, 182),
                (453, 142, 140),
                (440, 56, 54),
                (561, 95, 92),
                (1515, 182, 176),
                (4151, 1_520_000, 1_500_000),
                (11832, 13_900_000, 13_800_000),
                (1061, 112, 98),
                (1923, 3, 2),
                (6685, 6_200, 6_150),
                (385, 780, 770),
                (13190, 9_100_000, 9_050_000),
                (20997, 1_180_000_000, 1_175_000_000),
            ],
        )
    }

    pub fn set_catalog_error(&self, msg: &str) {
        *self.fail_catalog.lock().unwrap() = Some(msg.to_string());
    }

    pub fn clear_catalog_error(&self) {
        *self.fail_catalog.lock().unwrap() = None;
    }

    pub fn set_quotes_failing(&self, failing: bool) {
        *self.fail_quotes.lock().unwrap() = failing;
    }

    pub fn catalog_calls(&self) -> u32 {
        *self.catalog_calls.lock().unwrap()
    }

    pub fn quote_calls(&self) -> u32 {
        *self.quote_calls.lock().unwrap()
    }

    /// The id sets passed to each `fetch_quotes` call.
    pub fn requested(&self) -> Vec<BTreeSet<ItemId>> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl PriceSource for MockPriceSource {
    async fn fetch_catalog(&self) -> Result<Catalog, TraderError> {
        *self.catalog_calls.lock().unwrap() += 1;
        if let Some(msg) = self.fail_catalog.lock().unwrap().as_ref() {
            return Err(TraderError::data_unavailable("fetch_catalog", msg));
        }
        Ok(self.items.iter().cloned().collect())
    }

    async fn fetch_quotes(&self, ids: &BTreeSet<ItemId>) -> QuoteBook {
        *self.quote_calls.lock().unwrap() += 1;
        self.requested.lock().unwrap().push(ids.clone());

        if *self.fail_quotes.lock().unwrap() {
            return QuoteBook::all_absent(ids);
        }

        let mut book = QuoteBook::new();
        for id in ids {
            book.insert(*id, self.quotes.get(id).copied());
        }
        book
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
