//! Recommendation engine.
//!
//! One round: fetch the catalog, batch-fetch quotes for every item,
//! score each quoted item with the profit calculator, stable-sort by
//! profit ratio and keep the top N. No state carries over between rounds.

use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::prices::PriceSource;
use crate::strategy::profit::{ProfitCalculator, TaxConfig};
use crate::types::{Capital, Recommendation, RecommendationSet};

/// Default number of recommendations per round.
pub const DEFAULT_TOP_N: usize = 10;

pub struct Recommender {
    source: Box<dyn PriceSource>,
    calculator: ProfitCalculator,
    top_n: usize,
}

impl Recommender {
    pub fn new(source: Box<dyn PriceSource>, calculator: ProfitCalculator, top_n: usize) -> Self {
        Self {
            source,
            calculator,
            top_n,
        }
    }

    /// Build from the `[trading]` config section.
    pub fn from_config(source: Box<dyn PriceSource>, cfg: &AppConfig) -> Self {
        Self::new(
            source,
            ProfitCalculator::new(TaxConfig::from(&cfg.trading)),
            cfg.trading.top_n,
        )
    }

    pub fn top_n(&self) -> usize {
        self.top_n
    }

    /// Rank the most profitable trades for `capital`.
    ///
    /// Returns an empty set when `capital` is `None` or the catalog is
    /// unavailable. Items without a quote are left out entirely.
    pub async fn get_recommendations(&self, capital: Option<Capital>) -> RecommendationSet {
        let Some(capital) = capital else {
            warn!("No valid gp amount supplied, skipping recommendation round");
            return RecommendationSet::empty(None);
        };

        info!(
            capital,
            source = self.source.name(),
            tax_rate_bps = self.calculator.tax().rate_bps,
            tax_cap = self.calculator.tax().cap,
            "Starting recommendation round"
        );

        let catalog = match self.source.fetch_catalog().await {
            Ok(c) => c,
            Err(e) => {
                error!(error = %e, "Catalog unavailable, no recommendations this round");
                return RecommendationSet::empty(Some(capital));
            }
        };

        let ids = catalog.ids();
        let quotes = self.source.fetch_quotes(&ids).await;

        let mut scored = Vec::with_capacity(quotes.quoted_count());
        let mut skipped = 0usize;

        for item in catalog.iter() {
            let Some(quote) = quotes.get(item.id) else {
                skipped += 1;
                continue;
            };

            let evaluation = self.calculator.evaluate(
                capital,
                item.reference_buy_price,
                item.buy_limit,
                quote.high,
                quote.low,
            );
            let (profit_ratio, max_units) = evaluation
                .map(|e| (e.profit_ratio, e.max_units))
                .unwrap_or((0.0, 0));
            debug!(item = %item, quote = %quote, profit_ratio, "Item scored");

            scored.push(Recommendation {
                item_id: item.id,
                item_name: item.name.clone(),
                profit_ratio,
                high_price: quote.high,
                low_price: quote.low,
                max_units,
            });
        }

        debug!(scored = scored.len(), skipped, "Items scored");

        // `sort_by` is stable: equal ratios keep catalog order.
        scored.sort_by(|a, b| b.profit_ratio.total_cmp(&a.profit_ratio));
        scored.truncate(self.top_n);

        let set = RecommendationSet {
            capital: Some(capital),
            items: scored,
        };

        for (rank, rec) in set.items.iter().enumerate() {
            debug!(rank = rank + 1, recommendation = %rec, "Ranked");
        }

        info!(
            catalog = catalog.len(),
            quoted = quotes.quoted_count(),
            returned = set.len(),
            total_ratio = set.total_profit_ratio(),
            "Recommendation round complete"
        );

        set
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
