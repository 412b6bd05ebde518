//! Profit-per-gp calculation for a single buy/sell round trip.
//!
//! Buys at the catalog's reference price, sells at the latest high
//! price, and pays the Grand Exchange sell-side tax (a flat rate capped
//! per sale). The resulting ratio `profit / cost` is the ranking key.

use tracing::debug;

use crate::config::TradingConfig;
use crate::types::Capital;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Sell-side tax rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxConfig {
    /// Tax rate in basis points (100 = 1%).
    pub rate_bps: u32,
    /// Maximum tax per sale in gp.
    pub cap: u64,
}

impl Default for TaxConfig {
    fn default() -> Self {
        Self {
            rate_bps: 100,
            cap: 5_000_000,
        }
    }
}

impl From<&TradingConfig> for TaxConfig {
    fn from(cfg: &TradingConfig) -> Self {
        Self {
            rate_bps: cfg.tax_rate_bps,
            cap: cfg.tax_cap,
        }
    }
}

impl TaxConfig {
    /// Tax owed on `gross` gp of sale proceeds, rounded down, never above the cap.
    pub fn tax_on(&self, gross: u128) -> u128 {
        (gross.saturating_mul(u128::from(self.rate_bps)) / 10_000).min(u128::from(self.cap))
    }
}

// ---------------------------------------------------------------------------
// Calculator
// ---------------------------------------------------------------------------

/// Breakdown of one evaluated trade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeEvaluation {
    pub max_units: u64,
    pub cost: u128,
    pub gross: u128,
    pub tax: u128,
    pub net: u128,
    /// `net - cost`; negative is a loss.
    pub profit: i128,
    pub profit_ratio: f64,
}

pub struct ProfitCalculator {
    tax: TaxConfig,
}

impl ProfitCalculator {
    pub fn new(tax: TaxConfig) -> Self {
        Self { tax }
    }

    pub fn tax(&self) -> &TaxConfig {
        &self.tax
    }

    /// Most units purchasable with `capital` at `buy_price`, capped by `buy_limit`.
    pub fn max_units(capital: Capital, buy_price: u64, buy_limit: Option<u64>) -> u64 {
        if buy_price == 0 {
            return 0;
        }
        let by_capital = capital / buy_price;
        match buy_limit {
            Some(limit) => limit.min(by_capital),
            None => by_capital,
        }
    }

    /// Evaluate a trade. `None` when there is nothing to trade: no usable
    /// reference price, a missing quote side, or zero affordable units.
    pub fn evaluate(
        &self,
        capital: Capital,
        reference_buy_price: Option<u64>,
        buy_limit: Option<u64>,
        high_price: Option<u64>,
        low_price: Option<u64>,
    ) -> Option<TradeEvaluation> {
        let buy_price = reference_buy_price.filter(|p| *p > 0)?;
        let high = high_price?;
        low_price?;

        let max_units = Self::max_units(capital, buy_price, buy_limit);
        if max_units == 0 {
            return None;
        }

        let units = u128::from(max_units);
        let gross = u128::from(high) * units;
        let tax = self.tax.tax_on(gross);
        let net = gross - tax;
        let cost = u128::from(buy_price) * units;
        let profit = if net >= cost {
            i128::try_from(net - cost).unwrap_or(i128::MAX)
        } else {
            -i128::try_from(cost - net).unwrap_or(i128::MAX)
        };
        let profit_ratio = profit as f64 / cost as f64;

        Some(TradeEvaluation {
            max_units,
            cost,
            gross,
            tax,
            net,
            profit,
            profit_ratio,
        })
    }

    /// Profit per gp committed, or 0 when there is no exploitable trade.
    pub fn compute_profit_ratio(
        &self,
        capital: Capital,
        reference_buy_price: Option<u64>,
        buy_limit: Option<u64>,
        high_price: Option<u64>,
        low_price: Option<u64>,
    ) -> f64 {
        match self.evaluate(capital, reference_buy_price, buy_limit, high_price, low_price) {
            Some(eval) => {
                debug!(
                    units = eval.max_units,
                    cost = %eval.cost,
                    tax = %eval.tax,
                    profit = %eval.profit,
                    ratio = eval.profit_ratio,
                    "Trade evaluated"
                );
                eval.profit_ratio
            }
            None => 0.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
