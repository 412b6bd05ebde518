//! End-to-end recommendation rounds.
//!
//! Exercises the recommender with the mock price source, then pipes the
//! result through the gold parser and the table renderer the same way the
//! binary does.

use ge_oracle::config::AppConfig;
use ge_oracle::display::{Renderer, TableRenderer};
use ge_oracle::engine::recommender::Recommender;
use ge_oracle::gold::parse_gold_amount;
use ge_oracle::strategy::profit::{ProfitCalculator, TaxConfig};

use crate::mock_source::{item, MockPriceSource};

fn recommender(source: &MockPriceSource) -> Recommender {
    Recommender::from_config(Box::new(source.clone()), &AppConfig::default())
}

fn assert_sorted_desc(ratios: &[f64]) {
    for pair in ratios.windows(2) {
        assert!(
            pair[0] >= pair[1],
            "ratios not in descending order: {ratios:?}"
        );
    }
}

#[tokio::test]
async fn test_two_item_round() {
    let source = MockPriceSource::two_item_scenario();
    let set = recommender(&source).get_recommendations(Some(1_000)).await;

    assert_eq!(set.capital, Some(1_000));
    let names: Vec<&str> = set.items.iter().map(|r| r.item_name.as_str()).collect();
    assert_eq!(names, vec!["A", "B"]);

    assert!((set.items[0].profit_ratio - 0.486).abs() < 1e-9);
    assert_eq!(set.items[0].max_units, 5);
    assert_eq!(set.items[0].high_price, Some(150));
    assert_eq!(set.items[0].low_price, Some(140));

    assert!((set.items[1].profit_ratio + 0.208).abs() < 1e-9);
    assert_eq!(set.items[1].max_units, 20);

    assert!((set.total_profit_ratio() - 0.278).abs() < 1e-9);
}

#[tokio::test]
async fn test_one_fetch_of_each_kind_per_round() {
    let source = MockPriceSource::two_item_scenario();
    let rec = recommender(&source);

    rec.get_recommendations(Some(1_000)).await;
    assert_eq!(source.catalog_calls(), 1);
    assert_eq!(source.quote_calls(), 1);

    let requested = source.requested();
    assert_eq!(requested.len(), 1);
    assert_eq!(requested[0].iter().copied().collect::<Vec<_>>(), vec![1, 2]);

    rec.get_recommendations(Some(1_000)).await;
    assert_eq!(source.catalog_calls(), 2);
    assert_eq!(source.quote_calls(), 2);
}

#[tokio::test]
async fn test_snapshot_round_is_ranked_and_bounded() {
    let source = MockPriceSource::grand_exchange_snapshot();
    let set = recommender(&source)
        .get_recommendations(Some(10_000_000))
        .await;

    assert!(set.len() <= 10);
    assert_eq!(set.len(), 10);

    let ratios: Vec<f64> = set.items.iter().map(|r| r.profit_ratio).collect();
    assert_sorted_desc(&ratios);

    // Egg has no quote and must never be recommended.
    assert!(set.items.iter().all(|r| r.item_id != 1944));
    assert!(set.items.iter().all(|r| r.high_price.is_some() || r.low_price.is_some()));

    // Twisted bow: 8 units at 720k reference, sold at 1.18b each.
    assert_eq!(set.items[0].item_name, "Twisted bow");
    assert_eq!(set.items[0].max_units, 8);
}

#[tokio::test]
async fn test_rounds_are_idempotent() {
    let source = MockPriceSource::grand_exchange_snapshot();
    let rec = recommender(&source);

    let first = rec.get_recommendations(Some(250_000)).await;
    let second = rec.get_recommendations(Some(250_000)).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_no_capital_skips_fetching() {
    let source = MockPriceSource::two_item_scenario();
    let set = recommender(&source).get_recommendations(None).await;

    assert!(set.is_empty());
    assert_eq!(set.capital, None);
    assert_eq!(source.catalog_calls(), 0);
    assert_eq!(source.quote_calls(), 0);
}

#[tokio::test]
async fn test_catalog_outage_then_recovery() {
    let source = MockPriceSource::two_item_scenario();
    let rec = recommender(&source);

    source.set_catalog_error("503 Service Unavailable");
    let set = rec.get_recommendations(Some(1_000)).await;
    assert!(set.is_empty());
    assert_eq!(set.capital, Some(1_000));
    assert_eq!(source.quote_calls(), 0);

    source.clear_catalog_error();
    let set = rec.get_recommendations(Some(1_000)).await;
    assert_eq!(set.len(), 2);
}

#[tokio::test]
async fn test_quote_outage_yields_empty_set() {
    let source = MockPriceSource::two_item_scenario();
    source.set_quotes_failing(true);

    let set = recommender(&source).get_recommendations(Some(1_000)).await;
    assert!(set.is_empty());
    assert_eq!(set.capital, Some(1_000));
    assert_eq!(source.quote_calls(), 1);
}

#[tokio::test]
async fn test_unusable_items_rank_at_zero() {
    let source = MockPriceSource::new(
        vec![
            item(1, "Loss", Some(100), None),
            item(2, "No reference", None, Some(10)),
            item(3, "Gain", Some(100), None),
        ],
        vec![(1, 50, 45), (2, 1_000, 900), (3, 200, 190)],
    );
    let set = recommender(&source).get_recommendations(Some(1_000)).await;

    let names: Vec<&str> = set.items.iter().map(|r| r.item_name.as_str()).collect();
    assert_eq!(names, vec!["Gain", "No reference", "Loss"]);
    assert_eq!(set.items[1].profit_ratio, 0.0);
    assert_eq!(set.items[1].max_units, 0);
}

#[tokio::test]
async fn test_custom_top_n_and_tax() {
    let source = MockPriceSource::grand_exchange_snapshot();
    let calculator = ProfitCalculator::new(TaxConfig { rate_bps: 0, cap: 0 });
    let rec = Recommender::new(Box::new(source.clone()), calculator, 3);

    let set = rec.get_recommendations(Some(1_000_000)).await;
    assert_eq!(set.len(), 3);
    assert_eq!(rec.top_n(), 3);
}

#[tokio::test]
async fn test_gp_input_to_rendered_table() {
    let capital = parse_gold_amount(" 1k ").unwrap();
    assert_eq!(capital, 1_000);

    let source = MockPriceSource::two_item_scenario();
    let set = recommender(&source).get_recommendations(Some(capital)).await;

    let mut renderer = TableRenderer::new(Vec::new()).with_color(false);
    renderer.render(&set).unwrap();
    let out = String::from_utf8(renderer.into_inner()).unwrap();

    assert!(out.contains("| Item | Profit/GP | Sell Price | Buy Price | Max Units |"));
    assert!(out.contains("| A    | 0.49      | 150        | 140       | 5         |"));
    assert!(out.contains("| B    | -0.21     | 40         | 35        | 20        |"));
    assert!(out.contains("Profit/loss total: 0.28 | Your gold: 1,000"));
}

#[test]
fn test_rejected_gp_input() {
    for bad in ["", "abc", "1.5", "-5", "10x", "k"] {
        assert!(parse_gold_amount(bad).is_err(), "accepted {bad:?}");
    }
}
