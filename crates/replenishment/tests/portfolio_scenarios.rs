use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;

use restock_core::ProductId;
use restock_forecast::InMemoryModelCache;
use restock_inventory::Movement;
use restock_products::Product;
use restock_replenishment::{
    AnalysisConfig, AnalysisError, InsightComposer, PortfolioAnalyzer, UNBOUNDED_DAYS, UrgencyClassifier, UrgencyTier,
};

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
}

fn product(id: i64, price: f64, stock: u32, units_30: u32) -> Product {
    Product::new(ProductId::new(id), format!("Product {id}"), price, stock).with_units_sold_last_30_days(units_30)
}

/// `days` consecutive days of outflows ending on `as_of`, ids starting at `first_id`.
fn daily_history(first_id: i64, product_id: i64, days: i64, qty: impl Fn(i64) -> u32) -> Vec<Movement> {
    (0..days)
        .map(|i| {
            let date = as_of() - Duration::days(days - 1 - i);
            Movement::outflow(first_id + i, product_id, qty(i), date.format("%Y-%m-%d 14:15:00").to_string())
        })
        .filter(|m| m.quantity > 0)
        .collect()
}

fn mixed_snapshot() -> (Vec<Product>, Vec<Movement>) {
    let products = vec![
        product(1, 10.0, 0, 60),
        product(2, 4.0, 200, 0),
        product(3, 2.5, 25, 40).with_category("Drinks"),
        product(4, 8.0, 9, 0).with_category("Snacks"),
        product(5, 12.0, 60, 45).with_unit_cost(7.0),
        product(6, 3.0, 14, 12).with_category("Drinks"),
    ];
    let mut movements = daily_history(1, 3, 45, |i| (i % 4 + 1) as u32);
    movements.extend(daily_history(100, 5, 20, |i| if i % 3 == 0 { 0 } else { 2 }));
    movements.push(Movement::inflow(500, 3, 100, "2024-06-01 08:00:00"));
    (products, movements)
}

#[test]
fn aggregate_only_empty_shelf_is_critical_with_exact_numbers() {
    let classifier = UrgencyClassifier::new(AnalysisConfig::heuristic_only());
    let report = classifier
        .classify_product(&[product(1, 10.0, 0, 60)], &[], ProductId::new(1), as_of())
        .unwrap();

    assert_eq!(report.tier, UrgencyTier::Critical);
    assert!((report.unit_cost - 6.5).abs() < 1e-12);
    assert!((report.daily_demand - 2.0).abs() < 1e-12);
    assert!((report.forecast_total - 28.0).abs() < 1e-9);
    assert_eq!(report.days_to_stockout, 0);
    assert_eq!(report.reorder_quantity, 51);
    assert!((report.investment - 331.5).abs() < 1e-9);
    assert!(!report.used_model_based_estimate);
}

#[test]
fn aggregate_only_empty_shelf_with_model_enabled() {
    let classifier = UrgencyClassifier::new(AnalysisConfig::default());
    let report = classifier.classify(&product(1, 10.0, 0, 60), &[], as_of()).unwrap();

    assert_eq!(report.tier, UrgencyTier::Critical);
    assert!((report.investment - f64::from(report.reorder_quantity) * 6.5).abs() < 1e-9);
    if report.used_model_based_estimate {
        assert!(report.used_synthetic_history);
    }
}

#[test]
fn overstocked_product_without_sales_is_excess() {
    let classifier = UrgencyClassifier::new(AnalysisConfig::default());
    let report = classifier.classify(&product(2, 4.0, 200, 0), &[], as_of()).unwrap();

    assert_eq!(report.forecast_total, 0.0);
    assert_eq!(report.days_to_stockout, UNBOUNDED_DAYS);
    assert_eq!(report.tier, UrgencyTier::Excess);
    assert_eq!(report.reorder_quantity, 0);
    assert_eq!(report.investment, 0.0);
}

#[test]
fn malformed_timestamp_is_dropped_silently() {
    let classifier = UrgencyClassifier::new(AnalysisConfig::default());
    let p = product(3, 2.5, 25, 40);
    let clean = daily_history(1, 3, 45, |i| (i % 4 + 1) as u32);
    let mut dirty = clean.clone();
    dirty.push(Movement::outflow(999, 3, 500, "31st of Junetember"));

    let a = classifier.classify(&p, &clean, as_of()).unwrap();
    let b = classifier.classify(&p, &dirty, as_of()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn one_bad_product_does_not_sink_the_batch() {
    let (mut products, movements) = mixed_snapshot();
    let mut broken = product(7, 1.0, 3, 3);
    broken.unit_price = f64::NAN;
    products.insert(2, broken);

    let summary = PortfolioAnalyzer::new(AnalysisConfig::default()).analyze(&products, &movements, as_of());
    assert_eq!(summary.total_products, 7);
    assert_eq!(summary.analyzed(), 6);
    assert_eq!(summary.skipped.len(), 1);
    assert_eq!(summary.skipped[0].product_id, ProductId::new(7));
}

#[test]
fn movements_for_unlisted_products_are_ignored() {
    let (products, mut movements) = mixed_snapshot();
    let baseline = PortfolioAnalyzer::new(AnalysisConfig::default()).analyze(&products, &movements, as_of());

    movements.extend(daily_history(1_000, 404, 40, |i| (i % 5 + 3) as u32));
    movements.push(Movement::inflow(2_000, 404, 80, "2024-06-10 08:00:00"));
    movements.push(Movement::outflow(2_001, 404, 9, "garbled"));

    let summary = PortfolioAnalyzer::new(AnalysisConfig::default()).analyze(&products, &movements, as_of());
    assert_eq!(summary.total_products, products.len());
    assert_eq!(summary.analyzed(), products.len());
    assert!(summary.skipped.is_empty());
    for p in &products {
        assert!(summary.report_for(p.id).is_some(), "no report for {}", p.id);
    }
    assert!(summary.report_for(ProductId::new(404)).is_none());
    assert!(summary.reports().all(|r| r.product_id != ProductId::new(404)));
    assert!(summary.purchase_list().iter().all(|l| l.product_id != ProductId::new(404)));
    assert_eq!(summary, baseline);
}

#[test]
fn unknown_product_is_reported_not_raised() {
    let (products, movements) = mixed_snapshot();
    let err = UrgencyClassifier::new(AnalysisConfig::default())
        .classify_product(&products, &movements, ProductId::new(404), as_of())
        .unwrap_err();
    assert_eq!(err, AnalysisError::ProductNotFound(ProductId::new(404)));
}

#[test]
fn analysis_is_idempotent() {
    let (products, movements) = mixed_snapshot();
    let analyzer = PortfolioAnalyzer::new(AnalysisConfig::default());
    let first = analyzer.analyze(&products, &movements, as_of());
    let second = analyzer.analyze(&products, &movements, as_of());
    assert_eq!(first, second);
}

#[test]
fn parallel_run_matches_sequential_run() {
    let (products, movements) = mixed_snapshot();
    let sequential = PortfolioAnalyzer::new(AnalysisConfig::default()).analyze(&products, &movements, as_of());
    for workers in [2, 3, 16] {
        let parallel = PortfolioAnalyzer::new(AnalysisConfig::default())
            .with_workers(workers)
            .analyze(&products, &movements, as_of());
        assert_eq!(parallel, sequential, "workers = {workers}");
    }
}

#[test]
fn model_cache_does_not_change_results() {
    let (products, movements) = mixed_snapshot();
    let plain = PortfolioAnalyzer::new(AnalysisConfig::default()).analyze(&products, &movements, as_of());

    let cache = Arc::new(InMemoryModelCache::new());
    let cached = PortfolioAnalyzer::new(AnalysisConfig::default()).with_cache(cache.clone());
    let warm_up = cached.analyze(&products, &movements, as_of());
    let warm = cached.analyze(&products, &movements, as_of());

    assert_eq!(warm_up, plain);
    assert_eq!(warm, plain);
    assert!(!cache.is_empty());
}

#[test]
fn rich_history_product_uses_the_model() {
    let (products, movements) = mixed_snapshot();
    let summary = PortfolioAnalyzer::new(AnalysisConfig::default()).analyze(&products, &movements, as_of());
    let report = summary.report_for(ProductId::new(3)).unwrap();

    assert!(report.used_model_based_estimate);
    assert!(!report.used_synthetic_history);
    assert!(report.model_fit.is_some());
    assert!(summary.model_based_count >= 1);
}

#[test]
fn empty_shelf_is_always_critical_and_nine_units_without_demand_need_attention() {
    let products = vec![
        product(1, 1.0, 0, 0),
        product(2, 1.0, 0, 900),
        product(3, 1.0, 9, 0),
    ];
    let summary = PortfolioAnalyzer::new(AnalysisConfig::default()).analyze(&products, &[], as_of());

    assert_eq!(summary.report_for(ProductId::new(1)).unwrap().tier, UrgencyTier::Critical);
    assert_eq!(summary.report_for(ProductId::new(2)).unwrap().tier, UrgencyTier::Critical);
    assert_eq!(summary.report_for(ProductId::new(3)).unwrap().tier, UrgencyTier::Attention);
}

#[test]
fn summary_totals_and_dashboard_agree() {
    let (products, movements) = mixed_snapshot();
    let summary = PortfolioAnalyzer::new(AnalysisConfig::default()).analyze(&products, &movements, as_of());

    let critical: f64 = summary.critical.iter().map(|r| r.investment).sum();
    let attention: f64 = summary.attention.iter().map(|r| r.investment).sum();
    assert!((summary.critical_investment - critical).abs() < 1e-9);
    assert!((summary.urgent_investment - (critical + attention)).abs() < 1e-9);

    for tier in UrgencyTier::ALL {
        let days: Vec<u32> = summary.tier(tier).iter().map(|r| r.days_to_stockout).collect();
        assert!(days.windows(2).all(|w| w[0] <= w[1]), "{tier} not sorted");
    }

    let purchases = summary.purchase_list();
    assert!(purchases.iter().all(|l| l.quantity > 0 && l.tier.is_urgent()));

    let dashboard = InsightComposer::default().compose(&summary, &products);
    assert_eq!(dashboard.metrics.investment_needed, summary.urgent_investment);
    assert_eq!(dashboard.metrics.total_products, products.len());
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, ..ProptestConfig::default() })]

    /// Property: raising stock, all else equal, never makes a product more
    /// urgent and never raises its reorder quantity.
    #[test]
    fn more_stock_never_more_urgent(
        stock in 0u32..300,
        extra in 1u32..300,
        units_30 in 0u32..300,
        history in prop::collection::vec(0u32..8, 0..40),
    ) {
        let classifier = UrgencyClassifier::new(AnalysisConfig::heuristic_only());
        let movements = daily_history(1, 1, history.len() as i64, |i| history[i as usize]);

        let low = classifier.classify(&product(1, 3.0, stock, units_30), &movements, as_of()).unwrap();
        let high = classifier.classify(&product(1, 3.0, stock + extra, units_30), &movements, as_of()).unwrap();

        prop_assert!(high.tier >= low.tier);
        prop_assert!(high.reorder_quantity <= low.reorder_quantity);
    }
}
