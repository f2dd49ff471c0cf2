use restock_core::ProductId;
use restock_inventory::DailySalesSeries;

use crate::config::ForecastConfig;
use crate::error::ForecastError;
use crate::features::build_features;
use crate::forecast::{DemandForecast, EstimateStrategy, HistorySource};

/// Everything an estimator may look at for one product.
///
/// Assembled by [`crate::DemandEngine`]; estimators never touch the raw
/// snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct DemandInput {
    pub product_id: ProductId,
    /// Series the model trains on: observed when it carries enough signal,
    /// otherwise synthetic (or empty).
    pub series: DailySalesSeries,
    pub history_source: HistorySource,
    /// Real extracted history, used by the heuristic's seasonal/smoothing terms.
    pub observed: DailySalesSeries,
    /// Units of valid outflow in the recent window, `None` when there are no
    /// such rows.
    pub recent_outflow: Option<u64>,
    pub units_sold_last_30_days: u32,
}

/// A demand estimation strategy.
pub trait DemandEstimator: Send + Sync {
    fn strategy(&self) -> EstimateStrategy;

    /// Forecast `horizon` days ahead.
    fn estimate(&self, input: &DemandInput, horizon: usize) -> Result<DemandForecast, ForecastError>;
}

/// `true` when a series carries enough signal to train on.
pub fn has_enough_signal(series: &DailySalesSeries, config: &ForecastConfig) -> bool {
    series.len() >= config.min_history_days && series.nonzero_days() >= config.min_sales_days
}

/// Pick the estimator for a series up front.
///
/// Model-based requires enough raw days *and* enough usable feature rows
/// (with enough nonzero targets) after lag construction.
pub fn select_strategy(series: &DailySalesSeries, config: &ForecastConfig) -> EstimateStrategy {
    if !config.model_based || !has_enough_signal(series, config) {
        return EstimateStrategy::Heuristic;
    }

    let rows = build_features(series);
    let nonzero = rows.iter().filter(|r| r.target > 0.0).count();
    if rows.len() >= config.min_history_days && nonzero >= config.min_sales_days {
        EstimateStrategy::ModelBased
    } else {
        EstimateStrategy::Heuristic
    }
}
