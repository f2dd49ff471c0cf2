//! Statistical fallback estimator.
//!
//! Model:
//! - Base rate: recent outflow (or the 30-day aggregate) spread over the window.
//! - Seasonal factor: last few observed days against the whole history.
//! - Exponential smoothing over the observed history, blended 50/50.
//! - Flat forecast over the horizon; never fails.

use crate::config::ForecastConfig;
use crate::error::ForecastError;
use crate::estimator::{DemandEstimator, DemandInput};
use crate::forecast::{DemandForecast, EstimateStrategy, HistorySource};

const SMOOTHING_BLEND: f64 = 0.5;

#[derive(Debug, Clone)]
pub struct HeuristicEstimator {
    config: ForecastConfig,
}

impl HeuristicEstimator {
    pub fn new(config: ForecastConfig) -> Self {
        Self { config }
    }

    /// Estimated units per day.
    pub fn daily_rate(&self, input: &DemandInput) -> f64 {
        let window = f64::from(self.config.recent_window_days);
        let base = match input.recent_outflow {
            Some(units) => units as f64 / window,
            None => f64::from(input.units_sold_last_30_days) / window,
        };

        let observed = input.observed.quantities();
        let adjusted = base * self.seasonal_factor(&observed);

        if observed.len() >= 2 {
            let level = exponential_level(&observed, self.config.smoothing_alpha);
            SMOOTHING_BLEND * adjusted + (1.0 - SMOOTHING_BLEND) * level
        } else {
            adjusted
        }
    }

    /// Ratio of the trailing mean to the full-history mean, clamped.
    pub fn seasonal_factor(&self, observed: &[f64]) -> f64 {
        if observed.len() < self.config.seasonal_min_points {
            return 1.0;
        }
        let overall = mean(observed);
        if overall <= f64::EPSILON {
            return 1.0;
        }
        let recent = mean(&observed[observed.len().saturating_sub(self.config.seasonal_window)..]);
        (recent / overall).clamp(self.config.seasonal_min_factor, self.config.seasonal_max_factor)
    }

    /// Infallible form of [`DemandEstimator::estimate`].
    pub fn forecast(&self, input: &DemandInput, horizon: usize) -> DemandForecast {
        let source = if input.observed.is_empty() {
            HistorySource::None
        } else {
            HistorySource::Observed
        };
        DemandForecast::flat(self.daily_rate(input), horizon, EstimateStrategy::Heuristic, source)
    }
}

impl DemandEstimator for HeuristicEstimator {
    fn strategy(&self) -> EstimateStrategy {
        EstimateStrategy::Heuristic
    }

    fn estimate(&self, input: &DemandInput, horizon: usize) -> Result<DemandForecast, ForecastError> {
        Ok(self.forecast(input, horizon))
    }
}

/// Simple exponential smoothing level after the last observation.
pub fn exponential_level(values: &[f64], alpha: f64) -> f64 {
    let Some((&first, rest)) = values.split_first() else {
        return 0.0;
    };
    rest.iter().fold(first, |level, &v| alpha * v + (1.0 - alpha) * level)
}

fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().sum::<f64>() / (xs.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;
    use restock_core::ProductId;
    use restock_inventory::DailySalesSeries;

    fn input(observed: Vec<f64>, recent: Option<u64>, units_30: u32) -> DemandInput {
        let observed = DailySalesSeries::from_daily(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), observed);
        DemandInput {
            product_id: ProductId::new(1),
            series: observed.clone(),
            history_source: HistorySource::Observed,
            observed,
            recent_outflow: recent,
            units_sold_last_30_days: units_30,
        }
    }

    fn estimator() -> HeuristicEstimator {
        HeuristicEstimator::new(ForecastConfig::default())
    }

    #[test]
    fn aggregate_only_gives_plain_rate() {
        let f = estimator().forecast(&input(vec![], None, 60), 14);
        assert!((f.mean() - 2.0).abs() < 1e-12);
        assert!((f.total() - 28.0).abs() < 1e-9);
        assert_eq!(f.history_source(), HistorySource::None);
    }

    #[test]
    fn recent_outflow_beats_aggregate() {
        // Single observed point: no smoothing, no seasonality.
        let f = estimator().forecast(&input(vec![9.0], Some(90), 3), 14);
        assert!((f.mean() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn no_signal_is_a_zero_forecast() {
        let f = estimator().forecast(&input(vec![], None, 0), 14);
        assert_eq!(f.horizon(), 14);
        assert!(f.is_zero());
    }

    #[test]
    fn seasonal_factor_defaults_and_clamps() {
        let est = estimator();
        assert_eq!(est.seasonal_factor(&[1.0, 5.0, 9.0]), 1.0);
        assert_eq!(est.seasonal_factor(&[0.0, 0.0, 0.0, 0.0]), 1.0);
        assert_eq!(est.seasonal_factor(&[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 9.0, 9.0, 9.0]), 2.0);
        assert_eq!(est.seasonal_factor(&[9.0, 9.0, 9.0, 9.0, 9.0, 9.0, 9.0, 0.0, 0.0, 0.0]), 0.5);
        // Last three average 4, all seven average 2 -> 2.0.
        assert!((est.seasonal_factor(&[0.0, 0.0, 0.0, 2.0, 4.0, 4.0, 4.0]) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn smoothing_blends_with_adjusted_rate() {
        // Flat history of 2/day, recent outflow 60 -> base 2, factor 1, level 2.
        let f = estimator().forecast(&input(vec![2.0; 10], Some(60), 0), 7);
        assert!((f.mean() - 2.0).abs() < 1e-12);

        // Two points: no seasonality (needs 4), smoothing level 0.3*4 + 0.7*0 = 1.2.
        let f = estimator().forecast(&input(vec![0.0, 4.0], Some(30), 0), 7);
        assert!((f.mean() - (0.5 * 1.0 + 0.5 * 1.2)).abs() < 1e-12);
    }

    #[test]
    fn exponential_level_matches_recurrence() {
        assert_eq!(exponential_level(&[], 0.3), 0.0);
        assert_eq!(exponential_level(&[5.0], 0.3), 5.0);
        assert!((exponential_level(&[10.0, 0.0], 0.3) - 7.0).abs() < 1e-12);
    }

    proptest! {
        /// Property: heuristic forecasts are non-negative for any history.
        #[test]
        fn heuristic_forecast_is_non_negative(
            history in prop::collection::vec(0u32..500, 0..60),
            recent in prop::option::of(0u64..10_000),
            units in 0u32..10_000,
        ) {
            let observed = history.into_iter().map(f64::from).collect();
            let f = estimator().forecast(&input(observed, recent, units), 14);
            prop_assert!(f.daily().iter().all(|v| *v >= 0.0 && v.is_finite()));
        }
    }
}
