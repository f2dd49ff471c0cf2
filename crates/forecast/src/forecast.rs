use serde::{Deserialize, Serialize};

/// Which estimator produced a forecast.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimateStrategy {
    /// Ridge regression over calendar/lag features, forecast autoregressively.
    ModelBased,
    /// Moving rate + exponential smoothing + seasonal adjustment, flat forecast.
    Heuristic,
}

/// Where the daily series behind a forecast came from.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistorySource {
    /// Real outflow movements.
    Observed,
    /// Fabricated from the 30-day aggregate; weaker quality guarantee.
    Synthetic,
    /// No daily series at all (aggregate signal only, or nothing).
    None,
}

/// Per-day demand estimate for a fixed horizon.
///
/// Every daily value is finite and `>= 0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandForecast {
    daily: Vec<f64>,
    strategy: EstimateStrategy,
    history_source: HistorySource,
}

impl DemandForecast {
    /// Build a forecast, clamping negative or non-finite predictions to zero.
    pub fn new(daily: Vec<f64>, strategy: EstimateStrategy, history_source: HistorySource) -> Self {
        let daily = daily
            .into_iter()
            .map(|v| if v.is_finite() && v > 0.0 { v } else { 0.0 })
            .collect();
        Self {
            daily,
            strategy,
            history_source,
        }
    }

    /// Same estimate for every day of the horizon.
    pub fn flat(
        rate: f64,
        horizon: usize,
        strategy: EstimateStrategy,
        history_source: HistorySource,
    ) -> Self {
        Self::new(vec![rate; horizon], strategy, history_source)
    }

    pub fn daily(&self) -> &[f64] {
        &self.daily
    }

    pub fn horizon(&self) -> usize {
        self.daily.len()
    }

    pub fn strategy(&self) -> EstimateStrategy {
        self.strategy
    }

    pub fn history_source(&self) -> HistorySource {
        self.history_source
    }

    pub fn total(&self) -> f64 {
        self.daily.iter().sum()
    }

    pub fn mean(&self) -> f64 {
        if self.daily.is_empty() {
            return 0.0;
        }
        self.total() / self.daily.len() as f64
    }

    /// `true` when the estimate carries no demand signal.
    pub fn is_zero(&self) -> bool {
        self.total() <= 0.0
    }
}
