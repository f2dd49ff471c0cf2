use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, ForecastResult};

/// Tunables of the demand estimators.
///
/// Defaults reproduce the calibrated behaviour; every field can be overridden
/// from a config file (`#[serde(default)]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Allow the regression estimator at all (off = heuristic only).
    pub model_based: bool,
    /// Minimum days of history (and of usable feature rows) for the model.
    pub min_history_days: usize,
    /// Minimum days with nonzero sales for the model.
    pub min_sales_days: usize,
    /// Most recent share of feature rows held out for validation.
    pub validation_fraction: f64,
    /// L2 penalty of the ridge regression.
    pub ridge_lambda: f64,
    /// Exponential smoothing constant of the heuristic.
    pub smoothing_alpha: f64,
    /// Trailing days compared against the full history for seasonality.
    pub seasonal_window: usize,
    /// Below this many observed points the seasonal factor is 1.0.
    pub seasonal_min_points: usize,
    pub seasonal_min_factor: f64,
    pub seasonal_max_factor: f64,
    /// Window (in days) of "recent" outflows for the heuristic base rate.
    pub recent_window_days: u32,
    /// Seed for synthetic history; mixed with the product id.
    pub synthetic_seed: u64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            model_based: true,
            min_history_days: 7,
            min_sales_days: 3,
            validation_fraction: 0.2,
            ridge_lambda: 1.0,
            smoothing_alpha: 0.3,
            seasonal_window: 3,
            seasonal_min_points: 4,
            seasonal_min_factor: 0.5,
            seasonal_max_factor: 2.0,
            recent_window_days: 30,
            synthetic_seed: 42,
        }
    }
}

impl ForecastConfig {
    pub fn heuristic_only() -> Self {
        Self {
            model_based: false,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> ForecastResult<()> {
        if !(self.smoothing_alpha > 0.0 && self.smoothing_alpha < 1.0) {
            return Err(ForecastError::InvalidParameter(
                "smoothing_alpha must be in (0, 1)".to_string(),
            ));
        }
        if !(self.validation_fraction >= 0.0 && self.validation_fraction < 1.0) {
            return Err(ForecastError::InvalidParameter(
                "validation_fraction must be in [0, 1)".to_string(),
            ));
        }
        if !(self.ridge_lambda.is_finite() && self.ridge_lambda >= 0.0) {
            return Err(ForecastError::InvalidParameter(
                "ridge_lambda must be a finite non-negative number".to_string(),
            ));
        }
        if !(self.seasonal_min_factor > 0.0 && self.seasonal_min_factor <= self.seasonal_max_factor) {
            return Err(ForecastError::InvalidParameter(
                "seasonal factor bounds must satisfy 0 < min <= max".to_string(),
            ));
        }
        if self.seasonal_window == 0 || self.recent_window_days == 0 {
            return Err(ForecastError::InvalidParameter(
                "seasonal_window and recent_window_days must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(ForecastConfig::default().validate().is_ok());
        assert!(!ForecastConfig::heuristic_only().model_based);
    }

    #[test]
    fn rejects_out_of_range_alpha() {
        let cfg = ForecastConfig {
            smoothing_alpha: 1.0,
            ..ForecastConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ForecastError::InvalidParameter(_))));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let cfg: ForecastConfig = serde_json::from_str(r#"{"ridge_lambda": 2.5}"#).unwrap();
        assert_eq!(cfg.ridge_lambda, 2.5);
        assert_eq!(cfg.min_history_days, 7);
        assert_eq!(cfg.smoothing_alpha, 0.3);
    }
}
