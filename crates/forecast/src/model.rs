//! Model-based estimator: ridge regression + autoregressive rollout.

use chrono::{Duration, NaiveDate};

use restock_inventory::DailySalesSeries;

use crate::config::ForecastConfig;
use crate::error::{ForecastError, ForecastResult};
use crate::estimator::{DemandEstimator, DemandInput, select_strategy};
use crate::features::{FeatureRow, MAX_LAG, build_features};
use crate::forecast::{DemandForecast, EstimateStrategy, HistorySource};
use crate::regression::{FitReport, RidgeModel, RidgeRegression, mean_absolute_error, r2_score};

/// A trained per-product model, cacheable across calls.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedModel {
    model: RidgeModel,
    pub report: FitReport,
    pub history_source: HistorySource,
    /// Last day of the series the model was trained on.
    pub trained_through: NaiveDate,
    trained_on: DailySalesSeries,
}

impl FittedModel {
    /// Whether this model was trained on exactly `series` from `source`.
    pub fn is_current_for(&self, series: &DailySalesSeries, source: HistorySource) -> bool {
        self.history_source == source && self.trained_on == *series
    }
}

#[derive(Debug, Clone)]
pub struct ModelBasedEstimator {
    config: ForecastConfig,
}

impl ModelBasedEstimator {
    pub fn new(config: ForecastConfig) -> Self {
        Self { config }
    }

    /// Train on the chronologically first rows and score on the most recent
    /// `validation_fraction` of them.
    pub fn fit(&self, series: &DailySalesSeries, history_source: HistorySource) -> ForecastResult<FittedModel> {
        if select_strategy(series, &self.config) != EstimateStrategy::ModelBased {
            return Err(ForecastError::InsufficientData(format!(
                "need >= {} usable days with >= {} selling days",
                self.config.min_history_days, self.config.min_sales_days
            )));
        }
        let trained_through = series
            .last_date()
            .ok_or_else(|| ForecastError::InsufficientData("empty series".to_string()))?;

        let rows = build_features(series);
        let n = rows.len();
        let train_rows = ((n as f64) * (1.0 - self.config.validation_fraction)).floor() as usize;
        let split = train_rows.clamp(1, n.saturating_sub(1).max(1));

        let (x, y): (Vec<Vec<f64>>, Vec<f64>) = rows
            .iter()
            .map(|r| (r.to_vector().to_vec(), r.target))
            .unzip();

        let model = RidgeRegression::new(self.config.ridge_lambda)?.fit(&x[..split], &y[..split])?;

        let validation = &x[split..];
        let predicted: Vec<f64> = model
            .predict_many(validation)
            .into_iter()
            .map(|p| p.max(0.0))
            .collect();
        let actual = &y[split..];

        Ok(FittedModel {
            report: FitReport {
                mae: mean_absolute_error(&predicted, actual),
                r2: r2_score(&predicted, actual),
                train_rows: split,
                validation_rows: n - split,
            },
            model,
            history_source,
            trained_through,
            trained_on: series.clone(),
        })
    }

    /// Roll the model forward one day at a time; each prediction becomes
    /// context for the next day's lags and windows.
    pub fn forecast_with(
        &self,
        fitted: &FittedModel,
        series: &DailySalesSeries,
        history_source: HistorySource,
        horizon: usize,
    ) -> ForecastResult<DemandForecast> {
        let last = series
            .last_date()
            .ok_or_else(|| ForecastError::InsufficientData("empty series".to_string()))?;
        let fallback = series.mean();
        let mut context: Vec<f64> = series.tail(MAX_LAG).iter().map(|p| p.quantity).collect();

        let mut daily = Vec::with_capacity(horizon);
        for step in 1..=horizon {
            let date = last + Duration::days(step as i64);
            let row = FeatureRow::from_context(date, &context, fallback, 0.0);
            let predicted = fitted.model.predict(&row.to_vector());
            let predicted = if predicted.is_finite() { predicted.max(0.0) } else { 0.0 };
            daily.push(predicted);
            context.push(predicted);
        }

        Ok(DemandForecast::new(daily, EstimateStrategy::ModelBased, history_source))
    }
}

impl DemandEstimator for ModelBasedEstimator {
    fn strategy(&self) -> EstimateStrategy {
        EstimateStrategy::ModelBased
    }

    fn estimate(&self, input: &DemandInput, horizon: usize) -> Result<DemandForecast, ForecastError> {
        let fitted = self.fit(&input.series, input.history_source)?;
        self.forecast_with(&fitted, &input.series, input.history_source, horizon)
    }
}
