use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use restock_core::ProductId;
use restock_inventory::{Movement, extract_daily_sales, outflow_within, window_start};
use restock_products::Product;

use crate::cache::{ModelCache, NoopModelCache};
use crate::config::ForecastConfig;
use crate::error::ForecastResult;
use crate::estimator::{DemandInput, has_enough_signal, select_strategy};
use crate::forecast::{DemandForecast, EstimateStrategy, HistorySource};
use crate::heuristic::HeuristicEstimator;
use crate::model::ModelBasedEstimator;
use crate::regression::FitReport;
use crate::synthetic::{generate_synthetic_history, seeded_rng};

/// Forecast plus how it was obtained.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemandOutcome {
    pub forecast: DemandForecast,
    /// Held-out accuracy when the model-based estimate was used.
    pub fit: Option<FitReport>,
}

impl DemandOutcome {
    pub fn used_model_based_estimate(&self) -> bool {
        self.forecast.strategy() == EstimateStrategy::ModelBased
    }

    pub fn used_synthetic_history(&self) -> bool {
        self.forecast.history_source() == HistorySource::Synthetic
    }
}

/// Per-product result of [`DemandEngine::fit_all`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TrainingStatus {
    Fitted { report: FitReport, synthetic: bool },
    Skipped { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingDetail {
    pub product_id: ProductId,
    pub product_name: String,
    pub status: TrainingStatus,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub fitted: usize,
    pub skipped: usize,
    pub details: Vec<TrainingDetail>,
}

/// Runs the "model first, heuristic otherwise" estimation for one product.
///
/// Strategy choice is made up front by [`select_strategy`]; a model that
/// cannot be fitted, or forecasts no demand at all, falls back to the
/// heuristic silently (logged at `debug`).
#[derive(Clone)]
pub struct DemandEngine {
    config: ForecastConfig,
    model: ModelBasedEstimator,
    heuristic: HeuristicEstimator,
    cache: Arc<dyn ModelCache>,
}

impl core::fmt::Debug for DemandEngine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DemandEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl DemandEngine {
    pub fn new(config: ForecastConfig) -> Self {
        Self {
            model: ModelBasedEstimator::new(config.clone()),
            heuristic: HeuristicEstimator::new(config.clone()),
            config,
            cache: Arc::new(NoopModelCache),
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn ModelCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Gather the signals for one product from the snapshots.
    ///
    /// Only rows dated on or before `as_of` count. Observed history is used
    /// when it has enough signal; otherwise a synthetic series is fabricated
    /// from the 30-day aggregate (seeded, so repeated calls agree).
    pub fn prepare_input(&self, product: &Product, movements: &[Movement], as_of: NaiveDate) -> DemandInput {
        let observed = extract_daily_sales(movements, product.id).through(as_of);
        let since = window_start(as_of, self.config.recent_window_days);
        let recent_outflow = outflow_within(movements, product.id, since, as_of);

        let (series, history_source) = if has_enough_signal(&observed, &self.config) {
            (observed.clone(), HistorySource::Observed)
        } else if product.units_sold_last_30_days > 0 {
            let mut rng = seeded_rng(self.config.synthetic_seed, product.id);
            let synthetic = generate_synthetic_history(product.units_sold_last_30_days, as_of, &mut rng);
            debug!(
                product = %product.id,
                observed_days = observed.len(),
                "observed history too thin; using synthetic history"
            );
            (synthetic, HistorySource::Synthetic)
        } else if observed.is_empty() {
            (observed.clone(), HistorySource::None)
        } else {
            (observed.clone(), HistorySource::Observed)
        };

        DemandInput {
            product_id: product.id,
            series,
            history_source,
            observed,
            recent_outflow,
            units_sold_last_30_days: product.units_sold_last_30_days,
        }
    }

    pub fn forecast(
        &self,
        product: &Product,
        movements: &[Movement],
        as_of: NaiveDate,
        horizon: usize,
    ) -> DemandOutcome {
        let input = self.prepare_input(product, movements, as_of);
        self.forecast_input(&input, horizon)
    }

    pub fn forecast_input(&self, input: &DemandInput, horizon: usize) -> DemandOutcome {
        if select_strategy(&input.series, &self.config) == EstimateStrategy::ModelBased {
            match self.model_forecast(input, horizon) {
                Ok((forecast, fit)) if !forecast.is_zero() => {
                    return DemandOutcome {
                        forecast,
                        fit: Some(fit),
                    };
                }
                Ok(_) => {
                    debug!(product = %input.product_id, "model forecasts no demand; using heuristic");
                }
                Err(e) => {
                    debug!(product = %input.product_id, error = %e, "model estimate unavailable; using heuristic");
                }
            }
        }

        DemandOutcome {
            forecast: self.heuristic.forecast(input, horizon),
            fit: None,
        }
    }

    fn model_forecast(&self, input: &DemandInput, horizon: usize) -> ForecastResult<(DemandForecast, FitReport)> {
        let fitted = match self.cache.get(input.product_id) {
            Some(fitted) if fitted.is_current_for(&input.series, input.history_source) => fitted,
            stale => {
                if stale.is_some() {
                    debug!(product = %input.product_id, "cached model trained on other history; refitting");
                }
                let fitted = self.model.fit(&input.series, input.history_source)?;
                self.cache.put(input.product_id, fitted)
            }
        };
        let forecast = self
            .model
            .forecast_with(&fitted, &input.series, input.history_source, horizon)?;
        Ok((forecast, fitted.report.clone()))
    }

    /// Fit (and cache) a model for every product that has enough signal.
    pub fn fit_all(&self, products: &[Product], movements: &[Movement], as_of: NaiveDate) -> TrainingSummary {
        let mut summary = TrainingSummary::default();

        for product in products {
            let input = self.prepare_input(product, movements, as_of);
            let status = match self.model.fit(&input.series, input.history_source) {
                Ok(fitted) => {
                    let status = TrainingStatus::Fitted {
                        report: fitted.report.clone(),
                        synthetic: fitted.history_source == HistorySource::Synthetic,
                    };
                    self.cache.put(product.id, fitted);
                    summary.fitted += 1;
                    status
                }
                Err(e) => {
                    summary.skipped += 1;
                    TrainingStatus::Skipped { reason: e.to_string() }
                }
            };
            summary.details.push(TrainingDetail {
                product_id: product.id,
                product_name: product.name.clone(),
                status,
            });
        }

        info!(fitted = summary.fitted, skipped = summary.skipped, "model training finished");
        summary
    }
}
