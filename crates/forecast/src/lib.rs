//! `restock-forecast`
//!
//! **Responsibility:** per-product demand estimation.
//!
//! - Builds calendar/lag/rolling features from a daily sales series.
//! - Fits a ridge regression when the history carries enough signal and
//!   rolls it forward autoregressively.
//! - Falls back to a statistical heuristic otherwise; estimation never fails.
//! - Fabricates a seeded synthetic history for products that only have a
//!   30-day aggregate.
//!
//! No I/O. Inputs are in-memory snapshots.

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod estimator;
pub mod features;
pub mod forecast;
pub mod heuristic;
pub mod model;
pub mod regression;
pub mod synthetic;

pub use cache::{InMemoryModelCache, ModelCache, NoopModelCache};
pub use config::ForecastConfig;
pub use engine::{DemandEngine, DemandOutcome, TrainingDetail, TrainingStatus, TrainingSummary};
pub use error::{ForecastError, ForecastResult};
pub use estimator::{DemandEstimator, DemandInput, has_enough_signal, select_strategy};
pub use features::{FEATURE_COUNT, FeatureRow, build_features};
pub use forecast::{DemandForecast, EstimateStrategy, HistorySource};
pub use heuristic::{HeuristicEstimator, exponential_level};
pub use model::{FittedModel, ModelBasedEstimator};
pub use regression::{FitReport, RidgeModel, RidgeRegression, mean_absolute_error, r2_score};
pub use synthetic::{SYNTHETIC_DAYS, generate_synthetic_history, seeded_rng};
