//! Calendar and autoregressive features over a daily sales series.

use std::f64::consts::PI;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use restock_inventory::DailySalesSeries;

/// Lag offsets (days).
pub const LAGS: [usize; 4] = [1, 3, 7, 14];
/// Trailing rolling-mean windows (days).
pub const WINDOWS: [usize; 3] = [3, 7, 14];
/// Rows before this index lack at least one lag and are not trainable.
pub const MAX_LAG: usize = 14;
/// Width of [`FeatureRow::to_vector`].
pub const FEATURE_COUNT: usize = 6 + LAGS.len() + WINDOWS.len();

/// Features of one day plus the quantity actually sold that day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureRow {
    pub date: NaiveDate,
    /// 0 = Monday … 6 = Sunday.
    pub day_of_week: u32,
    pub day_of_month: u32,
    pub month: u32,
    pub is_weekend: bool,
    pub dow_sin: f64,
    pub dow_cos: f64,
    /// Quantities 1, 3, 7 and 14 days back.
    pub lags: [f64; 4],
    /// Means of the 3, 7 and 14 days before `date`.
    pub rolling_means: [f64; 3],
    pub target: f64,
}

impl FeatureRow {
    /// Build the row for `date` from the quantities of the days strictly
    /// before it (`context`, oldest first).
    ///
    /// Lags beyond the context use `fallback`; windows longer than the
    /// context average whatever is available (minimum one period).
    pub fn from_context(date: NaiveDate, context: &[f64], fallback: f64, target: f64) -> Self {
        let day_of_week = date.weekday().num_days_from_monday();
        let angle = 2.0 * PI * f64::from(day_of_week) / 7.0;

        let lags = LAGS.map(|lag| {
            if context.len() >= lag {
                context[context.len() - lag]
            } else {
                fallback
            }
        });

        let rolling_means = WINDOWS.map(|window| {
            if context.is_empty() {
                return fallback;
            }
            let tail = &context[context.len().saturating_sub(window)..];
            tail.iter().sum::<f64>() / tail.len() as f64
        });

        Self {
            date,
            day_of_week,
            day_of_month: date.day(),
            month: date.month(),
            is_weekend: day_of_week >= 5,
            dow_sin: angle.sin(),
            dow_cos: angle.cos(),
            lags,
            rolling_means,
            target,
        }
    }

    /// Fixed-order numeric vector fed to the regression.
    pub fn to_vector(&self) -> [f64; FEATURE_COUNT] {
        [
            f64::from(self.day_of_week),
            f64::from(self.day_of_month),
            f64::from(self.month),
            if self.is_weekend { 1.0 } else { 0.0 },
            self.dow_sin,
            self.dow_cos,
            self.lags[0],
            self.lags[1],
            self.lags[2],
            self.lags[3],
            self.rolling_means[0],
            self.rolling_means[1],
            self.rolling_means[2],
        ]
    }
}

/// Trainable feature rows of a series, one per day that has every lag.
///
/// Rolling windows end on the previous day, so a row never sees its own
/// target. The first [`MAX_LAG`] days only feed the lags and windows.
pub fn build_features(series: &DailySalesSeries) -> Vec<FeatureRow> {
    let quantities = series.quantities();
    let fallback = series.mean();

    series
        .points()
        .iter()
        .enumerate()
        .skip(MAX_LAG)
        .map(|(i, point)| FeatureRow::from_context(point.date, &quantities[..i], fallback, point.quantity))
        .collect()
}
