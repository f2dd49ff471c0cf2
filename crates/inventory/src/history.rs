//! Per-product daily sales history derived from the movement log.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use restock_core::ProductId;

use crate::movement::Movement;

/// Units sold on one calendar day.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySalesPoint {
    pub date: NaiveDate,
    pub quantity: f64,
}

/// Contiguous daily sales series.
///
/// Invariant: consecutive points are exactly one calendar day apart, so
/// `len() == (last_date - first_date).num_days() + 1` for any non-empty
/// series. Days without sales are present with quantity 0.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DailySalesSeries {
    points: Vec<DailySalesPoint>,
}

impl DailySalesSeries {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a series starting at `start`, one value per consecutive day.
    pub fn from_daily(start: NaiveDate, quantities: impl IntoIterator<Item = f64>) -> Self {
        let points = quantities
            .into_iter()
            .enumerate()
            .map(|(offset, quantity)| DailySalesPoint {
                date: start + Duration::days(offset as i64),
                quantity,
            })
            .collect();
        Self { points }
    }

    pub fn points(&self) -> &[DailySalesPoint] {
        &self.points
    }

    pub fn quantities(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.quantity).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    pub fn total(&self) -> f64 {
        self.points.iter().map(|p| p.quantity).sum()
    }

    /// Number of days with a strictly positive quantity.
    pub fn nonzero_days(&self) -> usize {
        self.points.iter().filter(|p| p.quantity > 0.0).count()
    }

    pub fn mean(&self) -> f64 {
        if self.points.is_empty() {
            return 0.0;
        }
        self.total() / self.points.len() as f64
    }

    /// The last `n` points (fewer when the series is shorter).
    pub fn tail(&self, n: usize) -> &[DailySalesPoint] {
        let start = self.points.len().saturating_sub(n);
        &self.points[start..]
    }

    /// The prefix of the series dated on or before `until`.
    pub fn through(&self, until: NaiveDate) -> Self {
        let end = self.points.partition_point(|p| p.date <= until);
        Self {
            points: self.points[..end].to_vec(),
        }
    }
}

/// First day of the `days`-day window ending on `until` (inclusive).
///
/// A zero-day window is treated as one day. Saturates at [`NaiveDate::MIN`].
pub fn window_start(until: NaiveDate, days: u32) -> NaiveDate {
    let span = Duration::days(i64::from(days.saturating_sub(1)));
    until.checked_sub_signed(span).unwrap_or(NaiveDate::MIN)
}

/// Valid outflow rows of one product as `(day, quantity)`.
///
/// Rows with a zero quantity or an unparseable timestamp are skipped.
pub fn dated_outflows(
    movements: &[Movement],
    product_id: ProductId,
) -> impl Iterator<Item = (NaiveDate, u32)> + '_ {
    movements
        .iter()
        .filter(move |m| m.product_id == product_id && m.is_outflow())
        .filter(|m| {
            if m.quantity == 0 {
                debug!(movement = %m.id, product = %m.product_id, "dropping zero-quantity movement");
            }
            m.quantity > 0
        })
        .filter_map(|m| match m.occurred_on() {
            Some(day) => Some((day, m.quantity)),
            None => {
                debug!(
                    movement = %m.id,
                    product = %m.product_id,
                    timestamp = %m.timestamp,
                    "dropping movement with unparseable timestamp"
                );
                None
            }
        })
}

/// Turn the raw movement log into a contiguous daily sales series for one
/// product.
///
/// Returns an empty series when the product has no valid outflow rows; that
/// means "no history", not an error.
pub fn extract_daily_sales(movements: &[Movement], product_id: ProductId) -> DailySalesSeries {
    let mut per_day: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for (day, quantity) in dated_outflows(movements, product_id) {
        *per_day.entry(day).or_insert(0) += u64::from(quantity);
    }

    let (Some(&first), Some(&last)) = (per_day.keys().next(), per_day.keys().next_back()) else {
        return DailySalesSeries::empty();
    };

    let span = (last - first).num_days();
    let quantities = (0..=span).map(|offset| {
        let day = first + Duration::days(offset);
        per_day.get(&day).copied().unwrap_or(0) as f64
    });

    DailySalesSeries::from_daily(first, quantities)
}

/// Units of valid outflow dated in `since..=until`.
///
/// `None` when no such rows exist, so callers can tell "no recent sales
/// records" apart from "recent records summing to zero".
pub fn outflow_within(
    movements: &[Movement],
    product_id: ProductId,
    since: NaiveDate,
    until: NaiveDate,
) -> Option<u64> {
    let mut seen = false;
    let mut total = 0u64;
    for (day, quantity) in dated_outflows(movements, product_id) {
        if (since..=until).contains(&day) {
            seen = true;
            total += u64::from(quantity);
        }
    }
    seen.then_some(total)
}

/// Outflow units per weekday, index 0 = Monday … 6 = Sunday.
pub fn weekday_totals(movements: &[Movement], product_id: ProductId) -> [u64; 7] {
    let mut totals = [0u64; 7];
    for (day, quantity) in dated_outflows(movements, product_id) {
        totals[day.weekday().num_days_from_monday() as usize] += u64::from(quantity);
    }
    totals
}
