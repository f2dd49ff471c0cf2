//! Synthetic daily history fabricated from a 30-day sales aggregate.
//!
//! Only used when the movement log carries too little signal. Callers must
//! label anything derived from it as synthetic.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use restock_core::ProductId;
use restock_inventory::DailySalesSeries;

/// Length of the fabricated series, in days.
pub const SYNTHETIC_DAYS: usize = 30;

const WEEKEND_FACTOR: f64 = 1.3;
const LATE_MONTH_FACTOR: f64 = 1.2;
const LATE_MONTH_FROM_DAY: u32 = 20;
const JITTER_MIN: f64 = 0.7;
const JITTER_MAX: f64 = 1.3;
/// Surplus units are spread over this many trailing days.
const RECONCILE_DAYS: usize = 5;

/// Fabricate 30 daily points ending on `as_of` whose quantities sum exactly
/// to `units_sold_last_30_days`.
///
/// Weekends weigh ×1.3, days after the 20th ×1.2, and each day gets ±30%
/// jitter from `rng`. An aggregate of zero yields an empty series.
pub fn generate_synthetic_history<R: Rng>(
    units_sold_last_30_days: u32,
    as_of: NaiveDate,
    rng: &mut R,
) -> DailySalesSeries {
    if units_sold_last_30_days == 0 {
        return DailySalesSeries::empty();
    }

    let start = as_of - Duration::days(SYNTHETIC_DAYS as i64 - 1);
    let mean = f64::from(units_sold_last_30_days) / SYNTHETIC_DAYS as f64;

    let mut daily: Vec<u64> = (0..SYNTHETIC_DAYS)
        .map(|offset| {
            let date = start + Duration::days(offset as i64);
            let jitter = rng.gen_range(JITTER_MIN..=JITTER_MAX);
            (mean * day_weight(date) * jitter).floor().max(0.0) as u64
        })
        .collect();

    reconcile(&mut daily, u64::from(units_sold_last_30_days));

    DailySalesSeries::from_daily(start, daily.into_iter().map(|q| q as f64))
}

/// Deterministic generator for one product: same seed and id, same series.
pub fn seeded_rng(seed: u64, product_id: ProductId) -> StdRng {
    let mixed = seed ^ (product_id.get() as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    StdRng::seed_from_u64(mixed)
}

fn day_weight(date: NaiveDate) -> f64 {
    let mut weight = 1.0;
    if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
        weight = WEEKEND_FACTOR;
    }
    if date.day() > LATE_MONTH_FROM_DAY {
        weight *= LATE_MONTH_FACTOR;
    }
    weight
}

/// Adjust `daily` in place so it sums to `target`.
///
/// A surplus goes to the last few days (remainder on the latest ones); a
/// deficit is taken walking back from the last day.
fn reconcile(daily: &mut [u64], target: u64) {
    let sum: u64 = daily.iter().sum();

    if sum < target {
        let span = daily.len().min(RECONCILE_DAYS);
        if span == 0 {
            return;
        }
        let surplus = target - sum;
        let share = surplus / span as u64;
        let remainder = (surplus % span as u64) as usize;

        let tail_start = daily.len() - span;
        for (i, q) in daily[tail_start..].iter_mut().enumerate() {
            *q += share;
            if i >= span - remainder {
                *q += 1;
            }
        }
    } else if sum > target {
        let mut deficit = sum - target;
        for q in daily.iter_mut().rev() {
            let take = (*q).min(deficit);
            *q -= take;
            deficit -= take;
            if deficit == 0 {
                break;
            }
        }
    }
}
