//! Inventory module.
//!
//! Movement log snapshots and the sales history derived from them. Pure,
//! deterministic logic (no I/O, no storage).

pub mod history;
pub mod movement;

pub use history::{
    DailySalesPoint, DailySalesSeries, dated_outflows, extract_daily_sales, outflow_within,
    weekday_totals, window_start,
};
pub use movement::{Movement, MovementKind, parse_timestamp};
