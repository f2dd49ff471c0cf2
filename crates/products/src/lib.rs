//! Products module.
//!
//! Read-only product snapshots as supplied by the inventory store, plus the
//! small amount of business logic attached to them (validation, cost fallback).

pub mod product;

pub use product::{DEFAULT_COST_RATIO, Product, UNCATEGORIZED, find_product};
