//! Sales over a trailing period, straight from the movement log.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use restock_core::ProductId;
use restock_inventory::{Movement, window_start};
use restock_products::{Product, UNCATEGORIZED, find_product};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySales {
    pub date: NaiveDate,
    pub units: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductSales {
    pub product_id: ProductId,
    pub product_name: String,
    pub units: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySales {
    pub category: String,
    pub units: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesReport {
    pub period_days: u32,
    /// First day counted.
    pub since: NaiveDate,
    pub until: NaiveDate,
    /// Outflow rows in the period.
    pub transactions: usize,
    pub units: u64,
    pub distinct_products: usize,
    /// `units / period_days`.
    pub daily_average: f64,
    pub by_day: Vec<DaySales>,
    /// Highest first.
    pub by_product: Vec<ProductSales>,
    /// Highest first.
    pub by_category: Vec<CategorySales>,
}

/// Outflows dated in `(as_of - days, as_of]`, aggregated.
///
/// Rows with unparseable timestamps, and rows dated after `as_of`, are not
/// counted. Products missing from the snapshot still count, labelled by id.
/// A zero-day period is reported as one day; very long periods start at the
/// earliest representable date.
pub fn sales_report(products: &[Product], movements: &[Movement], as_of: NaiveDate, days: u32) -> SalesReport {
    let days = days.max(1);
    let since = window_start(as_of, days);

    let mut transactions = 0usize;
    let mut per_day: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    let mut per_product: BTreeMap<ProductId, u64> = BTreeMap::new();
    for m in movements.iter().filter(|m| m.is_outflow()) {
        let Some(day) = m.occurred_on() else { continue };
        if day < since || day > as_of {
            continue;
        }
        transactions += 1;
        *per_day.entry(day).or_insert(0) += u64::from(m.quantity);
        *per_product.entry(m.product_id).or_insert(0) += u64::from(m.quantity);
    }

    let mut per_category: BTreeMap<String, u64> = BTreeMap::new();
    let mut by_product: Vec<ProductSales> = per_product
        .iter()
        .map(|(&product_id, &units)| {
            let product = find_product(products, product_id);
            let category = product.map_or(UNCATEGORIZED, Product::category_label);
            *per_category.entry(category.to_string()).or_insert(0) += units;
            ProductSales {
                product_id,
                product_name: product.map_or_else(|| format!("Product {product_id}"), |p| p.name.clone()),
                units,
            }
        })
        .collect();
    by_product.sort_by(|a, b| b.units.cmp(&a.units));

    let mut by_category: Vec<CategorySales> = per_category
        .into_iter()
        .map(|(category, units)| CategorySales { category, units })
        .collect();
    by_category.sort_by(|a, b| b.units.cmp(&a.units));

    let units: u64 = per_day.values().sum();
    let distinct_products = per_product.len();

    SalesReport {
        period_days: days,
        since,
        until: as_of,
        transactions,
        units,
        distinct_products,
        daily_average: units as f64 / f64::from(days),
        by_day: per_day.into_iter().map(|(date, units)| DaySales { date, units }).collect(),
        by_product,
        by_category,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
    }

    fn products() -> Vec<Product> {
        vec![
            Product::new(ProductId::new(1), "Cola", 2.0, 10).with_category("Drinks"),
            Product::new(ProductId::new(2), "Chips", 3.0, 10).with_category("Snacks"),
            Product::new(ProductId::new(3), "Water", 1.0, 10).with_category("Drinks"),
        ]
    }

    #[test]
    fn aggregates_the_period() {
        let movements = vec![
            Movement::outflow(1, 1, 5, "2024-06-30 09:00:00"),
            Movement::outflow(2, 1, 3, "2024-06-29 18:30:00"),
            Movement::outflow(3, 2, 4, "2024-06-29"),
            Movement::outflow(4, 3, 6, "2024-06-01"),
            Movement::outflow(5, 3, 9, "2024-05-31"),
            Movement::inflow(6, 1, 50, "2024-06-29"),
            Movement::outflow(7, 7, 2, "2024-06-28"),
            Movement::outflow(8, 1, 1, "not a date"),
            Movement::outflow(9, 1, 1, "2024-07-01"),
        ];
        let report = sales_report(&products(), &movements, as_of(), 30);

        assert_eq!(report.since, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert_eq!(report.transactions, 5);
        assert_eq!(report.units, 20);
        assert_eq!(report.distinct_products, 4);
        assert!((report.daily_average - 20.0 / 30.0).abs() < 1e-12);

        assert_eq!(report.by_product[0].product_name, "Cola");
        assert_eq!(report.by_product[0].units, 8);
        assert!(report.by_product.iter().any(|p| p.product_name == "Product 7"));

        let categories: Vec<(&str, u64)> = report.by_category.iter().map(|c| (c.category.as_str(), c.units)).collect();
        assert_eq!(categories, vec![("Drinks", 14), ("Snacks", 4), ("Uncategorized", 2)]);
        assert_eq!(report.by_day.first().map(|d| d.units), Some(6));
    }

    #[test]
    fn period_longer_than_the_calendar_starts_at_the_earliest_date() {
        let movements = vec![Movement::outflow(1, 1, 5, "2024-06-30 09:00:00")];
        let report = sales_report(&products(), &movements, as_of(), u32::MAX);
        assert_eq!(report.since, NaiveDate::MIN);
        assert_eq!(report.units, 5);
        assert_eq!(report.period_days, u32::MAX);
    }

    #[test]
    fn zero_day_period_counts_the_reference_day() {
        let movements = vec![
            Movement::outflow(1, 1, 5, "2024-06-30 09:00:00"),
            Movement::outflow(2, 1, 3, "2024-06-29 09:00:00"),
        ];
        let report = sales_report(&products(), &movements, as_of(), 0);
        assert_eq!(report.period_days, 1);
        assert_eq!(report.since, as_of());
        assert_eq!(report.units, 5);
        assert_eq!(report.daily_average, 5.0);
    }

    #[test]
    fn empty_period_is_zeroed() {
        let report = sales_report(&products(), &[], as_of(), 7);
        assert_eq!(report.transactions, 0);
        assert_eq!(report.units, 0);
        assert_eq!(report.daily_average, 0.0);
        assert!(report.by_day.is_empty() && report.by_product.is_empty() && report.by_category.is_empty());
    }
}
