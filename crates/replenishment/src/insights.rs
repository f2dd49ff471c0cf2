//! Dashboard composition over an analysis summary.
//!
//! Pure formatting: nothing here changes a number computed upstream.

use std::collections::BTreeMap;

use serde::Serialize;

use restock_products::Product;

use crate::portfolio::PortfolioSummary;
use crate::urgency::UrgencyReport;

pub const DEFAULT_TOP_CRITICAL: usize = 5;

/// Sales and stock aggregates of one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryStats {
    pub category: String,
    pub product_count: usize,
    pub units_sold_30d: u64,
    /// `units_sold_last_30_days × unit_price`, summed.
    pub revenue_30d: f64,
    pub stock_units: u64,
    pub stock_value: f64,
    /// 30-day units sold per unit in stock.
    pub turnover: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardMetrics {
    pub total_products: usize,
    pub stock_value: f64,
    pub critical_count: usize,
    pub attention_count: usize,
    pub units_sold_30d: u64,
    pub investment_needed: f64,
    pub category_count: usize,
    pub model_based_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub metrics: DashboardMetrics,
    pub alerts: Vec<String>,
    pub recommendations: Vec<String>,
    pub top_critical: Vec<UrgencyReport>,
    /// Sorted by 30-day revenue, highest first.
    pub categories: Vec<CategoryStats>,
    pub most_profitable_category: Option<String>,
}

/// Per-category aggregates, highest 30-day revenue first (ties by name).
pub fn category_stats(products: &[Product]) -> Vec<CategoryStats> {
    let mut by_category: BTreeMap<&str, CategoryStats> = BTreeMap::new();
    for product in products {
        let label = product.category_label();
        let stats = by_category.entry(label).or_insert_with(|| CategoryStats {
            category: label.to_string(),
            product_count: 0,
            units_sold_30d: 0,
            revenue_30d: 0.0,
            stock_units: 0,
            stock_value: 0.0,
            turnover: 0.0,
        });
        stats.product_count += 1;
        stats.units_sold_30d += u64::from(product.units_sold_last_30_days);
        stats.revenue_30d += f64::from(product.units_sold_last_30_days) * product.unit_price;
        stats.stock_units += u64::from(product.current_stock);
        stats.stock_value += product.stock_value();
    }

    let mut stats: Vec<CategoryStats> = by_category
        .into_values()
        .map(|mut s| {
            s.turnover = s.units_sold_30d as f64 / s.stock_units.max(1) as f64;
            s
        })
        .collect();
    stats.sort_by(|a, b| b.revenue_30d.total_cmp(&a.revenue_30d));
    stats
}

/// Builds the executive dashboard.
#[derive(Debug, Clone, Copy)]
pub struct InsightComposer {
    top_critical: usize,
}

impl Default for InsightComposer {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_CRITICAL)
    }
}

impl InsightComposer {
    pub fn new(top_critical: usize) -> Self {
        Self { top_critical }
    }

    pub fn compose(&self, summary: &PortfolioSummary, products: &[Product]) -> Dashboard {
        let categories = category_stats(products);
        let most_profitable_category = categories
            .first()
            .filter(|c| c.revenue_30d > 0.0)
            .map(|c| c.category.clone());

        let metrics = DashboardMetrics {
            total_products: products.len(),
            stock_value: categories.iter().map(|c| c.stock_value).sum(),
            critical_count: summary.counts.critical,
            attention_count: summary.counts.attention,
            units_sold_30d: categories.iter().map(|c| c.units_sold_30d).sum(),
            investment_needed: summary.urgent_investment,
            category_count: categories.len(),
            model_based_count: summary.model_based_count,
        };

        let mut alerts = Vec::new();
        if metrics.critical_count > 0 {
            alerts.push(format!("{} products with critical stock", metrics.critical_count));
        }
        if metrics.attention_count > 0 {
            alerts.push(format!("{} products need attention", metrics.attention_count));
        }
        if metrics.investment_needed > 0.0 {
            alerts.push(format!("{:.2} needed for restock", metrics.investment_needed));
        }

        let mut recommendations = Vec::new();
        let urgent = metrics.critical_count + metrics.attention_count;
        if urgent > 0 {
            recommendations.push(format!("{urgent} products need urgent reorder"));
        }
        if let Some(category) = &most_profitable_category {
            recommendations.push(format!("Focus purchasing on {category}"));
        }

        Dashboard {
            top_critical: summary.critical.iter().take(self.top_critical).cloned().collect(),
            metrics,
            alerts,
            recommendations,
            categories,
            most_profitable_category,
        }
    }
}
