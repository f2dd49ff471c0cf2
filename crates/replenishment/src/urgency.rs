//! Urgency classification of a single product.
//!
//! Turns a demand forecast plus the stock snapshot into a tier, a reorder
//! quantity, the money needed for it and a few human-readable notes.

use std::fmt;
use std::sync::Arc;

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use restock_core::ProductId;
use restock_forecast::{DemandEngine, DemandOutcome, FitReport, ModelCache};
use restock_inventory::{Movement, weekday_totals};
use restock_products::{Product, find_product};

use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, AnalysisResult};

/// `days_to_stockout` when nothing is forecast to sell.
pub const UNBOUNDED_DAYS: u32 = 999;

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Restock urgency, most urgent first (`Critical < Excess`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UrgencyTier {
    Critical,
    Attention,
    Normal,
    Excess,
}

impl UrgencyTier {
    pub const ALL: [UrgencyTier; 4] = [
        UrgencyTier::Critical,
        UrgencyTier::Attention,
        UrgencyTier::Normal,
        UrgencyTier::Excess,
    ];

    /// CRITICAL or ATTENTION.
    pub fn is_urgent(self) -> bool {
        matches!(self, UrgencyTier::Critical | UrgencyTier::Attention)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UrgencyTier::Critical => "CRITICAL",
            UrgencyTier::Attention => "ATTENTION",
            UrgencyTier::Normal => "NORMAL",
            UrgencyTier::Excess => "EXCESS",
        }
    }
}

impl fmt::Display for UrgencyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A note attached to a report. Rendered through `Display`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Insight {
    ModelForecast { units: f64, horizon_days: u32 },
    HistoryAggregate { units_sold_30d: u32 },
    SyntheticHistory,
    StockVeryLow { stock: u32 },
    RunsOutIn { days: u32 },
    UrgentRestock,
    LowStock { stock: u32 },
    CoverFor { days: u32 },
    MonitorStock { stock: u32 },
    NormalCover { days: u32 },
    PossibleExcess { days: u32 },
    BestSellingDay { weekday: Weekday },
}

impl fmt::Display for Insight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Insight::ModelForecast { units, horizon_days } => {
                write!(f, "Model forecasts demand of {units:.1} units over {horizon_days} days")
            }
            Insight::HistoryAggregate { units_sold_30d } => {
                write!(f, "Based on history: {units_sold_30d} sold in the last 30 days")
            }
            Insight::SyntheticHistory => f.write_str("Forecast trained on synthetic history (no daily sales records)"),
            Insight::StockVeryLow { stock } => write!(f, "CRITICAL: stock very low ({stock} units)"),
            Insight::RunsOutIn { days } => write!(f, "CRITICAL: runs out in {days} days"),
            Insight::UrgentRestock => f.write_str("CRITICAL: urgent restock needed"),
            Insight::LowStock { stock } => write!(f, "ATTENTION: low stock ({stock} units)"),
            Insight::CoverFor { days } => write!(f, "ATTENTION: stock for {days} days"),
            Insight::MonitorStock { stock } => write!(f, "Stock adequate but monitor ({stock} units)"),
            Insight::NormalCover { days } => write!(f, "Stock normal for {days} days"),
            Insight::PossibleExcess { days } => write!(f, "Possible excess: stock for {days}+ days"),
            Insight::BestSellingDay { weekday } => write!(f, "Best sales day: {weekday}"),
        }
    }
}

/// Result of classifying one product. Built fresh per analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UrgencyReport {
    pub product_id: ProductId,
    pub product_name: String,
    pub category: String,
    pub tier: UrgencyTier,
    pub days_to_stockout: u32,
    pub current_stock: u32,
    /// Units forecast over the horizon.
    pub forecast_total: f64,
    pub daily_demand: f64,
    pub reorder_quantity: u32,
    pub unit_cost: f64,
    pub investment: f64,
    pub insights: Vec<Insight>,
    pub used_model_based_estimate: bool,
    pub used_synthetic_history: bool,
    pub model_fit: Option<FitReport>,
}

impl UrgencyReport {
    pub fn insight_lines(&self) -> Vec<String> {
        self.insights.iter().map(ToString::to_string).collect()
    }
}

/// Whole days until stock runs out at the forecast rate.
pub fn days_to_stockout(stock: u32, forecast_total: f64, horizon_days: u32) -> u32 {
    if !(forecast_total > 0.0) || horizon_days == 0 {
        return UNBOUNDED_DAYS;
    }
    let daily = forecast_total / f64::from(horizon_days);
    // float -> int casts saturate
    (f64::from(stock) / daily).trunc() as u32
}

/// Weekday with the most outflow units; ties go to the earliest weekday.
pub fn best_selling_weekday(movements: &[Movement], product_id: ProductId) -> Option<Weekday> {
    let totals = weekday_totals(movements, product_id);
    let (best, &units) = totals
        .iter()
        .enumerate()
        .fold((0, &totals[0]), |acc, (i, v)| if *v > *acc.1 { (i, v) } else { acc });
    (units > 0).then(|| WEEKDAYS[best])
}

/// Classifies products against [`AnalysisConfig`].
#[derive(Debug, Clone)]
pub struct UrgencyClassifier {
    config: AnalysisConfig,
    engine: DemandEngine,
}

impl UrgencyClassifier {
    pub fn new(config: AnalysisConfig) -> Self {
        let engine = DemandEngine::new(config.forecast.clone());
        Self { config, engine }
    }

    pub fn with_cache(mut self, cache: Arc<dyn ModelCache>) -> Self {
        self.engine = self.engine.with_cache(cache);
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn engine(&self) -> &DemandEngine {
        &self.engine
    }

    /// Tier precedence; the first matching rule wins.
    pub fn tier(&self, stock: u32, daily_demand: f64, days: u32) -> UrgencyTier {
        let t = &self.config.thresholds;
        let selling = daily_demand > 0.0;

        if stock == 0 || stock <= t.critical_stock || (selling && days <= t.critical_days) {
            UrgencyTier::Critical
        } else if (selling && days <= t.attention_days) || stock <= t.attention_stock {
            UrgencyTier::Attention
        } else if (selling && days <= t.normal_days) || stock <= t.normal_stock {
            UrgencyTier::Normal
        } else {
            UrgencyTier::Excess
        }
    }

    /// Units to buy so stock covers the target.
    pub fn reorder_quantity(&self, product: &Product, daily_demand: f64) -> u32 {
        let cfg = &self.config;
        let target = if daily_demand > 0.0 {
            daily_demand * f64::from(cfg.coverage_days) * cfg.safety_factor
        } else {
            let average = f64::from(product.units_sold_last_30_days) / 30.0;
            if average > 0.0 {
                average * f64::from(cfg.no_demand_cover_days)
            } else {
                f64::from(cfg.min_restock_units)
            }
        };

        let shortfall = target - f64::from(product.current_stock);
        if shortfall <= 0.0 {
            0
        } else {
            // tolerate float noise on exact integers
            (shortfall - 1e-9).ceil().max(0.0) as u32
        }
    }

    /// Classify a product whose demand has already been estimated.
    pub fn assess(&self, product: &Product, outcome: &DemandOutcome, movements: &[Movement]) -> UrgencyReport {
        let horizon_days = self.config.horizon_days;
        let forecast_total = outcome.forecast.total();
        let daily_demand = if horizon_days == 0 {
            0.0
        } else {
            forecast_total / f64::from(horizon_days)
        };
        let stock = product.current_stock;
        let days = days_to_stockout(stock, forecast_total, horizon_days);
        let tier = self.tier(stock, daily_demand, days);
        let reorder_quantity = self.reorder_quantity(product, daily_demand);
        let unit_cost = product.effective_unit_cost(self.config.cost_ratio);

        let mut insights = Vec::with_capacity(4);
        if outcome.used_model_based_estimate() {
            insights.push(Insight::ModelForecast {
                units: forecast_total,
                horizon_days,
            });
        } else {
            insights.push(Insight::HistoryAggregate {
                units_sold_30d: product.units_sold_last_30_days,
            });
        }
        if outcome.used_synthetic_history() {
            insights.push(Insight::SyntheticHistory);
        }
        insights.push(self.tier_insight(tier, stock, days));
        if let Some(weekday) = best_selling_weekday(movements, product.id) {
            insights.push(Insight::BestSellingDay { weekday });
        }

        UrgencyReport {
            product_id: product.id,
            product_name: product.name.clone(),
            category: product.category_label().to_string(),
            tier,
            days_to_stockout: days,
            current_stock: stock,
            forecast_total,
            daily_demand,
            reorder_quantity,
            unit_cost,
            investment: f64::from(reorder_quantity) * unit_cost,
            insights,
            used_model_based_estimate: outcome.used_model_based_estimate(),
            used_synthetic_history: outcome.used_synthetic_history(),
            model_fit: outcome.fit.clone(),
        }
    }

    fn tier_insight(&self, tier: UrgencyTier, stock: u32, days: u32) -> Insight {
        let t = &self.config.thresholds;
        match tier {
            UrgencyTier::Critical if stock <= t.critical_stock => Insight::StockVeryLow { stock },
            UrgencyTier::Critical if days <= t.critical_days => Insight::RunsOutIn { days },
            UrgencyTier::Critical => Insight::UrgentRestock,
            UrgencyTier::Attention if stock <= t.attention_stock => Insight::LowStock { stock },
            UrgencyTier::Attention => Insight::CoverFor { days },
            UrgencyTier::Normal if stock <= t.normal_stock => Insight::MonitorStock { stock },
            UrgencyTier::Normal => Insight::NormalCover { days },
            UrgencyTier::Excess => Insight::PossibleExcess { days },
        }
    }

    /// Estimate demand for `product` and classify it.
    pub fn classify(&self, product: &Product, movements: &[Movement], as_of: NaiveDate) -> AnalysisResult<UrgencyReport> {
        product.validate().map_err(|source| AnalysisError::InvalidProduct {
            id: product.id,
            source,
        })?;
        let outcome = self
            .engine
            .forecast(product, movements, as_of, self.config.horizon());
        Ok(self.assess(product, &outcome, movements))
    }

    /// Look up `product_id` in the snapshot and classify it.
    pub fn classify_product(
        &self,
        products: &[Product],
        movements: &[Movement],
        product_id: ProductId,
        as_of: NaiveDate,
    ) -> AnalysisResult<UrgencyReport> {
        let product = find_product(products, product_id).ok_or(AnalysisError::ProductNotFound(product_id))?;
        self.classify(product, movements, as_of)
    }
}
