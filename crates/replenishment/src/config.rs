use serde::{Deserialize, Serialize};
use tracing::warn;

use restock_forecast::ForecastConfig;
use restock_products::DEFAULT_COST_RATIO;

use crate::error::{AnalysisError, AnalysisResult};

/// Stock/day cut-offs of the urgency tiers.
///
/// Empirically tuned; kept as named configuration rather than literals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UrgencyThresholds {
    pub critical_stock: u32,
    pub attention_stock: u32,
    pub normal_stock: u32,
    pub critical_days: u32,
    pub attention_days: u32,
    pub normal_days: u32,
}

impl Default for UrgencyThresholds {
    fn default() -> Self {
        Self {
            critical_stock: 8,
            attention_stock: 12,
            normal_stock: 18,
            critical_days: 3,
            attention_days: 7,
            normal_days: 21,
        }
    }
}

impl UrgencyThresholds {
    fn validate(&self) -> AnalysisResult<()> {
        let stock_ordered = self.critical_stock <= self.attention_stock && self.attention_stock <= self.normal_stock;
        let days_ordered = self.critical_days <= self.attention_days && self.attention_days <= self.normal_days;
        if !stock_ordered || !days_ordered {
            return Err(AnalysisError::invalid_config(
                "urgency thresholds must be non-decreasing (critical <= attention <= normal)",
            ));
        }
        Ok(())
    }
}

/// Settings for a portfolio analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Days of demand forecast per product.
    pub horizon_days: u32,
    /// Days of demand a reorder should cover.
    pub coverage_days: u32,
    pub safety_factor: f64,
    /// Unit cost as a share of price when no explicit cost is known.
    pub cost_ratio: f64,
    /// Days of 30-day-average sales to stock when nothing is forecast.
    pub no_demand_cover_days: u32,
    /// Reorder target when there is no demand signal at all.
    pub min_restock_units: u32,
    pub thresholds: UrgencyThresholds,
    /// Threads used by the portfolio analyzer (1 = sequential).
    pub workers: usize,
    /// Critical items listed on the dashboard.
    pub top_critical: usize,
    pub forecast: ForecastConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            horizon_days: 14,
            coverage_days: 21,
            safety_factor: 1.2,
            cost_ratio: DEFAULT_COST_RATIO,
            no_demand_cover_days: 15,
            min_restock_units: 20,
            thresholds: UrgencyThresholds::default(),
            workers: 1,
            top_critical: 5,
            forecast: ForecastConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Defaults with the model-based estimator switched off.
    pub fn heuristic_only() -> Self {
        Self {
            forecast: ForecastConfig::heuristic_only(),
            ..Self::default()
        }
    }

    /// Defaults overlaid with `RESTOCK_*` process environment variables.
    pub fn from_env() -> Self {
        Self::default().overlay(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with variables read through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::default().overlay(lookup)
    }

    /// Apply `RESTOCK_*` overrides on top of `self`. Unparseable values are
    /// ignored with a warning.
    pub fn overlay<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = parse_var(&lookup, "RESTOCK_WORKERS") {
            self.workers = v;
        }
        if let Some(v) = parse_var(&lookup, "RESTOCK_HORIZON_DAYS") {
            self.horizon_days = v;
        }
        if let Some(v) = lookup("RESTOCK_MODEL_BASED") {
            match parse_flag(&v) {
                Some(flag) => self.forecast.model_based = flag,
                None => warn!(key = "RESTOCK_MODEL_BASED", value = %v, "ignoring unparseable setting"),
            }
        }
        if let Some(v) = parse_var(&lookup, "RESTOCK_SYNTHETIC_SEED") {
            self.forecast.synthetic_seed = v;
        }
        self
    }

    pub fn validate(&self) -> AnalysisResult<()> {
        if self.horizon_days == 0 || self.coverage_days == 0 {
            return Err(AnalysisError::invalid_config("horizon_days and coverage_days must be positive"));
        }
        if !(self.safety_factor.is_finite() && self.safety_factor > 0.0) {
            return Err(AnalysisError::invalid_config("safety_factor must be positive"));
        }
        if !(self.cost_ratio.is_finite() && self.cost_ratio >= 0.0) {
            return Err(AnalysisError::invalid_config("cost_ratio must be non-negative"));
        }
        if self.workers == 0 {
            return Err(AnalysisError::invalid_config("workers must be at least 1"));
        }
        self.thresholds.validate()?;
        self.forecast
            .validate()
            .map_err(|e| AnalysisError::invalid_config(e.to_string()))
    }

    pub fn horizon(&self) -> usize {
        self.horizon_days as usize
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(key, value = %raw, "ignoring unparseable setting");
            None
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_valid() {
        let cfg = AnalysisConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.horizon(), 14);
        assert_eq!(cfg.cost_ratio, 0.65);
        assert!(cfg.forecast.model_based);
    }

    #[test]
    fn environment_overrides_apply() {
        let cfg = AnalysisConfig::from_lookup(lookup(&[
            ("RESTOCK_WORKERS", "4"),
            ("RESTOCK_HORIZON_DAYS", " 28 "),
            ("RESTOCK_MODEL_BASED", "off"),
            ("RESTOCK_SYNTHETIC_SEED", "7"),
        ]));
        assert_eq!(cfg.workers, 4);
        assert_eq!(cfg.horizon_days, 28);
        assert!(!cfg.forecast.model_based);
        assert_eq!(cfg.forecast.synthetic_seed, 7);
    }

    #[test]
    fn garbage_overrides_are_ignored() {
        let cfg = AnalysisConfig::from_lookup(lookup(&[
            ("RESTOCK_WORKERS", "many"),
            ("RESTOCK_MODEL_BASED", "maybe"),
        ]));
        assert_eq!(cfg, AnalysisConfig::default());
    }

    #[test]
    fn partial_file_config_fills_defaults() {
        let cfg: AnalysisConfig =
            serde_json::from_str(r#"{"workers": 2, "thresholds": {"critical_stock": 5}, "forecast": {"model_based": false}}"#)
                .unwrap();
        assert_eq!(cfg.workers, 2);
        assert_eq!(cfg.thresholds.critical_stock, 5);
        assert_eq!(cfg.thresholds.attention_stock, 12);
        assert!(!cfg.forecast.model_based);
        assert_eq!(cfg.coverage_days, 21);
    }

    #[test]
    fn unordered_thresholds_are_rejected() {
        let cfg = AnalysisConfig {
            thresholds: UrgencyThresholds {
                critical_stock: 20,
                ..UrgencyThresholds::default()
            },
            ..AnalysisConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(AnalysisError::InvalidConfig(_))));
    }
}
