//! Batch classification of a whole product snapshot.

use std::sync::Arc;
use std::thread;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use restock_core::ProductId;
use restock_forecast::ModelCache;
use restock_inventory::Movement;
use restock_products::Product;

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::urgency::{UrgencyClassifier, UrgencyReport, UrgencyTier};

/// A product left out of a batch, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedProduct {
    pub product_id: ProductId,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TierCounts {
    pub critical: usize,
    pub attention: usize,
    pub normal: usize,
    pub excess: usize,
}

/// One line of the purchase list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurchaseLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub tier: UrgencyTier,
    pub quantity: u32,
    pub days_to_stockout: u32,
    pub unit_cost: f64,
    pub investment: f64,
}

/// Portfolio-level view of one analysis run.
///
/// Each tier list is sorted by `days_to_stockout`, ascending and stable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioSummary {
    pub as_of: NaiveDate,
    pub total_products: usize,
    pub counts: TierCounts,
    pub critical: Vec<UrgencyReport>,
    pub attention: Vec<UrgencyReport>,
    pub normal: Vec<UrgencyReport>,
    pub excess: Vec<UrgencyReport>,
    /// Money needed to restock the CRITICAL tier.
    pub critical_investment: f64,
    /// Money needed to restock CRITICAL and ATTENTION.
    pub urgent_investment: f64,
    pub model_based_count: usize,
    pub skipped: Vec<SkippedProduct>,
}

impl PortfolioSummary {
    fn from_reports(as_of: NaiveDate, total_products: usize, reports: Vec<UrgencyReport>, skipped: Vec<SkippedProduct>) -> Self {
        let model_based_count = reports.iter().filter(|r| r.used_model_based_estimate).count();

        let (mut critical, mut attention, mut normal, mut excess) = (Vec::new(), Vec::new(), Vec::new(), Vec::new());
        for report in reports {
            match report.tier {
                UrgencyTier::Critical => critical.push(report),
                UrgencyTier::Attention => attention.push(report),
                UrgencyTier::Normal => normal.push(report),
                UrgencyTier::Excess => excess.push(report),
            }
        }
        for list in [&mut critical, &mut attention, &mut normal, &mut excess] {
            list.sort_by_key(|r| r.days_to_stockout);
        }

        let critical_investment: f64 = critical.iter().map(|r| r.investment).sum();
        let attention_investment: f64 = attention.iter().map(|r| r.investment).sum();

        Self {
            as_of,
            total_products,
            counts: TierCounts {
                critical: critical.len(),
                attention: attention.len(),
                normal: normal.len(),
                excess: excess.len(),
            },
            critical,
            attention,
            normal,
            excess,
            critical_investment,
            urgent_investment: critical_investment + attention_investment,
            model_based_count,
            skipped,
        }
    }

    pub fn tier(&self, tier: UrgencyTier) -> &[UrgencyReport] {
        match tier {
            UrgencyTier::Critical => &self.critical,
            UrgencyTier::Attention => &self.attention,
            UrgencyTier::Normal => &self.normal,
            UrgencyTier::Excess => &self.excess,
        }
    }

    /// Number of reports that were produced.
    pub fn analyzed(&self) -> usize {
        self.counts.critical + self.counts.attention + self.counts.normal + self.counts.excess
    }

    /// All reports, most urgent tier first.
    pub fn reports(&self) -> impl Iterator<Item = &UrgencyReport> {
        UrgencyTier::ALL.into_iter().flat_map(move |tier| self.tier(tier).iter())
    }

    pub fn report_for(&self, product_id: ProductId) -> Option<&UrgencyReport> {
        self.reports().find(|r| r.product_id == product_id)
    }

    /// What to buy now: urgent products with something to reorder, soonest
    /// stockout first.
    pub fn purchase_list(&self) -> Vec<PurchaseLine> {
        let mut lines: Vec<PurchaseLine> = self
            .critical
            .iter()
            .chain(self.attention.iter())
            .filter(|r| r.reorder_quantity > 0)
            .map(|r| PurchaseLine {
                product_id: r.product_id,
                product_name: r.product_name.clone(),
                tier: r.tier,
                quantity: r.reorder_quantity,
                days_to_stockout: r.days_to_stockout,
                unit_cost: r.unit_cost,
                investment: r.investment,
            })
            .collect();
        lines.sort_by_key(|l| l.days_to_stockout);
        lines
    }
}

/// Classifies every product of a snapshot.
#[derive(Debug, Clone)]
pub struct PortfolioAnalyzer {
    classifier: UrgencyClassifier,
    workers: usize,
}

impl PortfolioAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        let workers = config.workers.max(1);
        Self {
            classifier: UrgencyClassifier::new(config),
            workers,
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn ModelCache>) -> Self {
        self.classifier = self.classifier.with_cache(cache);
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn classifier(&self) -> &UrgencyClassifier {
        &self.classifier
    }

    pub fn config(&self) -> &AnalysisConfig {
        self.classifier.config()
    }

    /// Classify the whole snapshot. Per-product failures are logged and
    /// skipped; they never abort the batch.
    pub fn analyze(&self, products: &[Product], movements: &[Movement], as_of: NaiveDate) -> PortfolioSummary {
        let results = if self.workers > 1 && products.len() > 1 {
            self.classify_parallel(products, movements, as_of)
        } else {
            self.classify_chunk(products, movements, as_of)
        };

        let mut reports = Vec::with_capacity(products.len());
        let mut skipped = Vec::new();
        for (product, result) in products.iter().zip(results) {
            match result {
                Ok(report) => reports.push(report),
                Err(e) => {
                    warn!(product = %product.id, error = %e, "skipping product");
                    skipped.push(SkippedProduct {
                        product_id: product.id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        let summary = PortfolioSummary::from_reports(as_of, products.len(), reports, skipped);
        info!(
            products = summary.total_products,
            critical = summary.counts.critical,
            attention = summary.counts.attention,
            skipped = summary.skipped.len(),
            model_based = summary.model_based_count,
            "portfolio analysis finished"
        );
        summary
    }

    fn classify_chunk(
        &self,
        products: &[Product],
        movements: &[Movement],
        as_of: NaiveDate,
    ) -> Vec<Result<UrgencyReport, AnalysisError>> {
        products
            .iter()
            .map(|p| self.classifier.classify(p, movements, as_of))
            .collect()
    }

    /// Fan out over scoped threads; chunks are joined back in input order.
    fn classify_parallel(
        &self,
        products: &[Product],
        movements: &[Movement],
        as_of: NaiveDate,
    ) -> Vec<Result<UrgencyReport, AnalysisError>> {
        let chunk_size = products.len().div_ceil(self.workers);

        thread::scope(|scope| {
            let spawned: Vec<_> = products
                .chunks(chunk_size)
                .enumerate()
                .map(|(i, chunk)| {
                    let handle = thread::Builder::new()
                        .name(format!("restock-analysis-{i}"))
                        .spawn_scoped(scope, move || self.classify_chunk(chunk, movements, as_of));
                    (i, chunk, handle)
                })
                .collect();

            spawned
                .into_iter()
                .flat_map(|(i, chunk, handle)| match handle {
                    Ok(handle) => handle.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)),
                    Err(e) => {
                        warn!(worker = i, error = %e, "could not spawn worker; classifying inline");
                        self.classify_chunk(chunk, movements, as_of)
                    }
                })
                .collect()
        })
    }
}
