//! `restock-replenishment`
//!
//! **Responsibility:** restock decisions over a product snapshot.
//!
//! - Classifies each product into an urgency tier with a reorder quantity and
//!   the investment it needs.
//! - Aggregates a whole snapshot into a portfolio summary and purchase list.
//! - Composes dashboard alerts/recommendations and trailing sales reports.
//!
//! Read-only over caller-owned snapshots; no persistence, no network.

pub mod config;
pub mod enrichment;
pub mod error;
pub mod insights;
pub mod portfolio;
pub mod sales;
pub mod urgency;

pub use config::{AnalysisConfig, UrgencyThresholds};
pub use enrichment::{
    EnrichmentItem, EnrichmentRequest, NullInsightProvider, TextInsightProvider, enrich, parse_suggestions,
};
pub use error::{AnalysisError, AnalysisResult};
pub use insights::{CategoryStats, Dashboard, DashboardMetrics, InsightComposer, category_stats};
pub use portfolio::{PortfolioAnalyzer, PortfolioSummary, PurchaseLine, SkippedProduct, TierCounts};
pub use sales::{CategorySales, DaySales, ProductSales, SalesReport, sales_report};
pub use urgency::{
    Insight, UNBOUNDED_DAYS, UrgencyClassifier, UrgencyReport, UrgencyTier, best_selling_weekday, days_to_stockout,
};
