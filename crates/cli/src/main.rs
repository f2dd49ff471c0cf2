//! `restock` binary: load JSON snapshots, run the analysis, print JSON.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::info;

use restock_forecast::{DemandEngine, InMemoryModelCache};
use restock_inventory::Movement;
use restock_products::Product;
use restock_replenishment::{
    AnalysisConfig, Dashboard, InsightComposer, NullInsightProvider, PortfolioAnalyzer, enrich, sales_report,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Report {
    /// Full portfolio summary with every product report.
    Summary,
    /// Purchase list (CRITICAL + ATTENTION with something to reorder).
    Purchases,
    /// Executive dashboard: metrics, alerts, categories.
    Dashboard,
    /// Trailing sales report.
    Sales,
    /// Fit every product's model and report accuracy.
    Training,
}

#[derive(Debug, Parser)]
#[command(name = "restock")]
#[command(about = "Demand estimation and restock urgency over inventory snapshots", long_about = None)]
struct Cli {
    /// JSON array of products
    #[arg(long)]
    products: PathBuf,

    /// JSON array of stock movements
    #[arg(long)]
    movements: Option<PathBuf>,

    /// JSON analysis config (missing fields take defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Reference day of the analysis (default: today)
    #[arg(long)]
    as_of: Option<NaiveDate>,

    /// Worker threads for the portfolio analysis
    #[arg(long)]
    workers: Option<usize>,

    /// Skip the regression model and use the heuristic only
    #[arg(long)]
    heuristic_only: bool,

    #[arg(long, value_enum, default_value_t = Report::Summary)]
    report: Report,

    /// Period of the sales report, in days
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u32).range(1..))]
    sales_days: u32,
}

#[derive(Debug, Serialize)]
struct DashboardOutput {
    #[serde(flatten)]
    dashboard: Dashboard,
    suggestions: Vec<String>,
}

fn main() -> Result<()> {
    restock_observability::init();
    let cli = Cli::parse();
    let output = run(&cli)?;
    println!("{output}");
    Ok(())
}

fn run(cli: &Cli) -> Result<String> {
    let config = build_config(cli)?;
    let products: Vec<Product> = read_json(&cli.products)?;
    let movements: Vec<Movement> = match &cli.movements {
        Some(path) => read_json(path)?,
        None => Vec::new(),
    };
    let as_of = cli.as_of.unwrap_or_else(|| chrono::Local::now().date_naive());
    info!(
        products = products.len(),
        movements = movements.len(),
        %as_of,
        report = ?cli.report,
        "snapshot loaded"
    );

    match cli.report {
        Report::Sales => to_json(&sales_report(&products, &movements, as_of, cli.sales_days)),
        Report::Training => {
            let engine = DemandEngine::new(config.forecast.clone());
            to_json(&engine.fit_all(&products, &movements, as_of))
        }
        report => {
            let analyzer = PortfolioAnalyzer::new(config.clone()).with_cache(Arc::new(InMemoryModelCache::new()));
            let summary = analyzer.analyze(&products, &movements, as_of);
            match report {
                Report::Purchases => to_json(&summary.purchase_list()),
                Report::Dashboard => {
                    let dashboard = InsightComposer::new(config.top_critical).compose(&summary, &products);
                    let suggestions = enrich(&summary, &NullInsightProvider, config.top_critical);
                    to_json(&DashboardOutput { dashboard, suggestions })
                }
                _ => to_json(&summary),
            }
        }
    }
}

/// File config (or defaults), then `RESTOCK_*` variables, then flags.
fn build_config(cli: &Cli) -> Result<AnalysisConfig> {
    let base = match &cli.config {
        Some(path) => read_json::<AnalysisConfig>(path)?,
        None => AnalysisConfig::default(),
    };
    let mut config = base.overlay(|key| std::env::var(key).ok());

    if let Some(workers) = cli.workers {
        config.workers = workers;
    }
    if cli.heuristic_only {
        config.forecast.model_based = false;
    }

    if let Err(e) = config.validate() {
        bail!("invalid analysis config: {e}");
    }
    Ok(config)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("failed to serialize output")
}
