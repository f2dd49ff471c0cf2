//! Optional free-text suggestions from an external text generator.
//!
//! The provider only ever sees already-computed report fields, never the raw
//! movement log, and nothing it returns feeds back into the numbers.

use std::fmt::Write as _;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::portfolio::PortfolioSummary;
use crate::urgency::UrgencyTier;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichmentItem {
    pub product_name: String,
    pub tier: UrgencyTier,
    pub current_stock: u32,
    pub days_to_stockout: u32,
    pub reorder_quantity: u32,
}

/// What a provider is allowed to see.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichmentRequest {
    pub items: Vec<EnrichmentItem>,
    pub critical_count: usize,
    pub attention_count: usize,
    pub urgent_investment: f64,
}

impl EnrichmentRequest {
    /// At most `limit` urgent reports, CRITICAL first.
    pub fn from_summary(summary: &PortfolioSummary, limit: usize) -> Self {
        let items = summary
            .critical
            .iter()
            .chain(summary.attention.iter())
            .take(limit)
            .map(|r| EnrichmentItem {
                product_name: r.product_name.clone(),
                tier: r.tier,
                current_stock: r.current_stock,
                days_to_stockout: r.days_to_stockout,
                reorder_quantity: r.reorder_quantity,
            })
            .collect();

        Self {
            items,
            critical_count: summary.counts.critical,
            attention_count: summary.counts.attention,
            urgent_investment: summary.urgent_investment,
        }
    }

    /// Plain-text rendering for providers that take a prompt.
    pub fn prompt(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{} critical and {} attention products; {:.2} needed for restock.",
            self.critical_count, self.attention_count, self.urgent_investment
        );
        for item in &self.items {
            let _ = writeln!(
                out,
                "- {} [{}]: stock {}, {} days left, reorder {}",
                item.product_name, item.tier, item.current_stock, item.days_to_stockout, item.reorder_quantity
            );
        }
        out.push_str("Reply with a JSON array of short purchasing suggestions.");
        out
    }
}

/// Source of free-text purchasing suggestions.
///
/// `None` means "nothing to add"; callers treat it the same as a failure.
pub trait TextInsightProvider: Send + Sync {
    fn suggest(&self, request: &EnrichmentRequest) -> Option<Vec<String>>;
}

impl<P> TextInsightProvider for Arc<P>
where
    P: TextInsightProvider + ?Sized,
{
    fn suggest(&self, request: &EnrichmentRequest) -> Option<Vec<String>> {
        (**self).suggest(request)
    }
}

/// Provider used when no text generator is configured.
#[derive(Debug, Default, Copy, Clone)]
pub struct NullInsightProvider;

impl TextInsightProvider for NullInsightProvider {
    fn suggest(&self, _request: &EnrichmentRequest) -> Option<Vec<String>> {
        None
    }
}

/// Parse a generator reply into suggestion lines.
///
/// Accepts a JSON array of strings, or an object with an `insights` array,
/// optionally wrapped in a ```` ```json ```` fence. Non-string entries are
/// ignored.
pub fn parse_suggestions(raw: &str) -> Option<Vec<String>> {
    let body = strip_fence(raw.trim());
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "suggestion reply is not JSON");
            return None;
        }
    };

    let entries = match &value {
        Value::Array(entries) => entries,
        Value::Object(map) => match map.get("insights") {
            Some(Value::Array(entries)) => entries,
            _ => {
                warn!("suggestion reply has no `insights` array");
                return None;
            }
        },
        _ => {
            warn!("suggestion reply is neither an array nor an object");
            return None;
        }
    };

    let lines: Vec<String> = entries
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    (!lines.is_empty()).then_some(lines)
}

fn strip_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // drop the info string (e.g. `json`) on the opening line
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

/// Extra suggestion lines for a summary; empty on any failure.
pub fn enrich(summary: &PortfolioSummary, provider: &dyn TextInsightProvider, limit: usize) -> Vec<String> {
    let request = EnrichmentRequest::from_summary(summary, limit);
    if request.items.is_empty() {
        debug!("no urgent products; skipping enrichment");
        return Vec::new();
    }
    provider.suggest(&request).unwrap_or_default()
}
