use thiserror::Error;

use restock_core::{DomainError, ProductId};

/// Per-product analysis failures.
///
/// Non-fatal for batch callers: the portfolio analyzer logs and skips them.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    #[error("invalid product {id}: {source}")]
    InvalidProduct {
        id: ProductId,
        #[source]
        source: DomainError,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl AnalysisError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;
