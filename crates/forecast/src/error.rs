use thiserror::Error;

/// Failures of the model-based estimation path.
///
/// None of these reach callers of [`crate::DemandEngine`]: every one of them
/// selects the heuristic estimate instead.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ForecastError {
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("normal equations are singular")]
    SingularSystem,
}

pub type ForecastResult<T> = Result<T, ForecastError>;
