//! Error types for the recommender metrics library

use thiserror::Error;

/// Errors raised while building metrics or parsing resource quantities.
///
/// Observation paths never fail; only registration and quantity parsing do.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("failed to register metric: {0}")]
    Registration(#[from] prometheus::Error),

    #[error("invalid quantity {input:?}: {reason}")]
    InvalidQuantity { input: String, reason: &'static str },
}

pub type Result<T> = std::result::Result<T, MetricsError>;
