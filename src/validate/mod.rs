//! Input validation performed before any query runs

mod host_url;

pub use host_url::{check_layer_url, validate, LayerUrl};

use thiserror::Error;

/// Rejected input. Surfaced immediately, never retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("invalid data source URL: {0}")]
    InvalidUrl(String),

    #[error("host not allowed: {0}")]
    HostNotAllowed(String),

    #[error("data source not configured: {0}")]
    MissingDataSource(String),

    #[error("no map point given")]
    MissingPoint,
}

/// Result type for validation steps
pub type ValidationResult<T> = Result<T, ValidationError>;
