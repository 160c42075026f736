//! Pipeline-level errors

use crate::lifecycle::Interrupted;
use crate::service::QueryError;
use crate::validate::ValidationError;
use thiserror::Error;

/// Why a pipeline run produced no result.
///
/// Only `Validation` and `Query` are meant for the user. `Cancelled`
/// terminates quietly and `Stale` is dropped without a trace.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The initial parcel query failed
    #[error("parcel query failed: {0}")]
    Query(QueryError),

    #[error("request cancelled")]
    Cancelled,

    #[error("request superseded by a newer one")]
    Stale,
}

impl PipelineError {
    pub fn is_user_visible(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Query(_))
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Stale)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<QueryError> for PipelineError {
    fn from(e: QueryError) -> Self {
        match e {
            QueryError::Cancelled => Self::Cancelled,
            other => Self::Query(other),
        }
    }
}

impl From<Interrupted> for PipelineError {
    fn from(e: Interrupted) -> Self {
        match e {
            Interrupted::Stale => Self::Stale,
            Interrupted::Cancelled => Self::Cancelled,
        }
    }
}
