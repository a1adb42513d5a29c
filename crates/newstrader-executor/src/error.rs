//! Executor error types.

use newstrader_core::PositionId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("Order submission failed: {0}")]
    SubmissionFailed(String),

    #[error("Request rejected by venue: {0}")]
    Rejected(String),

    #[error("Position not found: {0}")]
    PositionNotFound(PositionId),
}

pub type ExecutorResult<T> = Result<T, ExecutorError>;
