//! Position error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PositionError {
    #[error("Invalid event schedule: {0}")]
    InvalidSchedule(String),
}

pub type PositionResult<T> = Result<T, PositionError>;
