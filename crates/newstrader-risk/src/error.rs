//! Risk error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RiskError {
    #[error("Invalid risk specification: {0}")]
    InvalidSpec(String),

    #[error("Invalid volatility parameters: {0}")]
    InvalidVolatility(String),
}

pub type RiskResult<T> = Result<T, RiskError>;
