//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Symbol error: {0}")]
    Core(#[from] newstrader_core::CoreError),

    #[error("Risk error: {0}")]
    Risk(#[from] newstrader_risk::RiskError),

    #[error("Schedule error: {0}")]
    Position(#[from] newstrader_position::PositionError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] newstrader_telemetry::TelemetryError),

    #[error("Feed error at line {line}: {reason}")]
    Feed { line: usize, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
