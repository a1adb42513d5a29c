//! Structured logging for the news trader.
//!
//! Every decision the controller takes (entries, SL/TP adjustments, sizing
//! clamps, timeout closes, venue rejections) is emitted as a `tracing` event
//! with structured fields; this crate only installs the subscriber.

pub mod error;
pub mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{init_logging, LogFormat, LoggingConfig};
