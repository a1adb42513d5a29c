//! Core domain types for the news trader.
//!
//! This crate provides fundamental types used throughout the controller:
//! - `Price`, `Volume`: Precision-safe numeric types
//! - `SymbolSpec`: Symbol specification (pip size, digits, volume limits)
//! - `MarketSnapshot`, `AccountSnapshot`: Per-update market and account state
//! - `TrackedPosition`: Read-only view of a platform-owned position
//! - `TradeSide`, `MarketRangeOrder`: Trading enums and requests

pub mod decimal;
pub mod error;
pub mod order;
pub mod position;
pub mod types;

pub use decimal::{Price, Volume};
pub use error::{CoreError, Result};
pub use order::{MarketRangeOrder, PositionId, TradeSide};
pub use position::TrackedPosition;
pub use types::{AccountSnapshot, Bar, MarketSnapshot, SymbolSpec};
