//! Order-related types and identifiers.
//!
//! Provides trade side, position identifiers and the market-range order
//! request submitted to the platform.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::{Price, Volume};

/// Trade direction: buy (long) or sell (short).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    /// Returns the opposite side.
    pub fn opposite(&self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }

    /// Returns 1 for buy, -1 for sell.
    pub fn sign(&self) -> i8 {
        match self {
            Self::Buy => 1,
            Self::Sell => -1,
        }
    }
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

/// Platform-assigned position identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PositionId(String);

impl PositionId {
    /// Create a new unique position ID.
    ///
    /// Format: `nt_{timestamp_ms}_{uuid_short}`
    pub fn new() -> Self {
        let ts = chrono::Utc::now().timestamp_millis();
        let uuid_short = &Uuid::new_v4().to_string()[..8];
        Self(format!("nt_{ts}_{uuid_short}"))
    }

    /// Create from an existing string (for platform responses).
    pub fn from_string(s: String) -> Self {
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for PositionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PositionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for PositionId {
    fn from(s: String) -> Self {
        Self::from_string(s)
    }
}

/// Market order with a bounded fill range around `base_price`.
///
/// Stop and target are absolute prices already rounded to the symbol's
/// digits; `None` means the level is not attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketRangeOrder {
    pub side: TradeSide,
    pub symbol: String,
    pub volume: Volume,
    /// Quoted price the range is measured from (ask for buys, bid for sells).
    pub base_price: Price,
    /// Maximum accepted deviation from `base_price`, in pips.
    pub slippage_pips: u32,
    /// Owner label used to find this controller's positions later.
    pub label: String,
    pub stop_loss: Option<Price>,
    pub take_profit: Option<Price>,
    pub comment: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trade_side_opposite() {
        assert_eq!(TradeSide::Buy.opposite(), TradeSide::Sell);
        assert_eq!(TradeSide::Sell.opposite(), TradeSide::Buy);
    }

    #[test]
    fn test_trade_side_sign() {
        assert_eq!(TradeSide::Buy.sign(), 1);
        assert_eq!(TradeSide::Sell.sign(), -1);
    }

    #[test]
    fn test_trade_side_serde_lowercase() {
        let json = serde_json::to_string(&TradeSide::Sell).unwrap();
        assert_eq!(json, "\"sell\"");
    }

    #[test]
    fn test_position_id_unique() {
        assert_ne!(PositionId::new(), PositionId::new());
    }

    #[test]
    fn test_position_id_format() {
        assert!(PositionId::new().as_str().starts_with("nt_"));
    }
}
