//! Read-only view of a platform-owned position.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{PositionId, Price, TradeSide, Volume};

/// An open position as reported by the platform.
///
/// The controller never mutates these; it proposes modify/close requests and
/// re-reads the platform's view on the next update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedPosition {
    pub id: PositionId,
    pub symbol: String,
    /// Owner label the position was opened with.
    pub label: String,
    pub side: TradeSide,
    pub volume: Volume,
    pub entry_price: Price,
    pub stop_loss: Option<Price>,
    pub take_profit: Option<Price>,
    pub opened_at: DateTime<Utc>,
}

impl TrackedPosition {
    /// Whether this position belongs to the controller running `label` on `symbol`.
    #[must_use]
    pub fn is_owned_by(&self, symbol: &str, label: &str) -> bool {
        self.symbol == symbol && self.label == label
    }

    /// Distance the market has moved in the position's favor.
    ///
    /// `price` is the side price (ask for longs, bid for shorts).
    #[must_use]
    pub fn favorable_move(&self, price: Price) -> Decimal {
        match self.side {
            TradeSide::Buy => price.inner() - self.entry_price.inner(),
            TradeSide::Sell => self.entry_price.inner() - price.inner(),
        }
    }
}
