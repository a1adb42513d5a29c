//! Trading venue abstraction.
//!
//! The venue owns position state. The controller only reads it back through
//! [`TradingVenue::positions`] and sends requests; it never mirrors fills
//! locally. This allows for:
//! - Swapping the in-memory [`crate::PaperVenue`] for a broker adapter
//! - Injecting rejections in tests

use std::sync::Arc;

use newstrader_core::{MarketRangeOrder, PositionId, Price, TrackedPosition};

use crate::error::ExecutorResult;

/// Request sent to a venue, as recorded by [`crate::PaperVenue`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VenueRequest {
    Open(MarketRangeOrder),
    Modify {
        position: PositionId,
        stop_loss: Option<Price>,
        take_profit: Option<Price>,
    },
    Close {
        position: PositionId,
    },
}

/// Platform order API.
///
/// Every call returns immediately with the venue's verdict. A rejected
/// request leaves the venue's state unchanged.
pub trait TradingVenue: Send + Sync {
    /// Submit a market-range order and return the id of the opened position.
    fn submit_market_range_order(&self, order: &MarketRangeOrder) -> ExecutorResult<PositionId>;

    /// Replace a position's stop-loss and take-profit. `None` removes the level.
    fn modify_position(
        &self,
        position: &PositionId,
        stop_loss: Option<Price>,
        take_profit: Option<Price>,
    ) -> ExecutorResult<()>;

    /// Close a position at market.
    fn close_position(&self, position: &PositionId) -> ExecutorResult<()>;

    /// All open positions on the account, in opening order.
    fn positions(&self) -> Vec<TrackedPosition>;
}

impl<V: TradingVenue + ?Sized> TradingVenue for Arc<V> {
    fn submit_market_range_order(&self, order: &MarketRangeOrder) -> ExecutorResult<PositionId> {
        (**self).submit_market_range_order(order)
    }

    fn modify_position(
        &self,
        position: &PositionId,
        stop_loss: Option<Price>,
        take_profit: Option<Price>,
    ) -> ExecutorResult<()> {
        (**self).modify_position(position, stop_loss, take_profit)
    }

    fn close_position(&self, position: &PositionId) -> ExecutorResult<()> {
        (**self).close_position(position)
    }

    fn positions(&self) -> Vec<TrackedPosition> {
        (**self).positions()
    }
}
