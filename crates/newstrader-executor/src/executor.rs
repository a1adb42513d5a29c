//! Order submission.
//!
//! Converts pip distances into absolute, digit-rounded prices and forwards
//! requests to the venue. The executor keeps no state between calls.

use tracing::{debug, info};

use newstrader_core::{
    MarketRangeOrder, MarketSnapshot, PositionId, Price, SymbolSpec, TrackedPosition, TradeSide,
    Volume,
};
use newstrader_position::PositionAction;
use newstrader_risk::StopTargetSpec;

use crate::error::ExecutorResult;
use crate::venue::TradingVenue;

/// Order tagging shared by every request from one controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderTag {
    /// Owner label used to recognise this controller's positions.
    pub label: String,
    /// Free-text comment attached to each order.
    pub comment: String,
    /// Accepted slippage for market-range orders, in pips.
    pub slippage_pips: u32,
}

/// Thin wrapper over a [`TradingVenue`] for one symbol.
#[derive(Debug)]
pub struct OrderExecutor<V> {
    venue: V,
    symbol: SymbolSpec,
    tag: OrderTag,
}

impl<V: TradingVenue> OrderExecutor<V> {
    pub fn new(venue: V, symbol: SymbolSpec, tag: OrderTag) -> Self {
        Self { venue, symbol, tag }
    }

    pub fn venue(&self) -> &V {
        &self.venue
    }

    pub fn symbol(&self) -> &SymbolSpec {
        &self.symbol
    }

    pub fn tag(&self) -> &OrderTag {
        &self.tag
    }

    /// Current positions on the account, owned or not.
    pub fn positions(&self) -> Vec<TrackedPosition> {
        self.venue.positions()
    }

    /// Build the market-range order for `side` at the current quote.
    ///
    /// Buys are based on the ask, sells on the bid. A zero distance leaves
    /// that level unset.
    pub fn build_order(
        &self,
        side: TradeSide,
        volume: Volume,
        stops: &StopTargetSpec,
        snapshot: &MarketSnapshot,
    ) -> MarketRangeOrder {
        let base_price = snapshot.side_price(side);
        let stop_loss = stops
            .has_stop()
            .then(|| self.symbol.offset_price(base_price, side, -stops.stop_pips));
        let take_profit = stops
            .has_target()
            .then(|| self.symbol.offset_price(base_price, side, stops.target_pips));

        MarketRangeOrder {
            side,
            symbol: self.symbol.name.clone(),
            volume,
            base_price,
            slippage_pips: self.tag.slippage_pips,
            label: self.tag.label.clone(),
            stop_loss,
            take_profit,
            comment: self.tag.comment.clone(),
        }
    }

    /// Open a position with stop/target distances in pips.
    pub fn open(
        &self,
        side: TradeSide,
        volume: Volume,
        stops: &StopTargetSpec,
        snapshot: &MarketSnapshot,
    ) -> ExecutorResult<PositionId> {
        let order = self.build_order(side, volume, stops, snapshot);
        info!(
            side = %order.side,
            volume = %order.volume,
            base_price = %order.base_price,
            stop_loss = ?order.stop_loss.map(|p| p.inner()),
            take_profit = ?order.take_profit.map(|p| p.inner()),
            slippage_pips = order.slippage_pips,
            "Submitting market range order"
        );
        let id = self.venue.submit_market_range_order(&order)?;
        debug!(position = %id, "Order filled");
        Ok(id)
    }

    pub fn modify(
        &self,
        position: &PositionId,
        stop_loss: Option<Price>,
        take_profit: Option<Price>,
    ) -> ExecutorResult<()> {
        self.venue.modify_position(position, stop_loss, take_profit)
    }

    pub fn close(&self, position: &PositionId) -> ExecutorResult<()> {
        self.venue.close_position(position)
    }

    /// Send a management action to the venue.
    pub fn apply(&self, action: &PositionAction) -> ExecutorResult<()> {
        match action {
            PositionAction::Modify {
                position,
                stop_loss,
                take_profit,
                ..
            } => self.modify(position, *stop_loss, *take_profit),
            PositionAction::Close { position, .. } => self.close(position),
        }
    }
}
