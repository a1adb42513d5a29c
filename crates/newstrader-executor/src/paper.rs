//! In-memory venue.
//!
//! Fills market-range orders at their base price, applies modify/close
//! requests immediately, and closes positions whose stop or target is crossed
//! when [`PaperVenue::mark_to_market`] is fed a quote. Long positions are
//! marked at the bid, short positions at the ask.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{info, warn};

use newstrader_core::{MarketRangeOrder, MarketSnapshot, PositionId, Price, TrackedPosition, TradeSide};

use crate::error::{ExecutorError, ExecutorResult};
use crate::venue::{TradingVenue, VenueRequest};

/// Why the venue itself closed a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitTrigger {
    StopLoss,
    TakeProfit,
}

/// Paper trading venue for the feed runner and tests.
#[derive(Debug)]
pub struct PaperVenue {
    positions: Mutex<Vec<TrackedPosition>>,
    /// Every request received, including rejected ones.
    requests: Mutex<Vec<VenueRequest>>,
    reject_next: Mutex<Option<String>>,
    now: Mutex<DateTime<Utc>>,
}

impl Default for PaperVenue {
    fn default() -> Self {
        Self::new()
    }
}

impl PaperVenue {
    pub fn new() -> Self {
        Self {
            positions: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
            reject_next: Mutex::new(None),
            now: Mutex::new(Utc::now()),
        }
    }

    /// Make the next request fail with `reason`.
    pub fn reject_next(&self, reason: impl Into<String>) {
        *self.reject_next.lock() = Some(reason.into());
    }

    /// Recorded requests.
    pub fn requests(&self) -> Vec<VenueRequest> {
        self.requests.lock().clone()
    }

    pub fn clear_requests(&self) {
        self.requests.lock().clear();
    }

    /// Put a position on the account directly, e.g. one opened by hand.
    pub fn insert_position(&self, position: TrackedPosition) {
        self.positions.lock().push(position);
    }

    /// Advance the venue clock and close anything whose stop or target the
    /// quote has crossed.
    pub fn mark_to_market(&self, snapshot: &MarketSnapshot) -> Vec<(TrackedPosition, ExitTrigger)> {
        *self.now.lock() = snapshot.time;

        let mut exits = Vec::new();
        self.positions.lock().retain(|p| {
            let Some(trigger) = Self::exit_trigger(p, snapshot) else {
                return true;
            };
            info!(
                position = %p.id,
                side = %p.side,
                trigger = ?trigger,
                "Position closed by venue"
            );
            exits.push((p.clone(), trigger));
            false
        });
        exits
    }

    fn exit_trigger(position: &TrackedPosition, snapshot: &MarketSnapshot) -> Option<ExitTrigger> {
        let mark = snapshot.side_price(position.side.opposite());
        let stop_hit = position.stop_loss.is_some_and(|sl| match position.side {
            TradeSide::Buy => mark <= sl,
            TradeSide::Sell => mark >= sl,
        });
        if stop_hit {
            return Some(ExitTrigger::StopLoss);
        }
        let target_hit = position.take_profit.is_some_and(|tp| match position.side {
            TradeSide::Buy => mark >= tp,
            TradeSide::Sell => mark <= tp,
        });
        target_hit.then_some(ExitTrigger::TakeProfit)
    }

    fn record(&self, request: VenueRequest) -> ExecutorResult<()> {
        self.requests.lock().push(request);
        match self.reject_next.lock().take() {
            Some(reason) => {
                warn!(reason = %reason, "Paper venue rejecting request");
                Err(ExecutorError::Rejected(reason))
            }
            None => Ok(()),
        }
    }
}

impl TradingVenue for PaperVenue {
    fn submit_market_range_order(&self, order: &MarketRangeOrder) -> ExecutorResult<PositionId> {
        self.record(VenueRequest::Open(order.clone()))?;
        if !order.volume.is_positive() {
            return Err(ExecutorError::Rejected(format!(
                "volume must be positive, got {}",
                order.volume
            )));
        }

        let id = PositionId::new();
        self.positions.lock().push(TrackedPosition {
            id: id.clone(),
            symbol: order.symbol.clone(),
            label: order.label.clone(),
            side: order.side,
            volume: order.volume,
            entry_price: order.base_price,
            stop_loss: order.stop_loss,
            take_profit: order.take_profit,
            opened_at: *self.now.lock(),
        });
        Ok(id)
    }

    fn modify_position(
        &self,
        position: &PositionId,
        stop_loss: Option<Price>,
        take_profit: Option<Price>,
    ) -> ExecutorResult<()> {
        self.record(VenueRequest::Modify {
            position: position.clone(),
            stop_loss,
            take_profit,
        })?;
        let mut positions = self.positions.lock();
        let target = positions
            .iter_mut()
            .find(|p| &p.id == position)
            .ok_or_else(|| ExecutorError::PositionNotFound(position.clone()))?;
        target.stop_loss = stop_loss;
        target.take_profit = take_profit;
        Ok(())
    }

    fn close_position(&self, position: &PositionId) -> ExecutorResult<()> {
        self.record(VenueRequest::Close {
            position: position.clone(),
        })?;
        let mut positions = self.positions.lock();
        let before = positions.len();
        positions.retain(|p| &p.id != position);
        if positions.len() == before {
            return Err(ExecutorError::PositionNotFound(position.clone()));
        }
        Ok(())
    }

    fn positions(&self) -> Vec<TrackedPosition> {
        self.positions.lock().clone()
    }
}
