//! Pre-event entry trigger.
//!
//! Armed while the controller owns no position on its symbol, engaged once
//! it does. Double entry is prevented by the venue's own position list, not a
//! local flag: as soon as an order fills, the next update sees the position
//! and the trigger stays quiet.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, error, info};

use newstrader_core::{MarketSnapshot, PositionId, TradeSide, Volume};
use newstrader_position::{EventClock, OwnedPositions};
use newstrader_risk::{PositionSizer, StopTargetSpec};

use crate::error::ExecutorResult;
use crate::executor::OrderExecutor;
use crate::venue::TradingVenue;

/// Which directions to open when the trigger fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectionPolicy {
    /// One order, Buy or Sell with equal probability.
    Randomized,
    /// Sell then Buy, as two independent orders.
    Both,
    BuyOnly,
    SellOnly,
    /// Never opens anything.
    Disabled,
}

impl DirectionPolicy {
    /// Resolve the entry flags. Randomization overrides the direction flags.
    #[must_use]
    pub fn from_flags(enable_buy: bool, enable_sell: bool, randomize: bool) -> Self {
        match (randomize, enable_buy, enable_sell) {
            (true, _, _) => Self::Randomized,
            (false, true, true) => Self::Both,
            (false, true, false) => Self::BuyOnly,
            (false, false, true) => Self::SellOnly,
            (false, false, false) => Self::Disabled,
        }
    }
}

/// Result of one submission attempted by the trigger.
#[derive(Debug)]
pub struct EntryAttempt {
    pub side: TradeSide,
    pub volume: Volume,
    pub result: ExecutorResult<PositionId>,
}

impl EntryAttempt {
    #[must_use]
    pub fn is_filled(&self) -> bool {
        self.result.is_ok()
    }
}

/// Decides when and in which direction to enter.
#[derive(Debug)]
pub struct EntryTrigger {
    clock: EventClock,
    policy: DirectionPolicy,
    rng: StdRng,
}

impl EntryTrigger {
    pub fn new(clock: EventClock, policy: DirectionPolicy) -> Self {
        Self {
            clock,
            policy,
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic randomized direction, for replays and tests.
    pub fn with_seed(clock: EventClock, policy: DirectionPolicy, seed: u64) -> Self {
        Self {
            clock,
            policy,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    #[must_use]
    pub fn policy(&self) -> DirectionPolicy {
        self.policy
    }

    /// Armed and inside the pre-event window.
    #[must_use]
    pub fn should_fire(&self, owned: &OwnedPositions<'_>, now: DateTime<Utc>) -> bool {
        owned.is_empty() && self.clock.in_trigger_window(now)
    }

    /// Directions to open, in submission order.
    pub fn sides(&mut self) -> Vec<TradeSide> {
        match self.policy {
            DirectionPolicy::Randomized => {
                if self.rng.gen_bool(0.5) {
                    vec![TradeSide::Buy]
                } else {
                    vec![TradeSide::Sell]
                }
            }
            DirectionPolicy::Both => vec![TradeSide::Sell, TradeSide::Buy],
            DirectionPolicy::BuyOnly => vec![TradeSide::Buy],
            DirectionPolicy::SellOnly => vec![TradeSide::Sell],
            DirectionPolicy::Disabled => Vec::new(),
        }
    }

    /// Fire if armed and in the window.
    ///
    /// Each order is sized at submission time from the current account state.
    /// A rejected order is logged and not retried within this update; the
    /// next update retries only if no position was opened.
    pub fn on_update<V: TradingVenue>(
        &mut self,
        owned: &OwnedPositions<'_>,
        snapshot: &MarketSnapshot,
        stops: &StopTargetSpec,
        sizer: &PositionSizer,
        executor: &OrderExecutor<V>,
    ) -> Vec<EntryAttempt> {
        if !self.should_fire(owned, snapshot.time) {
            return Vec::new();
        }

        let sides = self.sides();
        if sides.is_empty() {
            debug!("Entry window open but no direction enabled");
            return Vec::new();
        }
        info!(
            time_to_event_secs = self.clock.time_to_event(snapshot.time).num_seconds(),
            policy = ?self.policy,
            "Entry window reached"
        );

        sides
            .into_iter()
            .map(|side| {
                let volume = sizer
                    .size(&snapshot.account, stops.stop_pips, snapshot.pip_value)
                    .volume;
                let result = executor.open(side, volume, stops, snapshot);
                if let Err(e) = &result {
                    error!(side = %side, volume = %volume, error = %e, "Order rejected");
                }
                EntryAttempt {
                    side,
                    volume,
                    result,
                }
            })
            .collect()
    }
}
