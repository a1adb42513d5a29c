//! Open-position management state machine.
//!
//! Each update, for every owned position:
//!
//! ```text
//! now < event   ── PreEvent ──> pre-adjust SL/TP to the market (if enabled)
//! now >= event  ── PostEvent ─> breakeven  (trailing off, breakeven on)
//!                               trailing   (trailing on)
//!                               timeout    (hold elapsed, always evaluated)
//! ```
//!
//! The manager only proposes [`PositionAction`]s. It never assumes a request
//! succeeded: the next update re-reads the platform's stop/target and
//! re-derives everything, so a rejected request is simply proposed again if the
//! condition still holds.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use newstrader_core::{MarketSnapshot, PositionId, Price, SymbolSpec, TrackedPosition, TradeSide};
use newstrader_risk::StopTargetSpec;

use crate::clock::EventClock;
use crate::time_stop::HoldTimeout;
use crate::tracker::OwnedPositions;

/// Management feature flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagementMode {
    pub breakeven: bool,
    pub trailing: bool,
    pub pre_adjust: bool,
}

/// Post-event stop handling derived from [`ManagementMode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopPolicy {
    /// Leave the stop where it is.
    Static,
    /// Move the stop to entry once profit reaches the stop distance.
    Breakeven,
    /// Ratchet the stop behind the market.
    Trailing,
}

impl ManagementMode {
    /// Trailing supersedes breakeven when both flags are set.
    #[must_use]
    pub fn stop_policy(&self) -> StopPolicy {
        if self.trailing {
            StopPolicy::Trailing
        } else if self.breakeven {
            StopPolicy::Breakeven
        } else {
            StopPolicy::Static
        }
    }
}

/// Lifecycle phase of a position relative to the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionPhase {
    PreEvent,
    PostEvent,
}

/// Why a modify request was proposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifyReason {
    PreAdjust,
    Breakeven,
    Trailing,
}

/// Why a close request was proposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    Timeout { elapsed: Duration },
}

/// Request the manager wants the executor to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PositionAction {
    Modify {
        position: PositionId,
        stop_loss: Option<Price>,
        take_profit: Option<Price>,
        reason: ModifyReason,
    },
    Close {
        position: PositionId,
        reason: CloseReason,
    },
}

impl PositionAction {
    #[must_use]
    pub fn position_id(&self) -> &PositionId {
        match self {
            Self::Modify { position, .. } | Self::Close { position, .. } => position,
        }
    }
}

/// Adjusts, promotes, trails or closes the controller's open positions.
#[derive(Debug, Clone)]
pub struct PositionManager {
    clock: EventClock,
    mode: ManagementMode,
    timeout: HoldTimeout,
    symbol: SymbolSpec,
}

impl PositionManager {
    #[must_use]
    pub fn new(clock: EventClock, mode: ManagementMode, symbol: SymbolSpec) -> Self {
        let timeout = HoldTimeout::new(clock.event().hold());
        Self {
            clock,
            mode,
            timeout,
            symbol,
        }
    }

    #[must_use]
    pub fn mode(&self) -> ManagementMode {
        self.mode
    }

    #[must_use]
    pub fn phase(&self, now: DateTime<Utc>) -> PositionPhase {
        if self.clock.is_before_event(now) {
            PositionPhase::PreEvent
        } else {
            PositionPhase::PostEvent
        }
    }

    /// Evaluate every owned position, in platform order.
    #[must_use]
    pub fn evaluate_all(
        &self,
        positions: &OwnedPositions<'_>,
        snapshot: &MarketSnapshot,
        stops: &StopTargetSpec,
    ) -> Vec<PositionAction> {
        positions
            .iter()
            .flat_map(|p| self.evaluate(p, snapshot, stops))
            .collect()
    }

    /// Evaluate one position.
    ///
    /// Post-event, a stop modification (if any) precedes the timeout close.
    #[must_use]
    pub fn evaluate(
        &self,
        position: &TrackedPosition,
        snapshot: &MarketSnapshot,
        stops: &StopTargetSpec,
    ) -> Vec<PositionAction> {
        let mut actions = Vec::new();

        match self.phase(snapshot.time) {
            PositionPhase::PreEvent => {
                if self.mode.pre_adjust {
                    actions.extend(self.pre_adjust(position, snapshot, stops));
                }
            }
            PositionPhase::PostEvent => {
                let stop_action = match self.mode.stop_policy() {
                    StopPolicy::Breakeven => self.breakeven(position, snapshot, stops),
                    StopPolicy::Trailing => self.trail(position, snapshot, stops),
                    StopPolicy::Static => None,
                };
                actions.extend(stop_action);

                let elapsed = self.clock.elapsed_since_event(snapshot.time);
                if let Some(elapsed) = self.timeout.check(elapsed) {
                    info!(
                        position = %position.id,
                        side = %position.side,
                        elapsed_secs = elapsed.num_seconds(),
                        "Closing trade by time out"
                    );
                    actions.push(PositionAction::Close {
                        position: position.id.clone(),
                        reason: CloseReason::Timeout { elapsed },
                    });
                }
            }
        }

        actions
    }

    /// Re-anchor SL/TP to the current market while waiting for the event.
    ///
    /// A zero distance leaves that level as the platform has it.
    fn pre_adjust(
        &self,
        position: &TrackedPosition,
        snapshot: &MarketSnapshot,
        stops: &StopTargetSpec,
    ) -> Option<PositionAction> {
        let price = snapshot.side_price(position.side);

        let new_sl = if stops.has_stop() {
            Some(self.symbol.offset_price(price, position.side, -stops.stop_pips))
        } else {
            position.stop_loss
        };
        let new_tp = if stops.has_target() {
            Some(self.symbol.offset_price(price, position.side, stops.target_pips))
        } else {
            position.take_profit
        };

        if new_sl == position.stop_loss && new_tp == position.take_profit {
            return None;
        }

        info!(
            position = %position.id,
            side = %position.side,
            stop_loss = ?new_sl.map(|p| p.inner()),
            take_profit = ?new_tp.map(|p| p.inner()),
            "Adjusting SL and TP"
        );
        Some(PositionAction::Modify {
            position: position.id.clone(),
            stop_loss: new_sl,
            take_profit: new_tp,
            reason: ModifyReason::PreAdjust,
        })
    }

    fn breakeven(
        &self,
        position: &TrackedPosition,
        snapshot: &MarketSnapshot,
        stops: &StopTargetSpec,
    ) -> Option<PositionAction> {
        if !stops.has_stop() {
            return None;
        }
        let distance = self.symbol.pips_to_price(stops.stop_pips);
        let price = snapshot.side_price(position.side);
        if position.favorable_move(price) < distance {
            return None;
        }

        let new_sl = self.symbol.round_price(position.entry_price.inner());
        if position.stop_loss == Some(new_sl) {
            return None;
        }

        info!(
            position = %position.id,
            side = %position.side,
            stop_loss = %new_sl,
            "Moving SL to breakeven"
        );
        Some(PositionAction::Modify {
            position: position.id.clone(),
            stop_loss: Some(new_sl),
            take_profit: position.take_profit,
            reason: ModifyReason::Breakeven,
        })
    }

    /// Ratchet the stop once the market is a full stop distance beyond it.
    ///
    /// Without a current stop there is nothing to trail from.
    fn trail(
        &self,
        position: &TrackedPosition,
        snapshot: &MarketSnapshot,
        stops: &StopTargetSpec,
    ) -> Option<PositionAction> {
        if !stops.has_stop() {
            return None;
        }
        let current = position.stop_loss?;
        let distance = self.symbol.pips_to_price(stops.stop_pips);
        let price = snapshot.side_price(position.side);

        let gap = match position.side {
            TradeSide::Buy => price.inner() - current.inner(),
            TradeSide::Sell => current.inner() - price.inner(),
        };
        if gap < distance {
            return None;
        }

        let new_sl = self.symbol.offset_price(price, position.side, -stops.stop_pips);
        let improves = match position.side {
            TradeSide::Buy => new_sl > current,
            TradeSide::Sell => new_sl < current,
        };
        if !improves {
            return None;
        }

        info!(
            position = %position.id,
            side = %position.side,
            stop_loss = %new_sl,
            "Moving trailing SL"
        );
        Some(PositionAction::Modify {
            position: position.id.clone(),
            stop_loss: Some(new_sl),
            take_profit: position.take_profit,
            reason: ModifyReason::Trailing,
        })
    }
}
