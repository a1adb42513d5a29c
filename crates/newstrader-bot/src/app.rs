//! Trade lifecycle controller.
//!
//! Two independent callbacks:
//! - [`Controller::on_market_update`]: all trading decisions, synchronously
//! - [`Controller::on_display_tick`]: countdown text only
//!
//! Per market update:
//!
//! 1. Trading gate closed at startup -> `Halted`
//! 2. Resolve the active stop/target distances (fixed or volatility)
//! 3. Rebuild this controller's positions from the venue
//! 4. None owned -> entry trigger; otherwise -> position manager
//!
//! Entry and management never both run in one update.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use newstrader_core::{Bar, MarketSnapshot};
use newstrader_executor::{EntryAttempt, EntryTrigger, ExecutorResult, OrderExecutor, TradingVenue};
use newstrader_position::{EventClock, OwnedPositions, PositionAction, PositionManager};
use newstrader_risk::{AverageTrueRange, PositionSizer, StopSource, StopTargetSpec};

use crate::config::AppConfig;
use crate::error::AppResult;

/// A management request and the venue's verdict.
#[derive(Debug)]
pub struct ManagedAction {
    pub action: PositionAction,
    pub result: ExecutorResult<()>,
}

/// What one market update did.
#[derive(Debug)]
pub enum UpdateOutcome {
    /// Trading disabled at startup.
    Halted,
    /// Nothing to do.
    Idle,
    /// The entry trigger fired.
    Entered(Vec<EntryAttempt>),
    /// Management requests were sent for owned positions.
    Managed(Vec<ManagedAction>),
}

impl UpdateOutcome {
    pub fn entries(&self) -> &[EntryAttempt] {
        match self {
            Self::Entered(attempts) => attempts,
            _ => &[],
        }
    }

    pub fn actions(&self) -> &[ManagedAction] {
        match self {
            Self::Managed(actions) => actions,
            _ => &[],
        }
    }
}

/// News-event trade lifecycle controller for one symbol.
pub struct Controller<V> {
    clock: EventClock,
    stop_source: StopSource,
    atr: Option<AverageTrueRange>,
    sizer: PositionSizer,
    entry: EntryTrigger,
    manager: PositionManager,
    executor: OrderExecutor<V>,
    show_timer: bool,
    can_trade: bool,
}

impl<V: TradingVenue> Controller<V> {
    /// Build the controller and evaluate the startup trading gate.
    pub fn new(config: &AppConfig, venue: V) -> AppResult<Self> {
        config.validate()?;

        let clock = EventClock::new(config.scheduled_event()?);
        let symbol = config.symbol.spec.clone();
        let risk_spec = config.risk_spec()?;
        let stop_source = config.stop_source()?;
        let atr = if stop_source.is_volatility() {
            Some(AverageTrueRange::new(config.volatility.period)?)
        } else {
            None
        };

        let policy = config.entry.direction_policy();
        let entry = match config.entry.seed {
            Some(seed) => EntryTrigger::with_seed(clock, policy, seed),
            None => EntryTrigger::new(clock, policy),
        };

        let min_lot = symbol.volume_to_lots(symbol.volume_min);
        let lot_step = symbol.volume_to_lots(symbol.volume_step);
        info!(symbol = %symbol.name, min_lot = %min_lot, lot_step = %lot_step, "Symbol volume limits");

        let can_trade = risk_spec.is_money_managed() || config.order.lots >= min_lot;
        if !can_trade {
            error!(
                lots = %config.order.lots,
                min_lot = %min_lot,
                "Volume is less than minimum lot, trading disabled"
            );
        }

        let manager = PositionManager::new(clock, config.management, symbol.clone());
        let executor = OrderExecutor::new(venue, symbol, config.order_tag());

        info!(
            label = %executor.tag().label,
            event_time = %clock.event().time(),
            policy = ?policy,
            stop_policy = ?config.management.stop_policy(),
            pre_adjust = config.management.pre_adjust,
            volatility = stop_source.is_volatility(),
            "Controller initialized"
        );

        Ok(Self {
            clock,
            stop_source,
            atr,
            sizer: PositionSizer::new(risk_spec),
            entry,
            manager,
            executor,
            show_timer: config.event.show_timer,
            can_trade,
        })
    }

    #[must_use]
    pub fn can_trade(&self) -> bool {
        self.can_trade
    }

    pub fn executor(&self) -> &OrderExecutor<V> {
        &self.executor
    }

    pub fn clock(&self) -> &EventClock {
        &self.clock
    }

    /// Feed a completed bar to the volatility estimator.
    pub fn on_bar(&mut self, bar: Bar) {
        if let Some(atr) = self.atr.as_mut() {
            atr.push(bar);
        }
    }

    /// Distances in effect for `snapshot`.
    ///
    /// A reading pushed with the snapshot wins over the bar-based estimate.
    pub fn active_stops(&self, snapshot: &MarketSnapshot) -> StopTargetSpec {
        let reading: Option<Decimal> = snapshot
            .volatility
            .or_else(|| self.atr.as_ref().and_then(AverageTrueRange::value));
        self.stop_source
            .resolve(reading, self.executor.symbol().pip_size)
    }

    /// Run all trading decisions for one market update.
    pub fn on_market_update(&mut self, snapshot: &MarketSnapshot) -> UpdateOutcome {
        if !self.can_trade {
            return UpdateOutcome::Halted;
        }
        if !snapshot.has_valid_quote() {
            warn!(bid = %snapshot.bid, ask = %snapshot.ask, "Ignoring update with invalid quote");
            return UpdateOutcome::Idle;
        }

        let stops = self.active_stops(snapshot);
        let positions = self.executor.positions();
        let tag = self.executor.tag();
        let owned = OwnedPositions::collect(&positions, &self.executor.symbol().name, &tag.label);

        if owned.is_empty() {
            let attempts =
                self.entry
                    .on_update(&owned, snapshot, &stops, &self.sizer, &self.executor);
            return if attempts.is_empty() {
                UpdateOutcome::Idle
            } else {
                UpdateOutcome::Entered(attempts)
            };
        }

        let actions = self.manager.evaluate_all(&owned, snapshot, &stops);
        if actions.is_empty() {
            return UpdateOutcome::Idle;
        }

        let managed = actions
            .into_iter()
            .map(|action| {
                let result = self.executor.apply(&action);
                match &result {
                    Ok(()) => debug!(position = %action.position_id(), "Request accepted"),
                    Err(e) => warn!(
                        position = %action.position_id(),
                        action = ?action,
                        error = %e,
                        "Request rejected, will re-evaluate next update"
                    ),
                }
                ManagedAction { action, result }
            })
            .collect();
        UpdateOutcome::Managed(managed)
    }

    /// Countdown text, when the timer is shown.
    #[must_use]
    pub fn on_display_tick(&self, now: DateTime<Utc>) -> Option<String> {
        self.show_timer.then(|| self.clock.display_text(now))
    }
}
