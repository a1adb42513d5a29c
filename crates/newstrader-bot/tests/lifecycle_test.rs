//! Trade lifecycle integration tests.
//!
//! Drives the controller through full event lifecycles against the paper venue:
//! - Entry timing and direction order
//! - Pre-event SL/TP adjustment
//! - Breakeven, trailing and timeout after the event
//! - Venue rejections and re-evaluation

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use newstrader_bot::{AppConfig, Controller, UpdateOutcome};
use newstrader_core::{
    AccountSnapshot, MarketSnapshot, PositionId, Price, TrackedPosition, TradeSide, Volume,
};
use newstrader_executor::{PaperVenue, TradingVenue, VenueRequest};
use newstrader_position::{CloseReason, ModifyReason, PositionAction};

fn event_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2022, 4, 26, 0, 0, 0).unwrap()
}

fn at(offset_secs: i64) -> DateTime<Utc> {
    event_time() + Duration::seconds(offset_secs)
}

fn quote(time: DateTime<Utc>, bid: Decimal, ask: Decimal) -> MarketSnapshot {
    MarketSnapshot {
        time,
        bid: Price::new(bid),
        ask: Price::new(ask),
        pip_value: dec!(0.0001),
        account: AccountSnapshot::new(dec!(10000), dec!(10000)),
        volatility: None,
    }
}

fn controller(toml: &str) -> (Controller<Arc<PaperVenue>>, Arc<PaperVenue>) {
    let config = AppConfig::from_toml(toml).unwrap();
    let venue = Arc::new(PaperVenue::new());
    let controller = Controller::new(&config, Arc::clone(&venue)).unwrap();
    (controller, venue)
}

fn opened_sides(venue: &PaperVenue) -> Vec<TradeSide> {
    venue
        .requests()
        .iter()
        .filter_map(|r| match r {
            VenueRequest::Open(order) => Some(order.side),
            _ => None,
        })
        .collect()
}

fn modifies(venue: &PaperVenue) -> Vec<Option<Price>> {
    venue
        .requests()
        .iter()
        .filter_map(|r| match r {
            VenueRequest::Modify { stop_loss, .. } => Some(*stop_loss),
            _ => None,
        })
        .collect()
}

/// Event at 00:00:00 with a 10 s window: 23:59:45 is too early, 23:59:52 fires.
#[test]
fn test_entry_window_example() {
    let (mut ctl, venue) = controller("");

    let outcome = ctl.on_market_update(&quote(at(-15), dec!(1.10000), dec!(1.10020)));
    assert!(matches!(outcome, UpdateOutcome::Idle));
    assert!(venue.requests().is_empty());

    let outcome = ctl.on_market_update(&quote(at(-8), dec!(1.10000), dec!(1.10020)));
    assert_eq!(outcome.entries().len(), 2);
    assert_eq!(opened_sides(&venue), vec![TradeSide::Sell, TradeSide::Buy]);
}

#[test]
fn test_entry_fires_once_per_event() {
    let (mut ctl, venue) = controller("");

    for s in (1..=10).rev() {
        ctl.on_market_update(&quote(at(-s), dec!(1.10000), dec!(1.10020)));
    }
    assert_eq!(opened_sides(&venue).len(), 2);
    assert_eq!(venue.positions().len(), 2);
}

#[test]
fn test_orders_carry_label_and_levels() {
    let (mut ctl, venue) = controller("[entry]\nenable_sell = false\n");
    ctl.on_market_update(&quote(at(-5), dec!(1.10000), dec!(1.10020)));

    let positions = venue.positions();
    assert_eq!(positions.len(), 1);
    let p = &positions[0];
    assert_eq!(p.label, "NewsTrader EURUSD m1");
    assert_eq!(p.entry_price, Price::new(dec!(1.10020)));
    assert_eq!(p.stop_loss, Some(Price::new(dec!(1.09870))));
    assert_eq!(p.take_profit, Some(Price::new(dec!(1.10770))));
    // 1% of 10000 over 15 pips at 0.0001 per unit -> 66667 -> 66000
    assert_eq!(p.volume, Volume::new(dec!(66000)));
}

/// Risk money 100, stop 15 pips, pip value 1: 100 / 15 = 6.67 -> 7 units.
#[test]
fn test_sizing_example() {
    let toml = r#"
[entry]
enable_sell = false

[money_management]
use_money = true
money_risk = 100

[symbol]
name = "XYZ"
pip_size = "0.0001"
digits = 5
lot_size = "1"
volume_min = "1"
volume_max = "1000"
volume_step = "1"
"#;
    let (mut ctl, venue) = controller(toml);
    let mut snap = quote(at(-5), dec!(1.10000), dec!(1.10020));
    snap.pip_value = Decimal::ONE;
    ctl.on_market_update(&snap);

    assert_eq!(venue.positions()[0].volume, Volume::new(dec!(7)));
}

#[test]
fn test_pre_adjust_follows_market_until_event() {
    let (mut ctl, venue) = controller(
        "[entry]\nenable_sell = false\n[management]\npre_adjust = true\n",
    );
    ctl.on_market_update(&quote(at(-5), dec!(1.10000), dec!(1.10020)));
    venue.clear_requests();

    // Same quote: nothing changes
    let outcome = ctl.on_market_update(&quote(at(-4), dec!(1.10000), dec!(1.10020)));
    assert!(matches!(outcome, UpdateOutcome::Idle));

    // Ask moves up 5 pips: both levels follow
    let outcome = ctl.on_market_update(&quote(at(-3), dec!(1.10050), dec!(1.10070)));
    assert_eq!(outcome.actions().len(), 1);
    let p = &venue.positions()[0];
    assert_eq!(p.stop_loss, Some(Price::new(dec!(1.09920))));
    assert_eq!(p.take_profit, Some(Price::new(dec!(1.10820))));

    // After the event the levels stay put
    let outcome = ctl.on_market_update(&quote(at(1), dec!(1.10300), dec!(1.10320)));
    assert!(matches!(outcome, UpdateOutcome::Idle));
    assert_eq!(modifies(&venue).len(), 1);
}

#[test]
fn test_breakeven_modifies_once() {
    let (mut ctl, venue) = controller(
        "[entry]\nenable_sell = false\n[management]\nbreakeven = true\n",
    );
    ctl.on_market_update(&quote(at(-5), dec!(1.10000), dec!(1.10020)));
    venue.clear_requests();

    // 14 pips in profit: not yet
    ctl.on_market_update(&quote(at(1), dec!(1.10140), dec!(1.10160)));
    assert!(modifies(&venue).is_empty());

    // 15 pips in profit: stop moves to entry
    ctl.on_market_update(&quote(at(2), dec!(1.10150), dec!(1.10170)));
    assert_eq!(modifies(&venue), vec![Some(Price::new(dec!(1.10020)))]);

    for s in 3..10 {
        ctl.on_market_update(&quote(at(s), dec!(1.10300), dec!(1.10320)));
    }
    assert_eq!(modifies(&venue).len(), 1);
}

#[test]
fn test_trailing_stop_is_monotone() {
    let (mut ctl, venue) = controller(
        "[event]\nclose_after_seconds = 0\n[entry]\nenable_buy = false\n[management]\ntrailing = true\nbreakeven = true\n",
    );
    ctl.on_market_update(&quote(at(-5), dec!(1.10000), dec!(1.10020)));
    let start = venue.positions()[0].stop_loss.unwrap();
    assert_eq!(start, Price::new(dec!(1.10150)));

    let bids = [
        dec!(1.09980),
        dec!(1.09900),
        dec!(1.09950),
        dec!(1.10050),
        dec!(1.09700),
        dec!(1.09720),
        dec!(1.09500),
    ];
    let mut last = start;
    for (i, bid) in bids.into_iter().enumerate() {
        ctl.on_market_update(&quote(at(i as i64 + 1), bid, bid + dec!(0.0002)));
        let positions = venue.positions();
        let Some(p) = positions.first() else {
            panic!("position stopped out unexpectedly at step {i}");
        };
        let stop = p.stop_loss.unwrap();
        assert!(stop <= last, "short stop rose from {last} to {stop}");
        last = stop;
    }
    assert_eq!(last, Price::new(dec!(1.09650)));
}

#[test]
fn test_timeout_closes_on_next_update_after_hold() {
    let (mut ctl, venue) = controller("[event]\nclose_after_seconds = 30\n");
    ctl.on_market_update(&quote(at(-5), dec!(1.10000), dec!(1.10020)));
    assert_eq!(venue.positions().len(), 2);

    ctl.on_market_update(&quote(at(29), dec!(1.10000), dec!(1.10020)));
    assert_eq!(venue.positions().len(), 2);

    let outcome = ctl.on_market_update(&quote(at(31), dec!(1.10000), dec!(1.10020)));
    assert_eq!(outcome.actions().len(), 2);
    assert!(outcome.actions().iter().all(|a| matches!(
        a.action,
        PositionAction::Close {
            reason: CloseReason::Timeout { .. },
            ..
        }
    )));
    assert!(venue.positions().is_empty());

    // Past the window: no re-entry
    let outcome = ctl.on_market_update(&quote(at(32), dec!(1.10000), dec!(1.10020)));
    assert!(matches!(outcome, UpdateOutcome::Idle));
}

#[test]
fn test_rejected_entry_retried_next_update() {
    let (mut ctl, venue) = controller("[entry]\nenable_sell = false\n");

    venue.reject_next("off quotes");
    let outcome = ctl.on_market_update(&quote(at(-8), dec!(1.10000), dec!(1.10020)));
    assert_eq!(outcome.entries().len(), 1);
    assert!(!outcome.entries()[0].is_filled());
    assert!(venue.positions().is_empty());

    let outcome = ctl.on_market_update(&quote(at(-7), dec!(1.10000), dec!(1.10020)));
    assert!(outcome.entries()[0].is_filled());
    assert_eq!(venue.positions().len(), 1);
}

#[test]
fn test_rejected_modify_reproposed() {
    let (mut ctl, venue) = controller(
        "[entry]\nenable_sell = false\n[management]\nbreakeven = true\n",
    );
    ctl.on_market_update(&quote(at(-5), dec!(1.10000), dec!(1.10020)));

    venue.reject_next("trade context busy");
    let outcome = ctl.on_market_update(&quote(at(1), dec!(1.10200), dec!(1.10220)));
    assert_eq!(outcome.actions().len(), 1);
    assert!(outcome.actions()[0].result.is_err());
    assert_eq!(
        venue.positions()[0].stop_loss,
        Some(Price::new(dec!(1.09870)))
    );

    let outcome = ctl.on_market_update(&quote(at(2), dec!(1.10200), dec!(1.10220)));
    assert!(matches!(
        outcome.actions()[0].action,
        PositionAction::Modify {
            reason: ModifyReason::Breakeven,
            ..
        }
    ));
    assert!(outcome.actions()[0].result.is_ok());
    assert_eq!(
        venue.positions()[0].stop_loss,
        Some(Price::new(dec!(1.10020)))
    );
}

#[test]
fn test_foreign_positions_left_alone() {
    let (mut ctl, venue) = controller("[event]\nclose_after_seconds = 10\n");
    venue.insert_position(TrackedPosition {
        id: PositionId::from_string("manual-1".to_string()),
        symbol: "EURUSD".to_string(),
        label: "manual".to_string(),
        side: TradeSide::Buy,
        volume: Volume::new(dec!(1000)),
        entry_price: Price::new(dec!(1.09000)),
        stop_loss: None,
        take_profit: None,
        opened_at: at(-3600),
    });

    ctl.on_market_update(&quote(at(-5), dec!(1.10000), dec!(1.10020)));
    ctl.on_market_update(&quote(at(20), dec!(1.10000), dec!(1.10020)));

    let remaining = venue.positions();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id.as_str(), "manual-1");
}

#[test]
fn test_stopped_out_position_rearms_trigger() {
    let (mut ctl, venue) = controller("[entry]\nenable_sell = false\n");
    ctl.on_market_update(&quote(at(-9), dec!(1.10000), dec!(1.10020)));
    let id = venue.positions()[0].id.clone();

    // Platform closes it (e.g. stop hit); the next update sees no owned position.
    venue.close_position(&id).unwrap();
    let outcome = ctl.on_market_update(&quote(at(-2), dec!(1.10000), dec!(1.10020)));
    assert_eq!(outcome.entries().len(), 1);
    assert_eq!(opened_sides(&venue), vec![TradeSide::Buy, TradeSide::Buy]);
}
