//! JSON-lines market feed runner.
//!
//! Each input line is one market update:
//!
//! ```json
//! {"time":"2022-04-25T23:59:52Z","bid":"1.10000","ask":"1.10020",
//!  "balance":"10000","bar":{"high":"1.1010","low":"1.0990","close":"1.1000"}}
//! ```
//!
//! `pip_value`, `balance`, `equity`, `volatility` and `bar` are optional.
//! Account fields carry over from the previous line; a missing pip value
//! defaults to the symbol's pip size (quote-currency account).
//!
//! Per line the runner marks the paper venue to market (stop/target fills),
//! feeds the completed bar, then calls [`Controller::on_market_update`].
//! A 100 ms interval drives [`Controller::on_display_tick`] in between.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, warn};

use newstrader_core::{AccountSnapshot, Bar, MarketSnapshot, Price};
use newstrader_executor::{PaperVenue, TradingVenue};

use crate::app::{Controller, UpdateOutcome};
use crate::config::AppConfig;
use crate::error::AppResult;

const DISPLAY_INTERVAL: Duration = Duration::from_millis(100);

/// One market update as read from the feed.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedLine {
    pub time: DateTime<Utc>,
    pub bid: Price,
    pub ask: Price,
    #[serde(default)]
    pub pip_value: Option<Decimal>,
    #[serde(default)]
    pub balance: Option<Decimal>,
    #[serde(default)]
    pub equity: Option<Decimal>,
    #[serde(default)]
    pub volatility: Option<Decimal>,
    /// Bar completed at this update.
    #[serde(default)]
    pub bar: Option<Bar>,
}

/// Totals for a finished replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedSummary {
    pub updates: usize,
    pub skipped: usize,
    pub orders_filled: usize,
    pub orders_rejected: usize,
    pub requests_sent: usize,
    pub venue_exits: usize,
}

/// Replays a JSON-lines feed against a [`PaperVenue`].
pub struct FeedRunner {
    controller: Controller<Arc<PaperVenue>>,
    venue: Arc<PaperVenue>,
    pip_size: Decimal,
    account: AccountSnapshot,
    last_time: Option<DateTime<Utc>>,
    last_display: Option<String>,
    summary: FeedSummary,
}

impl FeedRunner {
    pub fn new(config: &AppConfig) -> AppResult<Self> {
        let venue = Arc::new(PaperVenue::new());
        let controller = Controller::new(config, Arc::clone(&venue))?;
        let balance = config.account.balance;
        Ok(Self {
            controller,
            venue,
            pip_size: config.symbol.spec.pip_size,
            account: AccountSnapshot::new(balance, config.account.equity.unwrap_or(balance)),
            last_time: None,
            last_display: None,
            summary: FeedSummary::default(),
        })
    }

    pub fn venue(&self) -> &Arc<PaperVenue> {
        &self.venue
    }

    pub fn controller(&self) -> &Controller<Arc<PaperVenue>> {
        &self.controller
    }

    /// Parse one line into a snapshot, carrying account state forward.
    pub fn snapshot(&mut self, line: &FeedLine) -> MarketSnapshot {
        if let Some(balance) = line.balance {
            self.account.balance = balance;
        }
        if let Some(equity) = line.equity {
            self.account.equity = equity;
        }
        MarketSnapshot {
            time: line.time,
            bid: line.bid,
            ask: line.ask,
            pip_value: line.pip_value.unwrap_or(self.pip_size),
            account: self.account,
            volatility: line.volatility,
        }
    }

    /// Apply one parsed update.
    pub fn process(&mut self, line: &FeedLine) -> UpdateOutcome {
        let snapshot = self.snapshot(line);
        self.last_time = Some(snapshot.time);

        self.summary.venue_exits += self.venue.mark_to_market(&snapshot).len();
        if let Some(bar) = line.bar {
            self.controller.on_bar(bar);
        }

        let outcome = self.controller.on_market_update(&snapshot);
        self.summary.updates += 1;
        for attempt in outcome.entries() {
            if attempt.is_filled() {
                self.summary.orders_filled += 1;
            } else {
                self.summary.orders_rejected += 1;
            }
        }
        self.summary.requests_sent += outcome.actions().len();
        outcome
    }

    fn process_raw(&mut self, number: usize, raw: &str) {
        let raw = raw.trim();
        if raw.is_empty() {
            return;
        }
        match serde_json::from_str::<FeedLine>(raw) {
            Ok(line) => {
                self.process(&line);
            }
            Err(e) => {
                warn!(line = number, error = %e, "Skipping malformed feed line");
                self.summary.skipped += 1;
            }
        }
    }

    /// Countdown at the latest feed time; logged only when it changes.
    fn display_tick(&mut self) {
        let Some(now) = self.last_time else {
            return;
        };
        let Some(text) = self.controller.on_display_tick(now) else {
            return;
        };
        if self.last_display.as_deref() != Some(text.as_str()) {
            info!(target: "newstrader::display", "{text}");
            self.last_display = Some(text);
        }
    }

    /// Consume the feed until EOF.
    pub async fn run<R>(mut self, reader: R) -> AppResult<FeedSummary>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = reader.lines();
        let mut ticker = tokio::time::interval(DISPLAY_INTERVAL);
        let mut number = 0usize;

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    match line? {
                        Some(raw) => {
                            number += 1;
                            self.process_raw(number, &raw);
                        }
                        None => break,
                    }
                }
                _ = ticker.tick() => self.display_tick(),
            }
        }

        self.display_tick();
        debug!(lines = number, "Feed exhausted");
        info!(
            updates = self.summary.updates,
            skipped = self.summary.skipped,
            orders_filled = self.summary.orders_filled,
            orders_rejected = self.summary.orders_rejected,
            requests_sent = self.summary.requests_sent,
            venue_exits = self.summary.venue_exits,
            open_positions = self.venue.positions().len(),
            "Replay finished"
        );
        Ok(self.summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tokio::io::BufReader;

    fn feed(lines: &[&str]) -> BufReader<tokio_test::io::Mock> {
        let mut builder = tokio_test::io::Builder::new();
        for line in lines {
            builder.read(format!("{line}\n").as_bytes());
        }
        BufReader::new(builder.build())
    }

    #[tokio::test]
    async fn test_replay_enters_once_and_times_out() {
        let config = AppConfig::from_toml("[event]\nclose_after_seconds = 60\n").unwrap();
        let runner = FeedRunner::new(&config).unwrap();
        let venue = Arc::clone(runner.venue());

        let summary = runner
            .run(feed(&[
                r#"{"time":"2022-04-25T23:59:45Z","bid":"1.10000","ask":"1.10020"}"#,
                r#"{"time":"2022-04-25T23:59:52Z","bid":"1.10000","ask":"1.10020"}"#,
                r#"{"time":"2022-04-25T23:59:53Z","bid":"1.10000","ask":"1.10020"}"#,
                "",
                "not json",
                r#"{"time":"2022-04-26T00:01:00Z","bid":"1.10010","ask":"1.10030"}"#,
            ]))
            .await
            .unwrap();

        assert_eq!(summary.updates, 4);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.orders_filled, 2);
        assert_eq!(summary.orders_rejected, 0);
        assert_eq!(summary.requests_sent, 2);
        assert!(venue.positions().is_empty());
    }

    #[tokio::test]
    async fn test_replay_venue_stop_out() {
        let config = AppConfig::from_toml("[entry]\nenable_sell = false\n").unwrap();
        let runner = FeedRunner::new(&config).unwrap();
        let venue = Arc::clone(runner.venue());

        let summary = runner
            .run(feed(&[
                r#"{"time":"2022-04-25T23:59:55Z","bid":"1.10000","ask":"1.10020"}"#,
                r#"{"time":"2022-04-26T00:00:01Z","bid":"1.09860","ask":"1.09880"}"#,
            ]))
            .await
            .unwrap();

        assert_eq!(summary.orders_filled, 1);
        assert_eq!(summary.venue_exits, 1);
        assert!(venue.positions().is_empty());
    }

    #[test]
    fn test_account_carries_forward() {
        let config = AppConfig::default();
        let mut runner = FeedRunner::new(&config).unwrap();

        let first: FeedLine = serde_json::from_str(
            r#"{"time":"2022-04-25T22:00:00Z","bid":"1.1","ask":"1.1002","balance":"5000","equity":"4900"}"#,
        )
        .unwrap();
        let snap = runner.snapshot(&first);
        assert_eq!(snap.account, AccountSnapshot::new(dec!(5000), dec!(4900)));
        assert_eq!(snap.pip_value, dec!(0.0001));

        let second: FeedLine = serde_json::from_str(
            r#"{"time":"2022-04-25T22:00:01Z","bid":"1.1","ask":"1.1002","pip_value":"0.00009"}"#,
        )
        .unwrap();
        let snap = runner.snapshot(&second);
        assert_eq!(snap.account, AccountSnapshot::new(dec!(5000), dec!(4900)));
        assert_eq!(snap.pip_value, dec!(0.00009));
    }
}
