//! Scheduled event timing.
//!
//! `time_to_event(now) = event_time - now`: positive while the event is still
//! ahead, zero or negative once it has fired.

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::error::{PositionError, PositionResult};

/// Whole seconds as a `Duration`, rejecting values chrono cannot represent.
fn seconds_duration(what: &str, seconds: u64) -> PositionResult<Duration> {
    i64::try_from(seconds)
        .ok()
        .and_then(Duration::try_seconds)
        .ok_or_else(|| {
            PositionError::InvalidSchedule(format!("{what} of {seconds}s is out of range"))
        })
}

/// The market event the trade is positioned around. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledEvent {
    time: DateTime<Utc>,
    trigger_window: Duration,
    hold: Duration,
}

impl ScheduledEvent {
    /// Create an event.
    ///
    /// # Arguments
    /// * `time` - Event timestamp (UTC)
    /// * `trigger_window` - How long before the event entries may fire
    /// * `hold` - Post-event holding limit; zero disables the forced close
    pub fn new(
        time: DateTime<Utc>,
        trigger_window: Duration,
        hold: Duration,
    ) -> PositionResult<Self> {
        if trigger_window <= Duration::zero() {
            return Err(PositionError::InvalidSchedule(format!(
                "trigger window must be positive, got {}s",
                trigger_window.num_seconds()
            )));
        }
        if hold < Duration::zero() {
            return Err(PositionError::InvalidSchedule(format!(
                "hold duration must be non-negative, got {}s",
                hold.num_seconds()
            )));
        }
        Ok(Self {
            time,
            trigger_window,
            hold,
        })
    }

    /// Build from calendar components, minute resolution.
    pub fn from_components(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        seconds_before: u64,
        close_after_seconds: u64,
    ) -> PositionResult<Self> {
        let time = Utc
            .with_ymd_and_hms(year, month, day, hour, minute, 0)
            .single()
            .ok_or_else(|| {
                PositionError::InvalidSchedule(format!(
                    "{year:04}-{month:02}-{day:02} {hour:02}:{minute:02} is not a valid UTC time"
                ))
            })?;
        Self::new(
            time,
            seconds_duration("trigger window", seconds_before)?,
            seconds_duration("hold duration", close_after_seconds)?,
        )
    }

    #[must_use]
    pub fn time(&self) -> DateTime<Utc> {
        self.time
    }

    #[must_use]
    pub fn trigger_window(&self) -> Duration {
        self.trigger_window
    }

    /// Post-event holding limit, `None` when forced close is disabled.
    #[must_use]
    pub fn hold(&self) -> Option<Duration> {
        (self.hold > Duration::zero()).then_some(self.hold)
    }
}

/// Time arithmetic relative to a [`ScheduledEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventClock {
    event: ScheduledEvent,
}

impl EventClock {
    #[must_use]
    pub fn new(event: ScheduledEvent) -> Self {
        Self { event }
    }

    #[must_use]
    pub fn event(&self) -> &ScheduledEvent {
        &self.event
    }

    /// Signed time until the event. Positive means the event is in the future.
    #[must_use]
    pub fn time_to_event(&self, now: DateTime<Utc>) -> Duration {
        self.event.time - now
    }

    /// Signed time since the event. Negative before the event.
    #[must_use]
    pub fn elapsed_since_event(&self, now: DateTime<Utc>) -> Duration {
        now - self.event.time
    }

    /// Strictly before the event.
    #[must_use]
    pub fn is_before_event(&self, now: DateTime<Utc>) -> bool {
        now < self.event.time
    }

    /// Inside `(0, trigger_window]` before the event.
    #[must_use]
    pub fn in_trigger_window(&self, now: DateTime<Utc>) -> bool {
        let remaining = self.time_to_event(now);
        remaining > Duration::zero() && remaining <= self.event.trigger_window
    }

    /// Countdown text for the display refresh.
    #[must_use]
    pub fn display_text(&self, now: DateTime<Utc>) -> String {
        let since = self.elapsed_since_event(now);
        if since <= Duration::zero() {
            format!("Time to news:{}", time_distance(-since))
        } else {
            format!("Time after news:{}", time_distance(since))
        }
    }
}

/// Render a duration as days, hours, minutes and seconds.
///
/// Zero components are omitted and units are pluralized; each component is
/// prefixed with a space. Anything under one second renders as `" 0 seconds"`.
#[must_use]
pub fn time_distance(d: Duration) -> String {
    let total = d.num_seconds().abs();
    if total < 1 {
        return " 0 seconds".to_string();
    }

    let parts = [
        (total / 86_400, "day"),
        ((total % 86_400) / 3_600, "hour"),
        ((total % 3_600) / 60, "minute"),
        (total % 60, "second"),
    ];

    let mut s = String::new();
    for (value, unit) in parts {
        if value > 0 {
            s.push_str(&format!(" {value} {unit}"));
        }
        if value > 1 {
            s.push('s');
        }
    }
    s
}
