//! Post-event holding limit.
//!
//! The limit is declarative: it is re-checked against wall-clock time on every
//! update rather than scheduled once, so a missed update only delays the close
//! to the next one.

use chrono::Duration;

/// Checks elapsed post-event time against the configured hold duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoldTimeout {
    hold: Option<Duration>,
}

impl HoldTimeout {
    /// Create a checker; `None` disables the forced close.
    #[must_use]
    pub fn new(hold: Option<Duration>) -> Self {
        Self { hold }
    }

    /// Configured hold, if any.
    #[must_use]
    pub fn hold(&self) -> Option<Duration> {
        self.hold
    }

    /// Check the elapsed time since the event.
    ///
    /// # Returns
    /// * `Some(elapsed)` once `elapsed >= hold`
    /// * `None` while still inside the hold, before the event, or when disabled
    #[must_use]
    pub fn check(&self, elapsed_since_event: Duration) -> Option<Duration> {
        let hold = self.hold?;
        if elapsed_since_event < Duration::zero() {
            return None;
        }
        (elapsed_since_event >= hold).then_some(elapsed_since_event)
    }
}
