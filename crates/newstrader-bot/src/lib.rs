//! News-event trade lifecycle controller.
//!
//! Opens one or both directions shortly before a scheduled market event,
//! keeps the stop-loss/take-profit pair aligned with the market until the
//! event fires, then promotes or trails the stop and force-closes the trade
//! after the holding period.
//!
//! - [`Controller`]: the market-update and display-tick callbacks
//! - [`AppConfig`]: TOML configuration
//! - [`FeedRunner`]: JSON-lines replay against the paper venue

pub mod app;
pub mod config;
pub mod error;
pub mod feed;

pub use app::{Controller, ManagedAction, UpdateOutcome};
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use feed::{FeedLine, FeedRunner, FeedSummary};
