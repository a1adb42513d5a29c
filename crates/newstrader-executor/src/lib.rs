//! Order execution for the news trader.
//!
//! # Key Components
//!
//! - [`TradingVenue`]: Platform order API (submit / modify / close / list)
//! - [`OrderExecutor`]: Distance-to-price conversion and request forwarding
//! - [`EntryTrigger`]: Pre-event entry decision and direction policy
//! - [`PaperVenue`]: In-memory venue used by the feed runner and tests
//!
//! # Entry gate (in `EntryTrigger::on_update`)
//!
//! 1. Owned position exists -> engaged, no-op
//! 2. Outside `(0, window]` before the event -> no-op
//! 3. Direction policy yields no side -> no-op
//! 4. (all passed) -> size and submit each side in order

pub mod entry;
pub mod error;
pub mod executor;
pub mod paper;
pub mod venue;

pub use entry::{DirectionPolicy, EntryAttempt, EntryTrigger};
pub use error::{ExecutorError, ExecutorResult};
pub use executor::{OrderExecutor, OrderTag};
pub use paper::{ExitTrigger, PaperVenue};
pub use venue::{TradingVenue, VenueRequest};
