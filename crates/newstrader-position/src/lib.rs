//! Event timing and position management.
//!
//! Everything here is evaluated synchronously on each market update and
//! derived fresh from the platform's position list; nothing is carried over
//! from the previous update.
//!
//! # Key Components
//!
//! - [`ScheduledEvent`]: Event timestamp, pre-event window and hold duration
//! - [`EventClock`]: Signed time distance to the event and countdown text
//! - [`HoldTimeout`]: Post-event holding limit
//! - [`OwnedPositions`]: This controller's positions among all on the account
//! - [`PositionManager`]: Pre-adjust / breakeven / trailing / timeout state machine
//! - [`PositionAction`]: Modify or close request proposed by the manager

pub mod clock;
pub mod error;
pub mod manager;
pub mod time_stop;
pub mod tracker;

pub use clock::{time_distance, EventClock, ScheduledEvent};
pub use error::{PositionError, PositionResult};
pub use manager::{
    CloseReason, ManagementMode, ModifyReason, PositionAction, PositionManager, PositionPhase,
    StopPolicy,
};
pub use time_stop::HoldTimeout;
pub use tracker::OwnedPositions;
