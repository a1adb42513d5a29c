//! Stop/target computation and position sizing.
//!
//! - [`VolatilityStopCalculator`]: turns a volatility reading into pip distances
//! - [`StopSource`]: fixed distances or volatility-adaptive ones
//! - [`AverageTrueRange`]: simple-average ATR over completed bars
//! - [`PositionSizer`]: risk specification + account state -> executable volume

pub mod error;
pub mod sizing;
pub mod volatility;

pub use error::{RiskError, RiskResult};
pub use sizing::{AccountBasis, ClampAdjustment, PositionSizer, RiskMode, RiskSpec, SizingOutcome};
pub use volatility::{AverageTrueRange, StopSource, StopTargetSpec, VolatilityStopCalculator};
