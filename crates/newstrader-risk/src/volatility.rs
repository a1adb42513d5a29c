//! Volatility-adaptive stop and target distances.
//!
//! **Distance definition**: `reading × multiplier / pip_size` (pips), where the
//! reading is an average-true-range style price range.
//!
//! The calculator is stateless. [`AverageTrueRange`] is the optional source of
//! readings when the platform does not push one.

use std::collections::VecDeque;

use newstrader_core::Bar;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{RiskError, RiskResult};

/// Stop-loss and take-profit distances in pips.
///
/// Both distances are non-negative; a zero distance means the level is
/// not attached and any math keyed on it is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StopTargetSpec {
    pub stop_pips: Decimal,
    pub target_pips: Decimal,
}

impl StopTargetSpec {
    /// Build a spec, flooring negative inputs at zero.
    #[must_use]
    pub fn new(stop_pips: Decimal, target_pips: Decimal) -> Self {
        Self {
            stop_pips: stop_pips.max(Decimal::ZERO),
            target_pips: target_pips.max(Decimal::ZERO),
        }
    }

    #[must_use]
    pub fn has_stop(&self) -> bool {
        !self.stop_pips.is_zero()
    }

    #[must_use]
    pub fn has_target(&self) -> bool {
        !self.target_pips.is_zero()
    }
}

/// Converts a volatility reading into stop/target distances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolatilityStopCalculator {
    stop_multiplier: Decimal,
    target_multiplier: Decimal,
}

impl VolatilityStopCalculator {
    /// Create a calculator. Multipliers must be non-negative.
    pub fn new(stop_multiplier: Decimal, target_multiplier: Decimal) -> RiskResult<Self> {
        if stop_multiplier < Decimal::ZERO || target_multiplier < Decimal::ZERO {
            return Err(RiskError::InvalidVolatility(format!(
                "multipliers must be non-negative (sl={stop_multiplier}, tp={target_multiplier})"
            )));
        }
        Ok(Self {
            stop_multiplier,
            target_multiplier,
        })
    }

    #[must_use]
    pub fn stop_multiplier(&self) -> Decimal {
        self.stop_multiplier
    }

    #[must_use]
    pub fn target_multiplier(&self) -> Decimal {
        self.target_multiplier
    }

    /// Compute distances from the latest reading.
    ///
    /// A missing or negative reading counts as zero, and so does a
    /// non-positive pip size.
    #[must_use]
    pub fn compute(&self, reading: Option<Decimal>, pip_size: Decimal) -> StopTargetSpec {
        let reading = reading.unwrap_or(Decimal::ZERO).max(Decimal::ZERO);
        if pip_size <= Decimal::ZERO {
            return StopTargetSpec::default();
        }
        StopTargetSpec::new(
            Self::distance(reading, self.stop_multiplier, pip_size),
            Self::distance(reading, self.target_multiplier, pip_size),
        )
    }

    /// `reading * multiplier / pip_size` in pips; overflow counts as zero.
    fn distance(reading: Decimal, multiplier: Decimal, pip_size: Decimal) -> Decimal {
        reading
            .checked_mul(multiplier)
            .and_then(|v| v.checked_div(pip_size))
            .unwrap_or_else(|| {
                warn!(
                    reading = %reading,
                    multiplier = %multiplier,
                    "Volatility distance overflowed, treating as zero"
                );
                Decimal::ZERO
            })
    }
}

/// Where the active stop/target distances come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopSource {
    /// Configured constant distances.
    Fixed(StopTargetSpec),
    /// Recomputed from the volatility reading on every update.
    Volatility(VolatilityStopCalculator),
}

impl StopSource {
    /// Resolve the distances in effect for this update.
    #[must_use]
    pub fn resolve(&self, reading: Option<Decimal>, pip_size: Decimal) -> StopTargetSpec {
        match self {
            Self::Fixed(spec) => *spec,
            Self::Volatility(calc) => calc.compute(reading, pip_size),
        }
    }

    #[must_use]
    pub fn is_volatility(&self) -> bool {
        matches!(self, Self::Volatility(_))
    }
}

/// Average True Range over completed bars, simple-average smoothed.
///
/// TR = max(high - low, |high - prev_close|, |low - prev_close|); the first
/// bar has no previous close and uses high - low.
#[derive(Debug, Clone)]
pub struct AverageTrueRange {
    period: usize,
    prev_close: Option<Decimal>,
    ranges: VecDeque<Decimal>,
    sum: Decimal,
}

impl AverageTrueRange {
    pub fn new(period: usize) -> RiskResult<Self> {
        if period == 0 {
            return Err(RiskError::InvalidVolatility(
                "ATR period must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            period,
            prev_close: None,
            ranges: VecDeque::with_capacity(period),
            sum: Decimal::ZERO,
        })
    }

    #[must_use]
    pub fn period(&self) -> usize {
        self.period
    }

    fn true_range(bar: &Bar, prev_close: Option<Decimal>) -> Decimal {
        let hl = bar.high - bar.low;
        match prev_close {
            Some(prev) => hl.max((bar.high - prev).abs()).max((bar.low - prev).abs()),
            None => hl,
        }
    }

    /// Record a completed bar.
    pub fn push(&mut self, bar: Bar) {
        let tr = Self::true_range(&bar, self.prev_close);
        self.prev_close = Some(bar.close);

        self.ranges.push_back(tr);
        self.sum += tr;
        while self.ranges.len() > self.period {
            if let Some(old) = self.ranges.pop_front() {
                self.sum -= old;
            }
        }
    }

    /// Current ATR, or `None` until `period` bars have been seen.
    #[must_use]
    pub fn value(&self) -> Option<Decimal> {
        if self.ranges.len() < self.period {
            return None;
        }
        Some(self.sum / Decimal::from(self.period as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn bar(high: Decimal, low: Decimal, close: Decimal) -> Bar {
        Bar { high, low, close }
    }

    #[test]
    fn test_compute_distances() {
        let calc = VolatilityStopCalculator::new(dec!(1), dec!(5)).unwrap();
        let spec = calc.compute(Some(dec!(0.0012)), dec!(0.0001));
        assert_eq!(spec.stop_pips, dec!(12));
        assert_eq!(spec.target_pips, dec!(60));
    }

    #[test]
    fn test_compute_missing_reading_is_zero() {
        let calc = VolatilityStopCalculator::new(dec!(1), dec!(5)).unwrap();
        let spec = calc.compute(None, dec!(0.0001));
        assert_eq!(spec, StopTargetSpec::default());
        assert!(!spec.has_stop());
    }

    #[test]
    fn test_compute_zero_pip_size_is_zero() {
        let calc = VolatilityStopCalculator::new(dec!(1), dec!(5)).unwrap();
        assert_eq!(calc.compute(Some(dec!(0.001)), Decimal::ZERO), StopTargetSpec::default());
    }

    #[test]
    fn test_compute_extreme_reading_is_zero() {
        let calc = VolatilityStopCalculator::new(dec!(1), dec!(5)).unwrap();
        assert_eq!(calc.compute(Some(Decimal::MAX), dec!(0.0001)), StopTargetSpec::default());

        // Stop fits, target overflows in the multiply
        let calc = VolatilityStopCalculator::new(dec!(0), dec!(5)).unwrap();
        let spec = calc.compute(Some(Decimal::MAX), dec!(1));
        assert_eq!(spec.stop_pips, Decimal::ZERO);
        assert_eq!(spec.target_pips, Decimal::ZERO);
    }

    #[test]
    fn test_compute_monotonic_in_reading_and_multiplier() {
        let pip = dec!(0.0001);
        let readings = [dec!(0), dec!(0.0003), dec!(0.0010), dec!(0.0025)];
        let multipliers = [dec!(0), dec!(0.5), dec!(1), dec!(3)];

        for m in multipliers {
            let calc = VolatilityStopCalculator::new(m, m).unwrap();
            let mut last = Decimal::ZERO;
            for r in readings {
                let spec = calc.compute(Some(r), pip);
                assert_eq!(spec.stop_pips, r * m / pip);
                assert!(spec.stop_pips >= last);
                last = spec.stop_pips;
            }
        }

        for r in readings {
            let mut last = Decimal::ZERO;
            for m in multipliers {
                let spec = VolatilityStopCalculator::new(m, m).unwrap().compute(Some(r), pip);
                assert!(spec.target_pips >= last);
                last = spec.target_pips;
            }
        }
    }

    #[test]
    fn test_negative_multiplier_rejected() {
        assert!(VolatilityStopCalculator::new(dec!(-1), dec!(5)).is_err());
    }

    #[test]
    fn test_stop_source_fixed_ignores_reading() {
        let fixed = StopTargetSpec::new(dec!(15), dec!(75));
        let source = StopSource::Fixed(fixed);
        assert_eq!(source.resolve(Some(dec!(0.01)), dec!(0.0001)), fixed);
        assert!(!source.is_volatility());
    }

    #[test]
    fn test_spec_floors_negative() {
        let spec = StopTargetSpec::new(dec!(-3), dec!(10));
        assert_eq!(spec.stop_pips, Decimal::ZERO);
        assert_eq!(spec.target_pips, dec!(10));
    }

    #[test]
    fn test_atr_warmup() {
        let mut atr = AverageTrueRange::new(3).unwrap();
        atr.push(bar(dec!(102), dec!(98), dec!(101)));
        atr.push(bar(dec!(104), dec!(99), dec!(103)));
        assert!(atr.value().is_none());

        atr.push(bar(dec!(106), dec!(101), dec!(105)));
        // (4 + 5 + 5) / 3
        assert_eq!(atr.value().unwrap().round_dp(6), dec!(4.666667));
    }

    #[test]
    fn test_atr_rolls_window_and_uses_gaps() {
        let mut atr = AverageTrueRange::new(2).unwrap();
        atr.push(bar(dec!(102), dec!(98), dec!(100))); // 4
        atr.push(bar(dec!(115), dec!(108), dec!(112))); // gap up: 115 - 100 = 15
        assert_eq!(atr.value(), Some(dec!(9.5)));

        atr.push(bar(dec!(113), dec!(111), dec!(112))); // 2
        assert_eq!(atr.value(), Some(dec!(8.5)));
    }

    #[test]
    fn test_atr_zero_period_rejected() {
        assert!(AverageTrueRange::new(0).is_err());
    }
}
