//! Market, symbol and account data types.
//!
//! Everything here is a synchronous snapshot handed to the controller on
//! each update; the controller never caches platform state between updates.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::{Price, TradeSide, Volume};

/// Static symbol specification supplied by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolSpec {
    /// Symbol name (e.g., "EURUSD").
    pub name: String,
    /// Price size of one pip.
    pub pip_size: Decimal,
    /// Number of decimal places prices are quoted with.
    pub digits: u32,
    /// Platform units per lot.
    pub lot_size: Decimal,
    /// Minimum tradable volume (platform units).
    pub volume_min: Volume,
    /// Maximum tradable volume (platform units).
    pub volume_max: Volume,
    /// Volume granularity (platform units).
    pub volume_step: Volume,
}

impl SymbolSpec {
    /// Check that the specification is internally consistent.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(CoreError::InvalidSymbol("empty symbol name".to_string()));
        }
        if self.pip_size <= Decimal::ZERO {
            return Err(CoreError::InvalidSymbol(format!(
                "pip_size must be positive, got {}",
                self.pip_size
            )));
        }
        if self.lot_size <= Decimal::ZERO {
            return Err(CoreError::InvalidSymbol(format!(
                "lot_size must be positive, got {}",
                self.lot_size
            )));
        }
        if !self.volume_step.is_positive() {
            return Err(CoreError::InvalidVolume(format!(
                "volume_step must be positive, got {}",
                self.volume_step
            )));
        }
        if self.volume_min > self.volume_max {
            return Err(CoreError::InvalidVolume(format!(
                "volume_min {} exceeds volume_max {}",
                self.volume_min, self.volume_max
            )));
        }
        Ok(())
    }

    /// Convert a pip distance to a price distance.
    #[inline]
    pub fn pips_to_price(&self, pips: Decimal) -> Decimal {
        pips * self.pip_size
    }

    /// Round a raw price to the symbol's digits.
    #[inline]
    pub fn round_price(&self, price: Decimal) -> Price {
        Price::new(price).round_to_digits(self.digits)
    }

    /// Move `price` by `pips` for a position of `side`, rounded to digits.
    ///
    /// Positive pips move in the position's favor (up for buys, down for
    /// sells), so a stop is offset by negative pips and a target by positive.
    #[inline]
    pub fn offset_price(&self, price: Price, side: TradeSide, pips: Decimal) -> Price {
        let delta = self.pips_to_price(pips) * Decimal::from(side.sign());
        self.round_price(price.inner() + delta)
    }

    /// Convert lots to platform volume units.
    #[inline]
    pub fn lots_to_volume(&self, lots: Decimal) -> Volume {
        Volume::new(lots * self.lot_size)
    }

    /// Convert platform volume units to lots.
    #[inline]
    pub fn volume_to_lots(&self, volume: Volume) -> Decimal {
        volume.inner() / self.lot_size
    }
}

/// Account money state at the time of an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub balance: Decimal,
    pub equity: Decimal,
}

impl AccountSnapshot {
    pub fn new(balance: Decimal, equity: Decimal) -> Self {
        Self { balance, equity }
    }
}

/// A completed price bar, used to feed volatility tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
}

/// Everything the controller reads on one market update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Platform time of the update.
    pub time: DateTime<Utc>,
    pub bid: Price,
    pub ask: Price,
    /// Account currency value of one pip per platform volume unit.
    pub pip_value: Decimal,
    pub account: AccountSnapshot,
    /// Latest volatility reading (price range), if the platform has one.
    #[serde(default)]
    pub volatility: Option<Decimal>,
}

impl MarketSnapshot {
    /// Price a position of `side` is evaluated against.
    ///
    /// Longs use the ask and shorts the bid, for entry as well as for
    /// stop management.
    #[inline]
    pub fn side_price(&self, side: TradeSide) -> Price {
        match side {
            TradeSide::Buy => self.ask,
            TradeSide::Sell => self.bid,
        }
    }

    /// Both sides quoted and not crossed.
    pub fn has_valid_quote(&self) -> bool {
        self.bid.is_positive() && self.ask.is_positive() && self.bid <= self.ask
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn eurusd() -> SymbolSpec {
        SymbolSpec {
            name: "EURUSD".to_string(),
            pip_size: dec!(0.0001),
            digits: 5,
            lot_size: dec!(100000),
            volume_min: Volume::new(dec!(1000)),
            volume_max: Volume::new(dec!(10000000)),
            volume_step: Volume::new(dec!(1000)),
        }
    }

    fn snapshot(bid: Decimal, ask: Decimal) -> MarketSnapshot {
        MarketSnapshot {
            time: Utc.with_ymd_and_hms(2022, 4, 25, 23, 59, 52).unwrap(),
            bid: Price::new(bid),
            ask: Price::new(ask),
            pip_value: dec!(0.0001),
            account: AccountSnapshot::new(dec!(10000), dec!(10000)),
            volatility: None,
        }
    }

    #[test]
    fn test_symbol_validate_ok() {
        assert!(eurusd().validate().is_ok());
    }

    #[test]
    fn test_symbol_validate_rejects_zero_pip() {
        let mut spec = eurusd();
        spec.pip_size = Decimal::ZERO;
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_symbol_validate_rejects_inverted_limits() {
        let mut spec = eurusd();
        spec.volume_min = Volume::new(dec!(20000000));
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_pips_to_price() {
        assert_eq!(eurusd().pips_to_price(dec!(15)), dec!(0.0015));
    }

    #[test]
    fn test_offset_price_by_side() {
        let spec = eurusd();
        let entry = Price::new(dec!(1.10020));

        assert_eq!(spec.offset_price(entry, TradeSide::Buy, dec!(-15)).inner(), dec!(1.09870));
        assert_eq!(spec.offset_price(entry, TradeSide::Buy, dec!(75)).inner(), dec!(1.10770));
        assert_eq!(spec.offset_price(entry, TradeSide::Sell, dec!(-15)).inner(), dec!(1.10170));
        assert_eq!(spec.offset_price(entry, TradeSide::Sell, dec!(75)).inner(), dec!(1.09270));
    }

    #[test]
    fn test_offset_price_rounds_to_digits() {
        // 0.25 pips = 0.000025 -> midpoint, rounds to even
        let spec = eurusd();
        let price = Price::new(dec!(1.10000));
        assert_eq!(spec.offset_price(price, TradeSide::Buy, dec!(0.25)).inner(), dec!(1.10002));
        assert_eq!(spec.offset_price(price, TradeSide::Buy, Decimal::ZERO), price);
    }

    #[test]
    fn test_lots_to_volume() {
        assert_eq!(eurusd().lots_to_volume(dec!(0.01)).inner(), dec!(1000));
        assert_eq!(eurusd().volume_to_lots(Volume::new(dec!(5000))), dec!(0.05));
    }

    #[test]
    fn test_side_price() {
        let snap = snapshot(dec!(1.10000), dec!(1.10010));
        assert_eq!(snap.side_price(TradeSide::Buy).inner(), dec!(1.10010));
        assert_eq!(snap.side_price(TradeSide::Sell).inner(), dec!(1.10000));
    }

    #[test]
    fn test_valid_quote() {
        assert!(snapshot(dec!(1.1), dec!(1.1001)).has_valid_quote());
        assert!(!snapshot(dec!(1.1002), dec!(1.1001)).has_valid_quote());
        assert!(!snapshot(dec!(0), dec!(1.1001)).has_valid_quote());
    }
}
