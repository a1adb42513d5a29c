//! Per-update view of this controller's positions.
//!
//! Replaces long/short flags kept across updates: the view is rebuilt from
//! the platform's position list every time, so a position closed by its stop
//! or target can never leave a stale flag behind.

use newstrader_core::TrackedPosition;

/// Positions on `symbol` carrying this controller's owner label.
#[derive(Debug, Clone, Default)]
pub struct OwnedPositions<'a> {
    positions: Vec<&'a TrackedPosition>,
}

impl<'a> OwnedPositions<'a> {
    /// Filter the platform's full position list.
    #[must_use]
    pub fn collect(all: &'a [TrackedPosition], symbol: &str, label: &str) -> Self {
        Self {
            positions: all
                .iter()
                .filter(|p| p.is_owned_by(symbol, label))
                .collect(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a TrackedPosition> + '_ {
        self.positions.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use newstrader_core::{PositionId, Price, TradeSide, Volume};
    use rust_decimal_macros::dec;

    const LABEL: &str = "NewsTrader EURUSD m1";

    fn position(symbol: &str, label: &str, side: TradeSide) -> TrackedPosition {
        TrackedPosition {
            id: PositionId::new(),
            symbol: symbol.to_string(),
            label: label.to_string(),
            side,
            volume: Volume::new(dec!(1000)),
            entry_price: Price::new(dec!(1.1)),
            stop_loss: None,
            take_profit: None,
            opened_at: Utc::now(),
        }
    }

    #[test]
    fn test_collect_filters_symbol_and_label() {
        let all = vec![
            position("EURUSD", LABEL, TradeSide::Buy),
            position("EURUSD", "manual", TradeSide::Sell),
            position("GBPUSD", LABEL, TradeSide::Sell),
        ];
        let owned = OwnedPositions::collect(&all, "EURUSD", LABEL);
        let sides: Vec<_> = owned.iter().map(|p| p.side).collect();
        assert_eq!(sides, vec![TradeSide::Buy]);
        assert_eq!(owned.iter().next().map(|p| p.symbol.as_str()), Some("EURUSD"));
    }

    #[test]
    fn test_empty_when_nothing_matches() {
        let all = vec![position("EURUSD", "manual", TradeSide::Buy)];
        let owned = OwnedPositions::collect(&all, "EURUSD", LABEL);
        assert!(owned.is_empty());
        assert_eq!(owned.iter().count(), 0);
    }

    #[test]
    fn test_keeps_platform_order_across_sides() {
        let all = vec![
            position("EURUSD", LABEL, TradeSide::Sell),
            position("EURUSD", LABEL, TradeSide::Buy),
        ];
        let owned = OwnedPositions::collect(&all, "EURUSD", LABEL);
        let sides: Vec<_> = owned.iter().map(|p| p.side).collect();
        assert_eq!(sides, vec![TradeSide::Sell, TradeSide::Buy]);
        assert!(!owned.is_empty());
    }
}
