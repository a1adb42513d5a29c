//! Risk-based position sizing.
//!
//! Volume = round(risk_money / stop_pips / pip_value), clamped to the symbol's
//! `[min, max]` and then floored to a multiple of the volume step.
//!
//! Sizing never fails: a zero stop distance or pip value produces a raw size of
//! zero, which the minimum clamp lifts to the broker minimum. Every clamp is
//! reported as a [`ClampAdjustment`] and logged.

use newstrader_core::{AccountSnapshot, SymbolSpec, Volume};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{RiskError, RiskResult};

/// How the order volume is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RiskMode {
    /// Fixed lot size, money management off.
    FixedVolume { lots: Decimal },
    /// Risk a percentage of the account basis per trade.
    PercentRisk { percent: Decimal },
    /// Risk a fixed amount of account currency per trade.
    FixedMoneyRisk { money: Decimal },
}

/// Which account figure percent risk is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountBasis {
    #[default]
    Balance,
    Equity,
}

/// Risk specification plus the symbol's volume granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskSpec {
    pub mode: RiskMode,
    pub basis: AccountBasis,
    /// Overrides the account basis when positive.
    pub fixed_balance: Decimal,
    /// Platform units per lot.
    pub lot_size: Decimal,
    pub volume_min: Volume,
    pub volume_max: Volume,
    pub volume_step: Volume,
}

impl RiskSpec {
    /// Build a spec taking volume granularity from the symbol.
    pub fn from_symbol(
        mode: RiskMode,
        basis: AccountBasis,
        fixed_balance: Decimal,
        symbol: &SymbolSpec,
    ) -> RiskResult<Self> {
        let spec = Self {
            mode,
            basis,
            fixed_balance,
            lot_size: symbol.lot_size,
            volume_min: symbol.volume_min,
            volume_max: symbol.volume_max,
            volume_step: symbol.volume_step,
        };
        spec.validate()?;
        Ok(spec)
    }

    pub fn validate(&self) -> RiskResult<()> {
        match self.mode {
            RiskMode::FixedVolume { lots } if lots <= Decimal::ZERO => {
                return Err(RiskError::InvalidSpec(format!(
                    "fixed lots must be positive, got {lots}"
                )));
            }
            RiskMode::PercentRisk { percent } if percent < Decimal::ZERO => {
                return Err(RiskError::InvalidSpec(format!(
                    "risk percent must be non-negative, got {percent}"
                )));
            }
            RiskMode::FixedMoneyRisk { money } if money < Decimal::ZERO => {
                return Err(RiskError::InvalidSpec(format!(
                    "risk money must be non-negative, got {money}"
                )));
            }
            _ => {}
        }
        if self.fixed_balance < Decimal::ZERO {
            return Err(RiskError::InvalidSpec(format!(
                "fixed balance must be non-negative, got {}",
                self.fixed_balance
            )));
        }
        if self.volume_min > self.volume_max {
            return Err(RiskError::InvalidSpec(format!(
                "volume_min {} exceeds volume_max {}",
                self.volume_min, self.volume_max
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn is_money_managed(&self) -> bool {
        !matches!(self.mode, RiskMode::FixedVolume { .. })
    }
}

/// A clamping decision made while sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClampAdjustment {
    RaisedToMinimum { calculated: Volume, minimum: Volume },
    LoweredToMaximum { calculated: Volume, maximum: Volume },
    FlooredToStep { calculated: Volume, step: Volume, result: Volume },
}

/// Result of a sizing call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizingOutcome {
    /// Volume to submit (platform units).
    pub volume: Volume,
    /// Rounded volume before clamping.
    pub raw: Volume,
    /// Money at risk the raw volume was derived from (zero for fixed volume).
    pub risk_money: Decimal,
    pub adjustments: Vec<ClampAdjustment>,
}

/// Converts a risk specification and account state into an executable volume.
#[derive(Debug, Clone)]
pub struct PositionSizer {
    spec: RiskSpec,
}

impl PositionSizer {
    #[must_use]
    pub fn new(spec: RiskSpec) -> Self {
        Self { spec }
    }

    #[must_use]
    pub fn spec(&self) -> &RiskSpec {
        &self.spec
    }

    /// Money the account basis allows to lose on one trade.
    #[must_use]
    pub fn risk_money(&self, account: &AccountSnapshot) -> Decimal {
        let basis = if self.spec.fixed_balance > Decimal::ZERO {
            self.spec.fixed_balance
        } else {
            match self.spec.basis {
                AccountBasis::Equity => account.equity,
                AccountBasis::Balance => account.balance,
            }
        };

        match self.spec.mode {
            RiskMode::FixedVolume { .. } => Decimal::ZERO,
            RiskMode::PercentRisk { percent } => basis
                .checked_mul(percent)
                .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
                .unwrap_or_else(|| {
                    warn!(
                        basis = %basis,
                        percent = %percent,
                        "Risk money overflowed, treating as zero"
                    );
                    Decimal::ZERO
                }),
            RiskMode::FixedMoneyRisk { money } => money,
        }
    }

    /// Size an order.
    ///
    /// # Arguments
    /// * `account` - Account balance/equity at submission time
    /// * `stop_pips` - Active stop distance in pips
    /// * `pip_value` - Account currency value of one pip per volume unit
    #[must_use]
    pub fn size(
        &self,
        account: &AccountSnapshot,
        stop_pips: Decimal,
        pip_value: Decimal,
    ) -> SizingOutcome {
        if let RiskMode::FixedVolume { lots } = self.spec.mode {
            let volume = Volume::new(lots * self.spec.lot_size);
            return SizingOutcome {
                volume,
                raw: volume,
                risk_money: Decimal::ZERO,
                adjustments: Vec::new(),
            };
        }

        let risk_money = self.risk_money(account);
        let raw = Volume::new(Self::raw_volume(risk_money, stop_pips, pip_value));
        debug!(
            risk_money = %risk_money,
            stop_pips = %stop_pips,
            pip_value = %pip_value,
            raw = %raw,
            "Calculated raw position size"
        );

        let mut adjustments = Vec::new();
        let mut volume = raw;

        if volume < self.spec.volume_min {
            info!(
                calculated = %volume,
                minimum = %self.spec.volume_min,
                "Calculated position size is less than minimum position size, setting to minimum"
            );
            adjustments.push(ClampAdjustment::RaisedToMinimum {
                calculated: volume,
                minimum: self.spec.volume_min,
            });
            volume = self.spec.volume_min;
        } else if volume > self.spec.volume_max {
            info!(
                calculated = %volume,
                maximum = %self.spec.volume_max,
                "Calculated position size is greater than maximum position size, setting to maximum"
            );
            adjustments.push(ClampAdjustment::LoweredToMaximum {
                calculated: volume,
                maximum: self.spec.volume_max,
            });
            volume = self.spec.volume_max;
        }

        let stepped = volume.floor_to_step(self.spec.volume_step);
        if stepped != volume {
            info!(
                calculated = %volume,
                step = %self.spec.volume_step,
                result = %stepped,
                "Calculated position size uses uneven step size, flooring to step"
            );
            adjustments.push(ClampAdjustment::FlooredToStep {
                calculated: volume,
                step: self.spec.volume_step,
                result: stepped,
            });
            volume = stepped;
        }

        SizingOutcome {
            volume,
            raw,
            risk_money,
            adjustments,
        }
    }

    /// round(risk_money / stop_pips / pip_value), or zero when a divisor is not positive.
    fn raw_volume(risk_money: Decimal, stop_pips: Decimal, pip_value: Decimal) -> Decimal {
        if stop_pips <= Decimal::ZERO || pip_value <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        match risk_money
            .checked_div(stop_pips)
            .and_then(|per_pip| per_pip.checked_div(pip_value))
        {
            Some(units) => units.round(),
            None => {
                warn!(
                    risk_money = %risk_money,
                    stop_pips = %stop_pips,
                    pip_value = %pip_value,
                    "Position size overflowed, treating raw size as zero"
                );
                Decimal::ZERO
            }
        }
    }
}
