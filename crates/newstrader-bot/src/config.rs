//! Application configuration.

use std::path::Path;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use newstrader_core::{SymbolSpec, Volume};
use newstrader_executor::{DirectionPolicy, OrderTag};
use newstrader_position::{ManagementMode, ScheduledEvent};
use newstrader_risk::{
    AccountBasis, RiskMode, RiskSpec, StopSource, StopTargetSpec, VolatilityStopCalculator,
};

use crate::error::{AppError, AppResult};

/// Scheduled event and its timing windows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventConfig {
    #[serde(default = "default_year")]
    pub year: i32,
    #[serde(default = "default_month")]
    pub month: u32,
    #[serde(default = "default_day")]
    pub day: u32,
    #[serde(default)]
    pub hour: u32,
    #[serde(default)]
    pub minute: u32,
    /// Entry window before the event (s).
    #[serde(default = "default_seconds_before")]
    pub seconds_before: u64,
    /// Forced close after the event (s). 0 disables.
    #[serde(default = "default_close_after_seconds")]
    pub close_after_seconds: u64,
    /// Emit the countdown text on the display tick.
    #[serde(default = "default_true")]
    pub show_timer: bool,
}

fn default_year() -> i32 {
    2022
}

fn default_month() -> u32 {
    4
}

fn default_day() -> u32 {
    26
}

fn default_seconds_before() -> u64 {
    10
}

fn default_close_after_seconds() -> u64 {
    3600
}

fn default_true() -> bool {
    true
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            year: default_year(),
            month: default_month(),
            day: default_day(),
            hour: 0,
            minute: 0,
            seconds_before: default_seconds_before(),
            close_after_seconds: default_close_after_seconds(),
            show_timer: true,
        }
    }
}

/// Entry directions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryConfig {
    #[serde(default = "default_true")]
    pub enable_buy: bool,
    #[serde(default = "default_true")]
    pub enable_sell: bool,
    /// One order in a random direction instead of the enabled ones.
    #[serde(default)]
    pub randomize: bool,
    /// Seed for the randomized direction. Unset draws from OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for EntryConfig {
    fn default() -> Self {
        Self {
            enable_buy: true,
            enable_sell: true,
            randomize: false,
            seed: None,
        }
    }
}

impl EntryConfig {
    pub fn direction_policy(&self) -> DirectionPolicy {
        DirectionPolicy::from_flags(self.enable_buy, self.enable_sell, self.randomize)
    }
}

/// Fixed stop/target distances in pips.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopsConfig {
    #[serde(default = "default_stop_loss_pips")]
    pub stop_loss_pips: Decimal,
    #[serde(default = "default_take_profit_pips")]
    pub take_profit_pips: Decimal,
}

fn default_stop_loss_pips() -> Decimal {
    dec!(15)
}

fn default_take_profit_pips() -> Decimal {
    dec!(75)
}

impl Default for StopsConfig {
    fn default() -> Self {
        Self {
            stop_loss_pips: default_stop_loss_pips(),
            take_profit_pips: default_take_profit_pips(),
        }
    }
}

/// Volatility-derived stop/target distances (ATR).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolatilityConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_atr_period")]
    pub period: usize,
    #[serde(default = "default_stop_multiplier")]
    pub stop_multiplier: Decimal,
    #[serde(default = "default_target_multiplier")]
    pub target_multiplier: Decimal,
}

fn default_atr_period() -> usize {
    14
}

fn default_stop_multiplier() -> Decimal {
    Decimal::ONE
}

fn default_target_multiplier() -> Decimal {
    dec!(5)
}

impl Default for VolatilityConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            period: default_atr_period(),
            stop_multiplier: default_stop_multiplier(),
            target_multiplier: default_target_multiplier(),
        }
    }
}

/// Risk-based sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoneyManagementConfig {
    /// When off, every order uses `order.lots`.
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_risk_percent")]
    pub risk_percent: Decimal,
    #[serde(default)]
    pub money_risk: Decimal,
    /// Non-zero overrides balance/equity as the risk basis.
    #[serde(default)]
    pub fixed_balance: Decimal,
    /// Risk `money_risk` instead of `risk_percent`.
    #[serde(default)]
    pub use_money: bool,
    #[serde(default)]
    pub use_equity: bool,
}

fn default_risk_percent() -> Decimal {
    Decimal::ONE
}

impl Default for MoneyManagementConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            risk_percent: default_risk_percent(),
            money_risk: Decimal::ZERO,
            fixed_balance: Decimal::ZERO,
            use_money: false,
            use_equity: false,
        }
    }
}

/// Order tagging and fixed volume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderConfig {
    #[serde(default = "default_lots")]
    pub lots: Decimal,
    #[serde(default = "default_slippage_pips")]
    pub slippage_pips: u32,
    #[serde(default = "default_comment")]
    pub comment: String,
}

fn default_lots() -> Decimal {
    dec!(0.01)
}

fn default_slippage_pips() -> u32 {
    1
}

fn default_comment() -> String {
    "NewsTrader".to_string()
}

impl Default for OrderConfig {
    fn default() -> Self {
        Self {
            lots: default_lots(),
            slippage_pips: default_slippage_pips(),
            comment: default_comment(),
        }
    }
}

/// Traded symbol and its chart timeframe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolConfig {
    #[serde(flatten)]
    pub spec: SymbolSpec,
    /// Part of the owner label.
    #[serde(default = "default_timeframe")]
    pub timeframe: String,
}

fn default_timeframe() -> String {
    "m1".to_string()
}

impl Default for SymbolConfig {
    fn default() -> Self {
        Self {
            spec: SymbolSpec {
                name: "EURUSD".to_string(),
                pip_size: dec!(0.0001),
                digits: 5,
                lot_size: dec!(100000),
                volume_min: Volume::new(dec!(1000)),
                volume_max: Volume::new(dec!(10000000)),
                volume_step: Volume::new(dec!(1000)),
            },
            timeframe: default_timeframe(),
        }
    }
}

/// Starting account state for the paper venue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    #[serde(default = "default_balance")]
    pub balance: Decimal,
    /// Defaults to `balance` when unset.
    #[serde(default)]
    pub equity: Option<Decimal>,
}

fn default_balance() -> Decimal {
    dec!(10000)
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            balance: default_balance(),
            equity: None,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub event: EventConfig,
    #[serde(default)]
    pub entry: EntryConfig,
    #[serde(default)]
    pub stops: StopsConfig,
    #[serde(default)]
    pub volatility: VolatilityConfig,
    #[serde(default)]
    pub management: ManagementMode,
    #[serde(default)]
    pub money_management: MoneyManagementConfig,
    #[serde(default)]
    pub order: OrderConfig,
    #[serde(default)]
    pub symbol: SymbolConfig,
    #[serde(default)]
    pub account: AccountConfig,
}

impl AppConfig {
    /// Load from a specific file.
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate TOML text.
    pub fn from_toml(content: &str) -> AppResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the event time and every distance, multiplier and amount.
    pub fn validate(&self) -> AppResult<()> {
        self.scheduled_event()?;
        self.symbol.spec.validate()?;

        let non_negative = [
            ("stops.stop_loss_pips", self.stops.stop_loss_pips),
            ("stops.take_profit_pips", self.stops.take_profit_pips),
            ("volatility.stop_multiplier", self.volatility.stop_multiplier),
            ("volatility.target_multiplier", self.volatility.target_multiplier),
            ("money_management.risk_percent", self.money_management.risk_percent),
            ("money_management.money_risk", self.money_management.money_risk),
            ("money_management.fixed_balance", self.money_management.fixed_balance),
            ("order.lots", self.order.lots),
        ];
        if let Some((name, value)) = non_negative.iter().find(|(_, v)| v.is_sign_negative()) {
            return Err(AppError::Config(format!(
                "{name} must be non-negative, got {value}"
            )));
        }

        if self.volatility.enabled && self.volatility.period == 0 {
            return Err(AppError::Config(
                "volatility.period must be at least 1".to_string(),
            ));
        }

        self.risk_spec()?;
        Ok(())
    }

    pub fn scheduled_event(&self) -> AppResult<ScheduledEvent> {
        let e = &self.event;
        Ok(ScheduledEvent::from_components(
            e.year,
            e.month,
            e.day,
            e.hour,
            e.minute,
            e.seconds_before,
            e.close_after_seconds,
        )?)
    }

    pub fn risk_mode(&self) -> RiskMode {
        let mm = &self.money_management;
        if !mm.enabled {
            RiskMode::FixedVolume {
                lots: self.order.lots,
            }
        } else if mm.use_money {
            RiskMode::FixedMoneyRisk {
                money: mm.money_risk,
            }
        } else {
            RiskMode::PercentRisk {
                percent: mm.risk_percent,
            }
        }
    }

    pub fn risk_spec(&self) -> AppResult<RiskSpec> {
        let basis = if self.money_management.use_equity {
            AccountBasis::Equity
        } else {
            AccountBasis::Balance
        };
        Ok(RiskSpec::from_symbol(
            self.risk_mode(),
            basis,
            self.money_management.fixed_balance,
            &self.symbol.spec,
        )?)
    }

    pub fn stop_source(&self) -> AppResult<StopSource> {
        if self.volatility.enabled {
            let calc = VolatilityStopCalculator::new(
                self.volatility.stop_multiplier,
                self.volatility.target_multiplier,
            )?;
            Ok(StopSource::Volatility(calc))
        } else {
            Ok(StopSource::Fixed(StopTargetSpec::new(
                self.stops.stop_loss_pips,
                self.stops.take_profit_pips,
            )))
        }
    }

    /// Owner label: `"{comment} {symbol} {timeframe}"`.
    pub fn label(&self) -> String {
        format!(
            "{} {} {}",
            self.order.comment, self.symbol.spec.name, self.symbol.timeframe
        )
    }

    pub fn order_tag(&self) -> OrderTag {
        OrderTag {
            label: self.label(),
            comment: self.order.comment.clone(),
            slippage_pips: self.order.slippage_pips,
        }
    }
}
