use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use common::{Error, Result};

/// Tunable strategy parameters (TOML). Every field has a default, so the
/// file is optional and may list only what it overrides.
///
/// Example `config/strategy.toml`:
/// ```toml
/// rsi_period = 14
/// oversold = 30
/// overbought = 70
/// bb_period = 20
/// bb_multiplier = 2
/// take_profit_pct = 1.5
/// margin_fraction_pct = 10
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StrategyParams {
    pub rsi_period: usize,
    pub oversold: Decimal,
    pub overbought: Decimal,
    pub bb_period: usize,
    pub bb_multiplier: Decimal,
    /// Gain over the entry price, in percent, that closes a position.
    pub take_profit_pct: Decimal,
    /// Share of free margin, in percent, committed to one entry.
    pub margin_fraction_pct: Decimal,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
}

impl Default for StrategyParams {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            oversold: Decimal::from(30),
            overbought: Decimal::from(70),
            bb_period: 20,
            bb_multiplier: Decimal::TWO,
            take_profit_pct: Decimal::new(15, 1),
            margin_fraction_pct: Decimal::TEN,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
        }
    }
}

impl StrategyParams {
    /// Load from a TOML file, or use the defaults when no path is given.
    pub fn load(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|e| {
                    Error::Config(format!("failed to read strategy config at '{path}': {e}"))
                })?;
                Self::from_toml(&content)
                    .map_err(|e| Error::Config(format!("strategy config at '{path}': {e}")))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }
}
