use tracing::info;

use common::{Error, Result};

use crate::macd::MacdMomentum;
use crate::twap::TwapReversion;
use crate::{Strategy, StrategyContext, StrategyParams};

/// Builds strategy instances by key. One instance is built per market.
pub struct StrategyRegistry {
    params: StrategyParams,
}

impl StrategyRegistry {
    pub const KEYS: [&'static str; 2] = [TwapReversion::NAME, MacdMomentum::NAME];

    pub fn new(params: StrategyParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &StrategyParams {
        &self.params
    }

    /// Build the strategy registered under `key` for the context's market.
    /// An unknown key is a configuration error.
    pub fn build(&self, key: &str, ctx: StrategyContext) -> Result<Box<dyn Strategy>> {
        let market = ctx.market;
        let strategy: Box<dyn Strategy> = match key.trim().to_ascii_lowercase().as_str() {
            TwapReversion::NAME => Box::new(TwapReversion::new(ctx, self.params.clone())),
            MacdMomentum::NAME => Box::new(MacdMomentum::new(ctx, self.params.clone())),
            other => {
                return Err(Error::Config(format!(
                    "unknown strategy '{other}', expected one of {:?}",
                    Self::KEYS
                )))
            }
        };
        info!(name = %strategy.name(), %market, "Registered strategy");
        Ok(strategy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::context;
    use common::Market;

    #[test]
    fn builds_known_strategies() {
        let registry = StrategyRegistry::new(StrategyParams::default());
        for key in StrategyRegistry::KEYS {
            let strategy = registry.build(key, context()).unwrap();
            assert_eq!(strategy.name(), key);
            assert_eq!(strategy.market(), Market::XbtEur);
        }
        assert_eq!(registry.build(" TWAP ", context()).unwrap().name(), "twap");
    }

    #[test]
    fn unknown_key_is_a_config_error() {
        let registry = StrategyRegistry::new(StrategyParams::default());
        let err = registry.build("grid", context()).err().unwrap();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.is_fatal());
    }
}
