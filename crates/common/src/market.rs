use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Currency, Error, Market, Order, OrderSide, Result};

/// Per-market trading constraints discovered from the exchange at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketMetadata {
    /// Decimal places used to round indicator outputs and order volumes.
    pub precision: u32,
    pub trade_currency: Currency,
    pub reference_currency: Currency,
    /// Minimum order cost in the reference currency.
    pub min_cost: Decimal,
    /// Minimum order volume in the trade currency.
    pub min_volume: Decimal,
}

/// Metadata for every configured market.
///
/// Built once during startup discovery and only read afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketRegistry {
    markets: BTreeMap<Market, MarketMetadata>,
}

impl MarketRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, market: Market, metadata: MarketMetadata) {
        self.markets.insert(market, metadata);
    }

    pub fn get(&self, market: Market) -> Option<&MarketMetadata> {
        self.markets.get(&market)
    }

    /// Like `get`, but a missing market is a configuration error.
    pub fn require(&self, market: Market) -> Result<&MarketMetadata> {
        self.get(market)
            .ok_or_else(|| Error::Config(format!("no metadata discovered for market {market}")))
    }

    pub fn markets(&self) -> impl Iterator<Item = Market> + '_ {
        self.markets.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.markets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markets.is_empty()
    }

    /// Currency an order pays with: the reference currency for buys, the
    /// trade currency for sells.
    pub fn spent_currency(&self, order: &Order) -> Option<Currency> {
        let md = self.get(order.market)?;
        Some(match order.side {
            OrderSide::Buy => md.reference_currency,
            OrderSide::Sell => md.trade_currency,
        })
    }
}

impl FromIterator<(Market, MarketMetadata)> for MarketRegistry {
    fn from_iter<I: IntoIterator<Item = (Market, MarketMetadata)>>(iter: I) -> Self {
        Self {
            markets: iter.into_iter().collect(),
        }
    }
}

impl std::fmt::Display for MarketRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, (market, md)) in self.markets.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(
                f,
                "[{market}]: precision {}, tc {}, rc {}, mc {}, mv {}",
                md.precision, md.trade_currency, md.reference_currency, md.min_cost, md.min_volume
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{OrderKind, OrderStatus, PriceKind};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn xbteur() -> MarketMetadata {
        MarketMetadata {
            precision: 8,
            trade_currency: Currency::Xbt,
            reference_currency: Currency::Eur,
            min_cost: dec!(0.5),
            min_volume: dec!(0.0001),
        }
    }

    #[test]
    fn require_reports_missing_market_as_config_error() {
        let registry: MarketRegistry = [(Market::XbtEur, xbteur())].into_iter().collect();
        assert!(registry.require(Market::XbtEur).is_ok());
        let err = registry.require(Market::EthEur).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn spent_currency_depends_on_side() {
        let registry: MarketRegistry = [(Market::XbtEur, xbteur())].into_iter().collect();
        let mut order = Order {
            id: "o".into(),
            remote_id: None,
            side: OrderSide::Buy,
            kind: OrderKind::Spot,
            price_kind: PriceKind::Market,
            volume: dec!(1),
            limit_price: None,
            market_price: dec!(1),
            market: Market::XbtEur,
            status: OrderStatus::Created,
            leverage: dec!(1),
            reduce_only: false,
            immediate_or_cancel: false,
            post_only: false,
            created_at: Utc::now(),
        };
        assert_eq!(registry.spent_currency(&order), Some(Currency::Eur));
        order.side = OrderSide::Sell;
        assert_eq!(registry.spent_currency(&order), Some(Currency::Xbt));
    }

    #[test]
    fn display_lists_every_market() {
        let registry: MarketRegistry = [(Market::XbtEur, xbteur())].into_iter().collect();
        let rendered = registry.to_string();
        assert!(rendered.starts_with("[XBTEUR]: precision 8, tc XBT, rc EUR"));
    }
}
