//! Translation between domain enums and Kraken codes.
//!
//! The tables are closed. A code outside them is `Error::UnknownEnumerant`,
//! which stops the process.

use std::str::FromStr;

use rust_decimal::Decimal;

use common::{Currency, Error, Market, OrderSide, Result};

/// Kraken pair name used in requests and responses.
pub fn pair_code(market: Market) -> &'static str {
    match market {
        Market::XbtEur => "XXBTZEUR",
        Market::XbtUsd => "XXBTZUSD",
        Market::XbtUsdt => "XBTUSDT",
        Market::EthEur => "XETHZEUR",
        Market::EthUsd => "XETHZUSD",
        Market::LtcEur => "XLTCZEUR",
    }
}

pub fn market_from_pair(code: &str) -> Result<Market> {
    Market::ALL
        .into_iter()
        .find(|m| pair_code(*m) == code)
        .ok_or_else(|| Error::unknown("market", code))
}

/// Currencies from a pair altname such as `XBTEUR` or `XBTUSDT`.
pub fn currencies_from_altname(altname: &str) -> Result<(Currency, Currency)> {
    let (trade, reference) = match altname.get(..3) {
        Some(trade) => (trade, &altname[3..]),
        None => return Err(Error::unknown("currency", altname)),
    };
    Ok((Currency::from_str(trade)?, Currency::from_str(reference)?))
}

pub fn side_code(side: OrderSide) -> &'static str {
    match side {
        OrderSide::Buy => "buy",
        OrderSide::Sell => "sell",
    }
}

pub fn side_from_code(code: &str) -> Result<OrderSide> {
    match code {
        "buy" => Ok(OrderSide::Buy),
        "sell" => Ok(OrderSide::Sell),
        other => Err(Error::unknown("side", other)),
    }
}

/// Leverage Kraken grants on each market.
pub fn leverage_for(market: Market) -> Decimal {
    match market {
        Market::LtcEur => Decimal::from(3),
        Market::XbtEur | Market::XbtUsd | Market::XbtUsdt | Market::EthEur | Market::EthUsd => {
            Decimal::from(5)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_codes_round_trip() {
        for market in Market::ALL {
            assert_eq!(market_from_pair(pair_code(market)).unwrap(), market);
        }
        assert_eq!(pair_code(Market::XbtEur), "XXBTZEUR");
        assert_eq!(pair_code(Market::XbtUsdt), "XBTUSDT");
    }

    #[test]
    fn unknown_pair_is_fatal() {
        let err = market_from_pair("XDGZEUR").unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn altnames_split_into_currencies() {
        assert_eq!(
            currencies_from_altname("XBTEUR").unwrap(),
            (Currency::Xbt, Currency::Eur)
        );
        assert_eq!(
            currencies_from_altname("XBTUSDT").unwrap(),
            (Currency::Xbt, Currency::Usdt)
        );
        assert!(currencies_from_altname("DOTEUR").unwrap_err().is_fatal());
        assert!(currencies_from_altname("XB").is_err());
    }

    #[test]
    fn sides() {
        assert_eq!(side_from_code(side_code(OrderSide::Sell)).unwrap(), OrderSide::Sell);
        assert!(matches!(
            side_from_code("long"),
            Err(Error::UnknownEnumerant { kind: "side", .. })
        ));
    }

    #[test]
    fn leverage_table() {
        assert_eq!(leverage_for(Market::XbtEur), Decimal::from(5));
        assert_eq!(leverage_for(Market::LtcEur), Decimal::from(3));
    }
}
