use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use common::{
    Balance, Candle, Error, Market, MarketMetadata, MarketRegistry, Position, PositionStatus,
    Result,
};

use super::mapping;

/// Every Kraken response: a list of error strings and an optional result.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    #[serde(default)]
    error: Vec<String>,
    result: Option<T>,
}

impl<T> Envelope<T> {
    pub(crate) fn into_result(self) -> Result<T> {
        if !self.error.is_empty() {
            return Err(Error::Exchange(self.error.join(", ")));
        }
        self.result
            .ok_or_else(|| Error::Exchange("response carried no result".into()))
    }
}

/// time, open, high, low, close, vwap, volume, count
type OhlcRow = (i64, String, String, String, String, String, String, u64);

#[derive(Debug, Deserialize)]
pub(crate) struct AddOrderResult {
    #[serde(default)]
    pub txid: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TradeBalance {
    tb: String,
    m: String,
    mf: String,
    e: String,
    /// Absent while no position is open.
    #[serde(default)]
    ml: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenPosition {
    pair: String,
    posstatus: String,
    time: f64,
    #[serde(rename = "type")]
    side: String,
    cost: String,
    vol: String,
    #[serde(default)]
    vol_closed: Option<String>,
    #[serde(default)]
    margin: Option<String>,
    #[serde(default)]
    net: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AssetPair {
    altname: String,
    lot_decimals: u32,
    #[serde(default)]
    ordermin: Option<String>,
    #[serde(default)]
    costmin: Option<String>,
}

fn decimal(field: &str, raw: &str) -> Result<Decimal> {
    Decimal::from_str(raw.trim_start_matches('+'))
        .map_err(|_| Error::Exchange(format!("invalid {field} '{raw}'")))
}

fn optional_decimal(field: &str, raw: Option<&str>) -> Result<Decimal> {
    raw.map_or(Ok(Decimal::ZERO), |raw| decimal(field, raw))
}

/// OHLC result: one array keyed by pair name next to a `last` cursor.
pub(crate) fn parse_ohlc(result: HashMap<String, serde_json::Value>) -> Result<Vec<Candle>> {
    let rows = result
        .into_iter()
        .find(|(key, _)| key != "last")
        .map(|(_, rows)| rows)
        .ok_or_else(|| Error::Exchange("OHLC response carried no series".into()))?;
    let rows: Vec<OhlcRow> = serde_json::from_value(rows)?;

    rows.into_iter()
        .map(|(time, open, high, low, close, ..)| {
            let timestamp = Utc
                .timestamp_opt(time, 0)
                .single()
                .ok_or_else(|| Error::Exchange(format!("invalid candle time {time}")))?;
            Ok(Candle::new(
                decimal("open", &open)?,
                decimal("high", &high)?,
                decimal("low", &low)?,
                decimal("close", &close)?,
                timestamp,
            ))
        })
        .collect()
}

impl TradeBalance {
    pub(crate) fn into_balance(self) -> Result<Balance> {
        Ok(Balance {
            trade_balance: decimal("tb", &self.tb)?,
            initial_margin: decimal("m", &self.m)?,
            free_margin: decimal("mf", &self.mf)?,
            equity: decimal("e", &self.e)?,
            margin_level: optional_decimal("ml", self.ml.as_deref())?,
        })
    }
}

/// Positions on `market`, keyed in the response by position id.
pub(crate) fn parse_positions(
    result: HashMap<String, OpenPosition>,
    market: Market,
    default_leverage: Decimal,
) -> Result<Vec<Position>> {
    let pair = mapping::pair_code(market);
    let mut positions = result
        .into_iter()
        .filter(|(_, p)| p.pair == pair)
        .map(|(id, p)| p.into_position(id, market, default_leverage))
        .collect::<Result<Vec<_>>>()?;
    positions.sort_by_key(|p| p.created_at);
    Ok(positions)
}

impl OpenPosition {
    fn into_position(
        self,
        id: String,
        market: Market,
        default_leverage: Decimal,
    ) -> Result<Position> {
        let vol = decimal("vol", &self.vol)?;
        let vol_closed = optional_decimal("vol_closed", self.vol_closed.as_deref())?;
        let cost = decimal("cost", &self.cost)?;
        let margin = optional_decimal("margin", self.margin.as_deref())?;

        let open_price = if vol.is_zero() { Decimal::ZERO } else { cost / vol };
        let leverage = if margin.is_zero() {
            default_leverage
        } else {
            (cost / margin).round()
        };
        let status = if self.posstatus == "open" {
            PositionStatus::Open
        } else {
            PositionStatus::Closed
        };

        Ok(Position {
            id,
            market,
            side: mapping::side_from_code(&self.side)?,
            size: vol - vol_closed,
            open_price,
            close_price: None,
            cost,
            realized: optional_decimal("net", self.net.as_deref())?,
            status,
            leverage,
            created_at: timestamp_from_secs(self.time)?,
        })
    }
}

/// Fractional unix seconds. Out-of-range values saturate in the cast and are
/// then rejected by chrono.
fn timestamp_from_secs(secs: f64) -> Result<DateTime<Utc>> {
    let invalid = || Error::Exchange(format!("invalid position time {secs}"));
    if !secs.is_finite() {
        return Err(invalid());
    }
    Utc.timestamp_millis_opt((secs * 1000.0) as i64)
        .single()
        .ok_or_else(invalid)
}

/// Metadata for each requested market. A market missing from the response
/// is an error.
pub(crate) fn parse_asset_pairs(
    result: HashMap<String, AssetPair>,
    markets: &[Market],
) -> Result<MarketRegistry> {
    markets
        .iter()
        .map(|&market| {
            let pair = result.get(mapping::pair_code(market)).ok_or_else(|| {
                Error::Exchange(format!("no asset pair info for {market}"))
            })?;
            let (trade_currency, reference_currency) =
                mapping::currencies_from_altname(&pair.altname)?;
            let metadata = MarketMetadata {
                precision: pair.lot_decimals,
                trade_currency,
                reference_currency,
                min_cost: optional_decimal("costmin", pair.costmin.as_deref())?,
                min_volume: optional_decimal("ordermin", pair.ordermin.as_deref())?,
            };
            Ok((market, metadata))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{Currency, OrderSide};
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn envelope<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> Result<T> {
        serde_json::from_value::<Envelope<T>>(value)?.into_result()
    }

    #[test]
    fn envelope_errors_become_exchange_errors() {
        let err = envelope::<TradeBalance>(json!({
            "error": ["EAPI:Invalid key"]
        }))
        .unwrap_err();
        assert!(matches!(err, Error::Exchange(ref m) if m == "EAPI:Invalid key"));
        assert!(!err.is_fatal());
    }

    #[test]
    fn ohlc_rows_become_candles() {
        let result = envelope(json!({
            "error": [],
            "result": {
                "XXBTZEUR": [
                    [1616662740, "52591.9", "52599.9", "52591.8", "52599.9", "52599.1", "0.11091626", 5],
                    [1616662800, "52600.0", "52610.0", "52580.0", "52605.5", "52600.1", "0.5", 9]
                ],
                "last": 1616662740
            }
        }))
        .unwrap();
        let candles = parse_ohlc(result).unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[1].close, dec!(52605.5));
        assert_eq!(candles[1].timestamp.timestamp(), 1616662800);
        assert!(candles[0].timestamp < candles[1].timestamp);
    }

    #[test]
    fn trade_balance_without_margin_level() {
        let balance = envelope::<TradeBalance>(json!({
            "error": [],
            "result": {"eb": "1.0", "tb": "1000.5", "m": "0.0", "n": "0.0", "c": "0.0",
                       "v": "0.0", "e": "1000.5", "mf": "1000.5"}
        }))
        .unwrap()
        .into_balance()
        .unwrap();
        assert_eq!(balance.free_margin, dec!(1000.5));
        assert_eq!(balance.margin_level, Decimal::ZERO);
    }

    #[test]
    fn positions_are_filtered_by_market() {
        let result = envelope(json!({
            "error": [],
            "result": {
                "TF5GVO-T7ZZ2-6NBKBI": {
                    "ordertxid": "OLWNFG-LLH4R-D6SFFP", "posstatus": "open", "pair": "XXBTZEUR",
                    "time": 1605280097.8294, "type": "buy", "ordertype": "market",
                    "cost": "1000.0", "fee": "2.0", "vol": "0.05", "vol_closed": "0.01",
                    "margin": "200.0", "net": "+12.5"
                },
                "T24DOR-TAFLM-ID3NYP": {
                    "ordertxid": "OIVYGZ-M5EHU-ZRUQXX", "posstatus": "open", "pair": "XETHZEUR",
                    "time": 1605280098.0, "type": "sell", "ordertype": "market",
                    "cost": "500.0", "fee": "1.0", "vol": "1", "vol_closed": "0",
                    "margin": "100.0", "net": "-3"
                }
            }
        }))
        .unwrap();
        let positions = parse_positions(result, Market::XbtEur, dec!(5)).unwrap();
        assert_eq!(positions.len(), 1);
        let p = &positions[0];
        assert_eq!(p.id, "TF5GVO-T7ZZ2-6NBKBI");
        assert_eq!(p.side, OrderSide::Buy);
        assert_eq!(p.size, dec!(0.04));
        assert_eq!(p.open_price, dec!(20000));
        assert_eq!(p.realized, dec!(12.5));
        assert_eq!(p.leverage, dec!(5));
        assert!(p.is_open());
    }

    #[test]
    fn unknown_position_side_is_fatal() {
        let result = envelope(json!({
            "error": [],
            "result": {
                "T1": {"pair": "XXBTZEUR", "posstatus": "open", "time": 1.0, "type": "long",
                       "cost": "1", "vol": "1"}
            }
        }))
        .unwrap();
        assert!(parse_positions(result, Market::XbtEur, dec!(5))
            .unwrap_err()
            .is_fatal());
    }

    #[test]
    fn out_of_range_position_time_is_rejected() {
        let result = envelope(json!({
            "error": [],
            "result": {
                "T1": {"pair": "XXBTZEUR", "posstatus": "open", "time": 1e20, "type": "buy",
                       "cost": "1", "vol": "1"}
            }
        }))
        .unwrap();
        let err = parse_positions(result, Market::XbtEur, dec!(5)).unwrap_err();
        assert!(matches!(err, Error::Exchange(ref m) if m.contains("position time")));
        assert!(!err.is_fatal());
        assert!(timestamp_from_secs(f64::NAN).is_err());
        let parsed = timestamp_from_secs(1605280097.5).unwrap();
        assert_eq!(parsed.timestamp_millis(), 1605280097500);
    }

    #[test]
    fn asset_pairs_use_lot_decimals() {
        let result = envelope(json!({
            "error": [],
            "result": {
                "XXBTZEUR": {"altname": "XBTEUR", "wsname": "XBT/EUR", "base": "XXBT",
                             "quote": "ZEUR", "pair_decimals": 1, "lot_decimals": 8,
                             "ordermin": "0.0001", "costmin": "0.5"}
            }
        }))
        .unwrap();
        let registry = parse_asset_pairs(result, &[Market::XbtEur]).unwrap();
        let meta = registry.get(Market::XbtEur).unwrap();
        assert_eq!(meta.precision, 8);
        assert_eq!(meta.trade_currency, Currency::Xbt);
        assert_eq!(meta.reference_currency, Currency::Eur);
        assert_eq!(meta.min_volume, dec!(0.0001));
        assert_eq!(meta.min_cost, dec!(0.5));
    }

    #[test]
    fn missing_asset_pair_is_an_error() {
        let registry = parse_asset_pairs(HashMap::new(), &[Market::LtcEur]);
        assert!(registry.is_err());
    }
}
