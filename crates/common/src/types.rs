use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Markets the bot knows how to trade. The set is closed: a code outside it is
/// an `Error::UnknownEnumerant`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Market {
    XbtEur,
    XbtUsd,
    XbtUsdt,
    EthEur,
    EthUsd,
    LtcEur,
}

impl Market {
    pub const ALL: [Market; 6] = [
        Market::XbtEur,
        Market::XbtUsd,
        Market::XbtUsdt,
        Market::EthEur,
        Market::EthUsd,
        Market::LtcEur,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Market::XbtEur => "XBTEUR",
            Market::XbtUsd => "XBTUSD",
            Market::XbtUsdt => "XBTUSDT",
            Market::EthEur => "ETHEUR",
            Market::EthUsd => "ETHUSD",
            Market::LtcEur => "LTCEUR",
        }
    }
}

impl std::fmt::Display for Market {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Market {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Market::ALL
            .into_iter()
            .find(|m| m.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::unknown("market", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Xbt,
    Eth,
    Ltc,
    Eur,
    Usd,
    Usdt,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Xbt => "XBT",
            Currency::Eth => "ETH",
            Currency::Ltc => "LTC",
            Currency::Eur => "EUR",
            Currency::Usd => "USD",
            Currency::Usdt => "USDT",
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "XBT" => Ok(Currency::Xbt),
            "ETH" => Ok(Currency::Eth),
            "LTC" => Ok(Currency::Ltc),
            "EUR" => Ok(Currency::Eur),
            "USD" => Ok(Currency::Usd),
            "USDT" => Ok(Currency::Usdt),
            other => Err(Error::unknown("currency", other)),
        }
    }
}

/// Side of an order or position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn opposite(&self) -> OrderSide {
        match self {
            OrderSide::Buy => OrderSide::Sell,
            OrderSide::Sell => OrderSide::Buy,
        }
    }
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "buy"),
            OrderSide::Sell => write!(f, "sell"),
        }
    }
}

impl FromStr for OrderSide {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "buy" => Ok(OrderSide::Buy),
            "sell" => Ok(OrderSide::Sell),
            other => Err(Error::unknown("side", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderKind {
    Spot,
    Margin,
    Future,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PriceKind {
    Market,
    Limit,
    TakeProfit,
    TakeProfitLimit,
    StopLoss,
    StopLossLimit,
}

impl std::fmt::Display for PriceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PriceKind::Market => "market",
            PriceKind::Limit => "limit",
            PriceKind::TakeProfit => "take-profit",
            PriceKind::TakeProfitLimit => "take-profit-limit",
            PriceKind::StopLoss => "stop-loss",
            PriceKind::StopLossLimit => "stop-loss-limit",
        };
        f.write_str(s)
    }
}

/// Order lifecycle: `Created -> Open -> {Filled | Cancelled | Error}`.
/// Only `Created` is ever set here; later states belong to the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Created,
    Open,
    Filled,
    Cancelled,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionStatus {
    Open,
    Closed,
}

/// Candle bucket width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Timeframe {
    M1,
    M5,
    M15,
    H1,
}

impl Timeframe {
    pub fn minutes(&self) -> u32 {
        match self {
            Timeframe::M1 => 1,
            Timeframe::M5 => 5,
            Timeframe::M15 => 15,
            Timeframe::H1 => 60,
        }
    }

    pub fn from_minutes(minutes: u32) -> Option<Self> {
        match minutes {
            1 => Some(Timeframe::M1),
            5 => Some(Timeframe::M5),
            15 => Some(Timeframe::M15),
            60 => Some(Timeframe::H1),
            _ => None,
        }
    }

    /// How often a poller for this timeframe asks the exchange for data:
    /// half the bucket width.
    pub fn poll_period(&self) -> std::time::Duration {
        std::time::Duration::from_secs(u64::from(self.minutes()) * 30)
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}m", self.minutes())
    }
}

/// OHLC price summary for one time bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candle {
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl Candle {
    pub fn new(
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            open,
            high,
            low,
            close,
            timestamp,
        }
    }

    pub fn is_up(&self) -> bool {
        self.close > self.open
    }

    pub fn is_down(&self) -> bool {
        self.close < self.open
    }

    /// (open + high + low + close) / 4
    pub fn typical_price(&self) -> Decimal {
        (self.open + self.high + self.low + self.close) / Decimal::from(4)
    }
}

impl std::fmt::Display for Candle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({}) open {:.2}; high {:.2}; low {:.2}; close {:.2}",
            self.timestamp, self.open, self.high, self.low, self.close
        )
    }
}

/// An order produced by a strategy. Carries every field the persistence
/// layer needs to store and later reconcile it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    /// Exchange-assigned id, known only after placement.
    pub remote_id: Option<String>,
    pub side: OrderSide,
    pub kind: OrderKind,
    pub price_kind: PriceKind,
    pub volume: Decimal,
    pub limit_price: Option<Decimal>,
    /// Reference price at creation time, used for cost checks.
    pub market_price: Decimal,
    pub market: Market,
    pub status: OrderStatus,
    pub leverage: Decimal,
    pub reduce_only: bool,
    pub immediate_or_cancel: bool,
    pub post_only: bool,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn is_final(&self) -> bool {
        !matches!(self.status, OrderStatus::Created | OrderStatus::Open)
    }

    pub fn is_spot(&self) -> bool {
        self.kind == OrderKind::Spot
    }

    pub fn is_margin(&self) -> bool {
        self.kind == OrderKind::Margin
    }

    pub fn is_future(&self) -> bool {
        self.kind == OrderKind::Future
    }

    pub fn market_cost(&self) -> Decimal {
        self.market_price * self.volume
    }
}

impl std::fmt::Display for Order {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {}@{}",
            self.side, self.volume, self.market, self.market_price
        )
    }
}

/// Exchange-side position. Read-only input to strategies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: String,
    pub market: Market,
    pub side: OrderSide,
    pub size: Decimal,
    pub open_price: Decimal,
    pub close_price: Option<Decimal>,
    pub cost: Decimal,
    pub realized: Decimal,
    pub status: PositionStatus,
    pub leverage: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Position {
    pub fn is_open(&self) -> bool {
        self.status == PositionStatus::Open
    }
}

/// Account margin snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    /// Combined balance of all equity currencies.
    pub trade_balance: Decimal,
    /// Margin in use by open positions.
    pub initial_margin: Decimal,
    /// Equity minus margin in use.
    pub free_margin: Decimal,
    /// Trade balance plus unrealized P&L.
    pub equity: Decimal,
    /// (equity / margin) * 100
    pub margin_level: Decimal,
}
