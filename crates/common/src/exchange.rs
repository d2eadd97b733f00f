use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::{Balance, Candle, Market, MarketRegistry, Order, Position, Result, Timeframe};

/// Acknowledgement of an accepted order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderAck {
    pub order_id: String,
    /// Ids the exchange assigned to the placed order.
    pub remote_ids: Vec<String>,
}

/// Abstraction over the exchange connection.
///
/// `KrakenClient` implements this for live trading.
/// `PaperClient` implements this for development mode.
///
/// Pipelines only ever hold an `Arc<dyn ExchangeClient>`; wire formats,
/// authentication and rate limits stay behind this trait.
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    /// Latest candle series for a market, ascending by time.
    async fn fetch_candles(&self, market: Market, timeframe: Timeframe) -> Result<Vec<Candle>>;

    /// Submit an order.
    async fn place_order(&self, order: &Order) -> Result<OrderAck>;

    /// Current account margin snapshot.
    async fn fetch_balance(&self) -> Result<Balance>;

    /// Open positions for one market.
    async fn fetch_open_positions(&self, market: Market) -> Result<Vec<Position>>;

    /// Discover precision and minimums for the given markets.
    async fn fetch_market_metadata(&self, markets: &[Market]) -> Result<MarketRegistry>;

    /// Leverage applied to margin orders on a market.
    fn leverage_for(&self, market: Market) -> Decimal;
}
