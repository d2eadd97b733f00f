use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use tracing::{debug, info};

use common::{
    Balance, Candle, Error, ExchangeClient, Market, MarketRegistry, Order, OrderAck, OrderSide,
    Position, PositionStatus, Result, Timeframe,
};

/// Simulated exchange client for development mode.
///
/// Candles, metadata and leverage come from the wrapped client; orders,
/// balance and positions are simulated in memory. Fills happen at the
/// order's price with configurable slippage. Nothing is ever sent to the
/// exchange.
pub struct PaperClient {
    market_data: Arc<dyn ExchangeClient>,
    account: RwLock<Account>,
    /// Slippage in basis points applied to all fills.
    slippage_bps: Decimal,
}

#[derive(Debug, Default)]
struct Account {
    /// Starting balance plus realized P&L.
    cash: Decimal,
    positions: Vec<Position>,
    /// Latest close seen per market, used to mark positions.
    marks: HashMap<Market, Decimal>,
}

impl PaperClient {
    pub fn new(market_data: Arc<dyn ExchangeClient>, initial_balance: Decimal) -> Self {
        info!(balance = %initial_balance, "PaperClient initialized");
        Self {
            market_data,
            account: RwLock::new(Account {
                cash: initial_balance,
                ..Account::default()
            }),
            slippage_bps: Decimal::ZERO,
        }
    }

    pub fn with_slippage_bps(mut self, bps: Decimal) -> Self {
        self.slippage_bps = bps;
        self
    }

    /// Buys pay more, sells receive less.
    fn fill_price(&self, order: &Order) -> Decimal {
        let price = order.limit_price.unwrap_or(order.market_price);
        let slip = self.slippage_bps / Decimal::from(10_000);
        match order.side {
            OrderSide::Buy => price * (Decimal::ONE + slip),
            OrderSide::Sell => price * (Decimal::ONE - slip),
        }
    }
}

fn direction(side: OrderSide) -> Decimal {
    match side {
        OrderSide::Buy => Decimal::ONE,
        OrderSide::Sell => Decimal::NEGATIVE_ONE,
    }
}

fn margin_of(position: &Position) -> Decimal {
    if position.leverage > Decimal::ONE {
        position.cost / position.leverage
    } else {
        position.cost
    }
}

impl Account {
    fn unrealized(&self) -> Decimal {
        self.positions
            .iter()
            .map(|p| {
                let mark = self.marks.get(&p.market).copied().unwrap_or(p.open_price);
                (mark - p.open_price) * p.size * direction(p.side)
            })
            .sum()
    }

    fn balance(&self) -> Balance {
        let initial_margin: Decimal = self.positions.iter().map(margin_of).sum();
        let equity = self.cash + self.unrealized();
        let margin_level = if initial_margin.is_zero() {
            Decimal::ZERO
        } else {
            equity / initial_margin * Decimal::ONE_HUNDRED
        };
        Balance {
            trade_balance: self.cash,
            initial_margin,
            free_margin: equity - initial_margin,
            equity,
            margin_level,
        }
    }

    fn open(&mut self, order: &Order, price: Decimal) -> Result<Position> {
        let position = Position {
            id: uuid::Uuid::new_v4().to_string(),
            market: order.market,
            side: order.side,
            size: order.volume,
            open_price: price,
            close_price: None,
            cost: price * order.volume,
            realized: Decimal::ZERO,
            status: PositionStatus::Open,
            leverage: order.leverage,
            created_at: Utc::now(),
        };
        let required = margin_of(&position);
        let free = self.balance().free_margin;
        if required > free {
            return Err(Error::Exchange(format!(
                "insufficient margin: {required} required, {free} free"
            )));
        }
        self.positions.push(position.clone());
        Ok(position)
    }

    /// Reduce the oldest opposite position on the order's market.
    fn reduce(&mut self, order: &Order, price: Decimal) -> Result<Position> {
        let idx = self
            .positions
            .iter()
            .position(|p| p.market == order.market && p.side == order.side.opposite())
            .ok_or_else(|| {
                Error::Exchange(format!("no open {} position to reduce", order.market))
            })?;

        let position = &mut self.positions[idx];
        let volume = order.volume.min(position.size);
        let pnl = (price - position.open_price) * volume * direction(position.side);
        let open_cost = position.open_price * volume;

        position.size -= volume;
        position.cost -= open_cost;
        position.realized += pnl;
        self.cash += pnl;

        let mut snapshot = position.clone();
        if position.size.is_zero() {
            snapshot.status = PositionStatus::Closed;
            snapshot.close_price = Some(price);
            self.positions.remove(idx);
        }
        Ok(snapshot)
    }
}

#[async_trait]
impl ExchangeClient for PaperClient {
    async fn fetch_candles(&self, market: Market, timeframe: Timeframe) -> Result<Vec<Candle>> {
        let candles = self.market_data.fetch_candles(market, timeframe).await?;
        if let Some(last) = candles.last() {
            self.account.write().await.marks.insert(market, last.close);
        }
        Ok(candles)
    }

    async fn place_order(&self, order: &Order) -> Result<OrderAck> {
        let price = self.fill_price(order);
        let mut account = self.account.write().await;
        let position = if order.reduce_only {
            account.reduce(order, price)?
        } else {
            account.open(order, price)?
        };

        debug!(
            market = %order.market,
            side = %order.side,
            fill = %price,
            volume = %order.volume,
            position = %position.id,
            realized = %position.realized,
            "Paper fill simulated"
        );

        Ok(OrderAck {
            order_id: order.id.clone(),
            remote_ids: vec![position.id],
        })
    }

    async fn fetch_balance(&self) -> Result<Balance> {
        Ok(self.account.read().await.balance())
    }

    async fn fetch_open_positions(&self, market: Market) -> Result<Vec<Position>> {
        Ok(self
            .account
            .read()
            .await
            .positions
            .iter()
            .filter(|p| p.market == market)
            .cloned()
            .collect())
    }

    async fn fetch_market_metadata(&self, markets: &[Market]) -> Result<MarketRegistry> {
        self.market_data.fetch_market_metadata(markets).await
    }

    fn leverage_for(&self, market: Market) -> Decimal {
        self.market_data.leverage_for(market)
    }
}
