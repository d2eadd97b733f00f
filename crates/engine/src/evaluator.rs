use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use common::{Candle, ExchangeClient, Market, Order, Result};
use strategy::Strategy;
use trend::SharedTrend;

use crate::Shutdown;

/// Runs the market's strategy once per trigger candle.
///
/// Each cycle fetches balance and open positions, then asks the strategy to
/// close and then to open. A close order always goes out before an open
/// order from the same cycle.
pub struct StrategyEvaluator {
    market: Market,
    strategy: Box<dyn Strategy>,
    client: Arc<dyn ExchangeClient>,
    trend: SharedTrend,
    candle_rx: mpsc::Receiver<Candle>,
    order_tx: mpsc::Sender<Order>,
}

impl StrategyEvaluator {
    pub fn new(
        strategy: Box<dyn Strategy>,
        client: Arc<dyn ExchangeClient>,
        trend: SharedTrend,
        candle_rx: mpsc::Receiver<Candle>,
        order_tx: mpsc::Sender<Order>,
    ) -> Self {
        Self {
            market: strategy.market(),
            strategy,
            client,
            trend,
            candle_rx,
            order_tx,
        }
    }

    pub async fn run(mut self, shutdown: Shutdown) -> Result<()> {
        info!(market = %self.market, strategy = %self.strategy.name(), "Strategy evaluator started");

        'cycles: loop {
            let candle = match shutdown.guard(self.candle_rx.recv()).await {
                Some(Some(candle)) => candle,
                Some(None) => {
                    info!(market = %self.market, "Candle stream closed");
                    break;
                }
                None => break,
            };

            let orders = match shutdown.guard(self.evaluate(&candle)).await {
                Some(Ok(orders)) => orders,
                Some(Err(e)) if e.is_fatal() => {
                    error!(market = %self.market, error = %e, "Fatal error during evaluation");
                    shutdown.trigger();
                    return Err(e);
                }
                Some(Err(e)) => {
                    warn!(market = %self.market, error = %e, "Account fetch failed, skipping cycle");
                    continue;
                }
                None => break,
            };

            for order in orders {
                info!(market = %self.market, order = %order, "Order signalled");
                match shutdown.guard(self.order_tx.send(order)).await {
                    Some(Ok(())) => {}
                    Some(Err(_)) => {
                        info!(market = %self.market, "Order stream closed");
                        break 'cycles;
                    }
                    None => break 'cycles,
                }
            }
        }

        info!(market = %self.market, "Strategy evaluator stopped");
        Ok(())
    }

    /// One cycle: close first, then open, against one consistent trend snapshot.
    async fn evaluate(&self, candle: &Candle) -> Result<Vec<Order>> {
        let balance = self.client.fetch_balance().await?;
        let positions = self.client.fetch_open_positions(self.market).await?;

        let trend = self.trend.read().await;
        let mut orders = Vec::with_capacity(2);
        if let Some(order) = self.strategy.close(&trend, candle, &positions) {
            orders.push(order);
        }
        if let Some(order) = self.strategy.open(&trend, candle, &balance, &positions) {
            orders.push(order);
        }
        debug!(market = %self.market, candle = %candle, orders = orders.len(), "Cycle evaluated");
        Ok(orders)
    }
}
