use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use common::{ExchangeClient, Market, Order, Result};

use crate::Shutdown;

/// Submits a market's orders to the exchange, one at a time, in stream order.
///
/// This is the only component that calls `ExchangeClient::place_order`.
/// A failed submission is logged and the order dropped.
pub struct OrderDispatcher {
    market: Market,
    client: Arc<dyn ExchangeClient>,
    order_rx: mpsc::Receiver<Order>,
}

impl OrderDispatcher {
    pub fn new(
        market: Market,
        client: Arc<dyn ExchangeClient>,
        order_rx: mpsc::Receiver<Order>,
    ) -> Self {
        Self {
            market,
            client,
            order_rx,
        }
    }

    pub async fn run(mut self, shutdown: Shutdown) -> Result<()> {
        info!(market = %self.market, "Order dispatcher started");

        loop {
            let order = match shutdown.guard(self.order_rx.recv()).await {
                Some(Some(order)) => order,
                Some(None) => {
                    info!(market = %self.market, "Order stream closed");
                    break;
                }
                None => break,
            };

            info!(market = %self.market, order = %order, "Placing order");
            match shutdown.guard(self.client.place_order(&order)).await {
                Some(Ok(ack)) => {
                    info!(market = %self.market, order_id = %ack.order_id, remote_ids = ?ack.remote_ids, "Order accepted");
                }
                Some(Err(e)) if e.is_fatal() => {
                    error!(market = %self.market, order_id = %order.id, error = %e, "Fatal error placing order");
                    shutdown.trigger();
                    return Err(e);
                }
                Some(Err(e)) => {
                    warn!(market = %self.market, order_id = %order.id, error = %e, "Order submission failed, dropping order");
                }
                None => break,
            }
        }

        info!(market = %self.market, "Order dispatcher stopped");
        Ok(())
    }
}
