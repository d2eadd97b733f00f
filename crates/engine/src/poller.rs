use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use common::{Candle, ExchangeClient, Market, Result, Timeframe};
use trend::SharedTrend;

use crate::Shutdown;

/// Keeps one timeframe of a market's trend up to date.
///
/// Fetches immediately, then every `timeframe.poll_period()`. The newest
/// candle of each fetch is appended unless its timestamp matches the last
/// buffered one. The poller bound to the trigger timeframe also publishes
/// every appended candle to the evaluator.
pub struct PollingWorker {
    market: Market,
    timeframe: Timeframe,
    client: Arc<dyn ExchangeClient>,
    trend: SharedTrend,
    candle_tx: Option<mpsc::Sender<Candle>>,
}

impl PollingWorker {
    pub fn new(
        market: Market,
        timeframe: Timeframe,
        client: Arc<dyn ExchangeClient>,
        trend: SharedTrend,
    ) -> Self {
        Self {
            market,
            timeframe,
            client,
            trend,
            candle_tx: None,
        }
    }

    /// Publish appended candles on `tx`.
    pub fn publishing(mut self, tx: mpsc::Sender<Candle>) -> Self {
        self.candle_tx = Some(tx);
        self
    }

    /// Run until shutdown. Transient fetch errors skip the tick; a fatal one
    /// triggers shutdown and is returned.
    pub async fn run(self, shutdown: Shutdown) -> Result<()> {
        info!(
            market = %self.market,
            timeframe = %self.timeframe,
            trigger = self.candle_tx.is_some(),
            "Polling worker started"
        );

        if shutdown.guard(self.warm_up()).await.is_none() {
            return Ok(());
        }

        let mut ticker = interval(self.timeframe.poll_period());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if shutdown.guard(ticker.tick()).await.is_none() {
                break;
            }

            let fetched = match shutdown
                .guard(self.client.fetch_candles(self.market, self.timeframe))
                .await
            {
                Some(fetched) => fetched,
                None => break,
            };

            let candles = match fetched {
                Ok(candles) => candles,
                Err(e) if e.is_fatal() => {
                    error!(market = %self.market, timeframe = %self.timeframe, error = %e, "Fatal error fetching candles");
                    shutdown.trigger();
                    return Err(e);
                }
                Err(e) => {
                    warn!(market = %self.market, timeframe = %self.timeframe, error = %e, "Candle fetch failed, skipping tick");
                    continue;
                }
            };

            let Some(candle) = self.apply(candles).await else {
                continue;
            };

            if let Some(tx) = &self.candle_tx {
                match shutdown.guard(tx.send(candle)).await {
                    Some(Ok(())) => {}
                    Some(Err(_)) => {
                        info!(market = %self.market, "Candle stream closed");
                        break;
                    }
                    None => break,
                }
            }
        }

        info!(market = %self.market, timeframe = %self.timeframe, "Polling worker stopped");
        Ok(())
    }

    /// Seed the buffer with the fetched history minus its newest candle, so
    /// the first tick appends (and publishes) that one.
    async fn warm_up(&self) {
        let candles = match self.client.fetch_candles(self.market, self.timeframe).await {
            Ok(candles) => candles,
            Err(e) => {
                warn!(market = %self.market, timeframe = %self.timeframe, error = %e, "Warm-up fetch failed, starting empty");
                return;
            }
        };

        let mut trend = self.trend.write().await;
        let Some(capacity) = trend.candles(self.timeframe).map(|b| b.capacity()) else {
            return;
        };
        let history = &candles[..candles.len().saturating_sub(1)];
        let keep = capacity.saturating_sub(1).min(history.len());
        for candle in &history[history.len() - keep..] {
            trend.update(self.timeframe, *candle);
        }
        debug!(market = %self.market, timeframe = %self.timeframe, candles = keep, "Buffer warmed up");
    }

    /// Append the newest fetched candle unless it is already buffered.
    /// Returns the appended candle.
    async fn apply(&self, candles: Vec<Candle>) -> Option<Candle> {
        let newest = *candles.last()?;

        let mut trend = self.trend.write().await;
        let last = trend.last_candle(self.timeframe).map(|c| c.timestamp);
        if last == Some(newest.timestamp) {
            debug!(market = %self.market, timeframe = %self.timeframe, "No new candle");
            return None;
        }
        trend.update(self.timeframe, newest);
        debug!(market = %self.market, timeframe = %self.timeframe, candle = %newest, "Candle appended");
        Some(newest)
    }
}
