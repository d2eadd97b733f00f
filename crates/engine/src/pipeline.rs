use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use common::{Candle, Config, ExchangeClient, Market, Order, Result, Timeframe};
use strategy::Strategy;
use trend::{SharedTrend, Trend};

use crate::{OrderDispatcher, PollingWorker, Shutdown, StrategyEvaluator};

/// Shape shared by every market pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    pub timeframes: Vec<Timeframe>,
    pub trigger: Timeframe,
    pub buffer_capacity: usize,
    pub channel_capacity: usize,
}

impl PipelineSettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            timeframes: cfg.timeframes.clone(),
            trigger: cfg.trigger_timeframe,
            buffer_capacity: cfg.buffer_capacity,
            channel_capacity: cfg.channel_capacity,
        }
    }
}

/// One market's stages: a poller per tracked timeframe, an evaluator and a
/// dispatcher, joined by bounded channels (candles, then orders).
pub struct MarketPipeline {
    market: Market,
    trend: SharedTrend,
    strategy: Box<dyn Strategy>,
}

impl MarketPipeline {
    pub fn new(strategy: Box<dyn Strategy>, precision: u32, settings: &PipelineSettings) -> Self {
        let market = strategy.market();
        let trend = Trend::new(
            market,
            precision,
            settings.buffer_capacity,
            &settings.timeframes,
        );
        Self {
            market,
            trend: trend.into_shared(),
            strategy,
        }
    }

    pub fn market(&self) -> Market {
        self.market
    }

    pub fn trend(&self) -> SharedTrend {
        self.trend.clone()
    }

    /// Spawn every stage into `tasks`.
    pub fn spawn(
        self,
        client: &Arc<dyn ExchangeClient>,
        settings: &PipelineSettings,
        tasks: &mut JoinSet<Result<()>>,
        shutdown: &Shutdown,
    ) {
        let (candle_tx, candle_rx) = mpsc::channel::<Candle>(settings.channel_capacity);
        let (order_tx, order_rx) = mpsc::channel::<Order>(settings.channel_capacity);

        for &timeframe in &settings.timeframes {
            let mut worker =
                PollingWorker::new(self.market, timeframe, client.clone(), self.trend.clone());
            if timeframe == settings.trigger {
                worker = worker.publishing(candle_tx.clone());
            }
            tasks.spawn(worker.run(shutdown.clone()));
        }
        // Only the trigger poller holds a sender, so the evaluator sees the
        // stream close once that poller stops.
        drop(candle_tx);

        let evaluator = StrategyEvaluator::new(
            self.strategy,
            client.clone(),
            self.trend,
            candle_rx,
            order_tx,
        );
        tasks.spawn(evaluator.run(shutdown.clone()));

        let dispatcher = OrderDispatcher::new(self.market, client.clone(), order_rx);
        tasks.spawn(dispatcher.run(shutdown.clone()));
    }
}
