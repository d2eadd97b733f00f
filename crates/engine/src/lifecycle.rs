use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{error, info};

use common::{Error, ExchangeClient, Market, Result};
use strategy::Strategy;
use trend::SharedTrend;

use crate::{MarketPipeline, PipelineSettings, Shutdown};

/// Owns every market pipeline and supervises their tasks.
pub struct Engine {
    client: Arc<dyn ExchangeClient>,
    settings: PipelineSettings,
    pipelines: Vec<MarketPipeline>,
}

impl Engine {
    pub fn new(client: Arc<dyn ExchangeClient>, settings: PipelineSettings) -> Self {
        Self {
            client,
            settings,
            pipelines: Vec::new(),
        }
    }

    /// Register a market traded by `strategy`. Returns the market's trend
    /// handle. A market added twice is a configuration error.
    pub fn add_market(
        &mut self,
        strategy: Box<dyn Strategy>,
        precision: u32,
    ) -> Result<SharedTrend> {
        let market = strategy.market();
        if self.pipelines.iter().any(|p| p.market() == market) {
            return Err(Error::Config(format!("market {market} configured twice")));
        }
        let pipeline = MarketPipeline::new(strategy, precision, &self.settings);
        let trend = pipeline.trend();
        self.pipelines.push(pipeline);
        Ok(trend)
    }

    pub fn markets(&self) -> impl Iterator<Item = Market> + '_ {
        self.pipelines.iter().map(MarketPipeline::market)
    }

    /// Run every pipeline until `shutdown` is triggered or a stage fails
    /// fatally. Returns the first fatal error after all stages have stopped.
    pub async fn run(self, shutdown: Shutdown) -> Result<()> {
        if self.pipelines.is_empty() {
            return Err(Error::Config("no markets to run".into()));
        }

        let mut tasks = JoinSet::new();
        for pipeline in self.pipelines {
            info!(
                market = %pipeline.market(),
                trigger = %self.settings.trigger,
                "Starting market pipeline"
            );
            pipeline.spawn(&self.client, &self.settings, &mut tasks, &shutdown);
        }
        info!(tasks = tasks.len(), "Engine running");

        let mut first_error = None;
        while let Some(joined) = tasks.join_next().await {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(e) => Err(Error::Other(format!("pipeline task failed: {e}"))),
            };
            if let Err(e) = outcome {
                error!(error = %e, "Pipeline stage stopped with an error");
                shutdown.trigger();
                first_error.get_or_insert(e);
            }
        }

        info!("Engine stopped");
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
