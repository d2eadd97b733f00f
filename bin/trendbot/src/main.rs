use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use common::{Config, ExchangeClient};
use engine::{Engine, KrakenClient, PipelineSettings, Shutdown};
use paper::PaperClient;
use strategy::{StrategyContext, StrategyParams, StrategyRegistry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env().context("failed to load configuration")?;

    // ── Logging ──────────────────────────────────────────────────────────────
    let rust_log = std::env::var("RUST_LOG").ok();
    let filter = log_filter(rust_log.as_deref(), &cfg.log_level)?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!(
        markets = ?cfg.markets,
        timeframes = ?cfg.timeframes,
        trigger = %cfg.trigger_timeframe,
        strategy = %cfg.strategy,
        development_mode = cfg.development_mode,
        log_level = %cfg.log_level,
        "Trendbot starting"
    );

    // ── Exchange client (paper in development mode) ───────────────────────────
    let kraken = KrakenClient::new(&cfg.kraken_api_key, &cfg.kraken_secret)?;
    let client: Arc<dyn ExchangeClient> = if cfg.development_mode {
        info!(
            balance = %cfg.paper_balance,
            slippage_bps = %cfg.paper_slippage_bps,
            "Development mode, using PaperClient"
        );
        Arc::new(
            PaperClient::new(Arc::new(kraken), cfg.paper_balance)
                .with_slippage_bps(cfg.paper_slippage_bps),
        )
    } else {
        info!("Live trading, using KrakenClient");
        Arc::new(kraken)
    };

    // ── Market metadata ───────────────────────────────────────────────────────
    let metadata = client
        .fetch_market_metadata(&cfg.markets)
        .await
        .context("failed to fetch market metadata")?;
    info!(%metadata, "Market metadata loaded");

    // ── Strategies and pipelines ─────────────────────────────────────────────
    let params = StrategyParams::load(cfg.strategy_config_path.as_deref())?;
    let strategies = StrategyRegistry::new(params);
    let mut engine = Engine::new(client.clone(), PipelineSettings::from_config(&cfg));

    for &market in &cfg.markets {
        let market_metadata = metadata.require(market)?.clone();
        let precision = market_metadata.precision;
        let ctx = StrategyContext {
            market,
            metadata: market_metadata,
            leverage: client.leverage_for(market),
            timeframe: cfg.trigger_timeframe,
        };
        let strategy = strategies.build(&cfg.strategy, ctx)?;
        engine.add_market(strategy, precision)?;
    }

    // ── Shutdown on Ctrl-C ────────────────────────────────────────────────────
    let shutdown = Shutdown::new();
    let on_ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            return;
        }
        info!("Shutdown signal received");
        on_ctrl_c.trigger();
    });

    engine.run(shutdown).await?;
    info!("Trendbot stopped");
    Ok(())
}

/// `RUST_LOG` wins over `LOG_LEVEL` when it parses.
fn log_filter(rust_log: Option<&str>, log_level: &str) -> anyhow::Result<EnvFilter> {
    if let Some(filter) = rust_log.and_then(|directives| EnvFilter::try_new(directives).ok()) {
        return Ok(filter);
    }
    EnvFilter::try_new(log_level).with_context(|| format!("invalid LOG_LEVEL '{log_level}'"))
}
