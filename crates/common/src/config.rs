use std::str::FromStr;

use rust_decimal::Decimal;

use crate::{Error, Market, Result, Timeframe};

/// All configuration loaded from environment variables at startup.
///
/// Constructed once in `main` and handed to every component that needs it;
/// nothing reads the environment after this.
#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,

    /// Simulate orders, balance and positions instead of trading live.
    pub development_mode: bool,

    // Exchange credentials
    pub kraken_api_key: String,
    pub kraken_secret: String,

    // Pipelines
    pub markets: Vec<Market>,
    pub timeframes: Vec<Timeframe>,
    /// Capacity of every per-timeframe candle buffer.
    pub buffer_capacity: usize,
    /// Timeframe whose new candles drive strategy evaluation.
    pub trigger_timeframe: Timeframe,
    /// Bound of every inter-stage channel.
    pub channel_capacity: usize,

    // Strategy
    pub strategy: String,
    pub strategy_config_path: Option<String>,

    /// Starting equity of the paper account.
    pub paper_balance: Decimal,
    /// Slippage applied to paper fills, in basis points.
    pub paper_slippage_bps: Decimal,
}

impl Config {
    /// Load configuration from the process environment.
    /// Loads `.env` if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // ignore error if .env not present
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let development_mode =
            parse_value::<bool>("DEVELOPMENT_MODE", &var("DEVELOPMENT_MODE", "false"))?;
        let kraken_api_key = var("KRAKEN_API_KEY", "");
        let kraken_secret = var("KRAKEN_SECRET", "");
        if !development_mode && (kraken_api_key.is_empty() || kraken_secret.is_empty()) {
            return Err(Error::Config(
                "KRAKEN_API_KEY and KRAKEN_SECRET are required unless DEVELOPMENT_MODE=true".into(),
            ));
        }

        let markets = var("MARKETS", "XBTEUR")
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(Market::from_str)
            .collect::<Result<Vec<_>>>()?;
        if markets.is_empty() {
            return Err(Error::Config("MARKETS must name at least one market".into()));
        }

        let timeframes = parse_timeframes(&var("OHLC_INTERVALS", "1,60"))?;
        let trigger_timeframe = parse_timeframe(&var("STRATEGY_INTERVAL_CHECK", "1"))?;
        if !timeframes.contains(&trigger_timeframe) {
            return Err(Error::Config(format!(
                "STRATEGY_INTERVAL_CHECK {trigger_timeframe} is not one of the tracked timeframes"
            )));
        }

        let buffer_capacity = parse_value::<usize>("OHLC_SIZE", &var("OHLC_SIZE", "60"))?;
        let channel_capacity =
            parse_value::<usize>("CHANNEL_CAPACITY", &var("CHANNEL_CAPACITY", "64"))?;
        if buffer_capacity == 0 || channel_capacity == 0 {
            return Err(Error::Config("OHLC_SIZE and CHANNEL_CAPACITY must be positive".into()));
        }

        Ok(Config {
            log_level: var("LOG_LEVEL", "info"),
            development_mode,
            kraken_api_key,
            kraken_secret,
            markets,
            timeframes,
            buffer_capacity,
            trigger_timeframe,
            channel_capacity,
            strategy: var("STRATEGY", "twap"),
            strategy_config_path: lookup("STRATEGY_CONFIG_PATH").filter(|p| !p.is_empty()),
            paper_balance: parse_value::<Decimal>("PAPER_BALANCE", &var("PAPER_BALANCE", "10000"))?,
            paper_slippage_bps: parse_value::<Decimal>(
                "PAPER_SLIPPAGE_BPS",
                &var("PAPER_SLIPPAGE_BPS", "0"),
            )?,
        })
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| Error::Config(format!("{key} has an invalid value: '{raw}'")))
}

fn parse_timeframe(raw: &str) -> Result<Timeframe> {
    let minutes = parse_value::<u32>("timeframe", raw)?;
    Timeframe::from_minutes(minutes)
        .ok_or_else(|| Error::Config(format!("unsupported timeframe: {minutes} minutes")))
}

/// Accepts `,`, `-` or `#` between entries; duplicates are dropped.
fn parse_timeframes(raw: &str) -> Result<Vec<Timeframe>> {
    let mut timeframes = Vec::new();
    for part in raw.split([',', '-', '#']).filter(|s| !s.trim().is_empty()) {
        let tf = parse_timeframe(part)?;
        if !timeframes.contains(&tf) {
            timeframes.push(tf);
        }
    }
    if timeframes.is_empty() {
        return Err(Error::Config("OHLC_INTERVALS must name at least one timeframe".into()));
    }
    Ok(timeframes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_in_development_mode() {
        let cfg = load(&[("DEVELOPMENT_MODE", "true")]).unwrap();
        assert_eq!(cfg.markets, vec![Market::XbtEur]);
        assert_eq!(cfg.timeframes, vec![Timeframe::M1, Timeframe::H1]);
        assert_eq!(cfg.trigger_timeframe, Timeframe::M1);
        assert_eq!(cfg.buffer_capacity, 60);
        assert_eq!(cfg.strategy, "twap");
        assert!(cfg.strategy_config_path.is_none());
        assert_eq!(cfg.paper_balance, Decimal::from(10_000));
        assert!(cfg.paper_slippage_bps.is_zero());
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn live_mode_requires_credentials() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let cfg = load(&[("KRAKEN_API_KEY", "key"), ("KRAKEN_SECRET", "c2VjcmV0")]).unwrap();
        assert!(!cfg.development_mode);
    }

    #[test]
    fn intervals_accept_any_separator() {
        let cfg = load(&[
            ("DEVELOPMENT_MODE", "true"),
            ("OHLC_INTERVALS", "1#5-15,60,5"),
            ("STRATEGY_INTERVAL_CHECK", "15"),
        ])
        .unwrap();
        assert_eq!(
            cfg.timeframes,
            vec![Timeframe::M1, Timeframe::M5, Timeframe::M15, Timeframe::H1]
        );
        assert_eq!(cfg.trigger_timeframe, Timeframe::M15);
    }

    #[test]
    fn trigger_must_be_tracked() {
        let err = load(&[
            ("DEVELOPMENT_MODE", "true"),
            ("OHLC_INTERVALS", "5,60"),
            ("STRATEGY_INTERVAL_CHECK", "1"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("STRATEGY_INTERVAL_CHECK"));
    }

    #[test]
    fn unknown_market_is_fatal() {
        let err =
            load(&[("DEVELOPMENT_MODE", "true"), ("MARKETS", "XBTEUR,DOGEEUR")]).unwrap_err();
        assert!(matches!(err, Error::UnknownEnumerant { kind: "market", .. }));
    }

    #[test]
    fn unsupported_timeframe_is_rejected() {
        let err = load(&[("DEVELOPMENT_MODE", "true"), ("OHLC_INTERVALS", "1,30")]).unwrap_err();
        assert!(err.to_string().contains("30 minutes"));
    }
}
