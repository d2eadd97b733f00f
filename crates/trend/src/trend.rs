use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use common::precision::market_precision;
use common::{Candle, Market, Timeframe};

use crate::indicators::{Bands, BollingerBands, Macd, MacdLine, Rsi, Sma, Twap};
use crate::{CandleBuffer, Reading};

/// Handle shared by a market's pollers (writers) and its evaluator (reader).
pub type SharedTrend = Arc<RwLock<Trend>>;

/// Rolling candle history of one market across its tracked timeframes, and
/// the indicators derived from it.
///
/// Every indicator is rounded to the market precision, halves away from zero.
/// Timeframes that are not tracked simply have no data.
#[derive(Debug, Clone)]
pub struct Trend {
    market: Market,
    precision: u32,
    frames: BTreeMap<Timeframe, CandleBuffer>,
}

impl Trend {
    pub fn new(market: Market, precision: u32, capacity: usize, timeframes: &[Timeframe]) -> Self {
        Self {
            market,
            precision,
            frames: timeframes
                .iter()
                .map(|tf| (*tf, CandleBuffer::new(capacity)))
                .collect(),
        }
    }

    pub fn into_shared(self) -> SharedTrend {
        Arc::new(RwLock::new(self))
    }

    pub fn market(&self) -> Market {
        self.market
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }

    pub fn timeframes(&self) -> impl Iterator<Item = Timeframe> + '_ {
        self.frames.keys().copied()
    }

    /// Append a candle to a tracked timeframe. Returns `false` when the
    /// timeframe is not tracked.
    pub fn update(&mut self, timeframe: Timeframe, candle: Candle) -> bool {
        match self.frames.get_mut(&timeframe) {
            Some(buffer) => {
                buffer.append(candle);
                true
            }
            None => false,
        }
    }

    pub fn candles(&self, timeframe: Timeframe) -> Option<&CandleBuffer> {
        self.frames.get(&timeframe)
    }

    pub fn last_candle(&self, timeframe: Timeframe) -> Option<&Candle> {
        self.candles(timeframe).and_then(CandleBuffer::last)
    }

    pub fn twap(&self, timeframe: Timeframe) -> Reading<Decimal> {
        self.twap_at(timeframe, Utc::now())
    }

    pub fn twap_at(&self, timeframe: Timeframe, now: DateTime<Utc>) -> Reading<Decimal> {
        self.with_buffer(timeframe, |b| Twap::at(now).compute(b))
            .map(|v| self.round(v))
    }

    pub fn sma(&self, timeframe: Timeframe, period: usize) -> Reading<Decimal> {
        self.with_buffer(timeframe, |b| Sma::new(period).compute(b))
            .map(|v| self.round(v))
    }

    pub fn rsi(&self, timeframe: Timeframe, period: usize) -> Reading<Decimal> {
        self.with_buffer(timeframe, |b| Rsi::new(period).compute(b))
            .map(|v| self.round(v))
    }

    pub fn bollinger(
        &self,
        timeframe: Timeframe,
        period: usize,
        multiplier: Decimal,
    ) -> Reading<Bands> {
        self.with_buffer(timeframe, |b| BollingerBands::new(period, multiplier).compute(b))
            .map(|bands| bands.map(|v| self.round(v)))
    }

    pub fn macd(
        &self,
        timeframe: Timeframe,
        fast: usize,
        slow: usize,
        signal: usize,
    ) -> Reading<MacdLine> {
        self.with_buffer(timeframe, |b| Macd::new(fast, slow, signal).compute(b))
            .map(|line| MacdLine {
                macd: self.round(line.macd),
                signal: self.round(line.signal),
            })
    }

    fn with_buffer<T>(
        &self,
        timeframe: Timeframe,
        f: impl FnOnce(&CandleBuffer) -> Reading<T>,
    ) -> Reading<T> {
        match self.candles(timeframe) {
            Some(buffer) => f(buffer),
            None => Reading::InsufficientData,
        }
    }

    fn round(&self, value: Decimal) -> Decimal {
        market_precision(value, self.precision)
    }
}
