use std::collections::VecDeque;

use rust_decimal::Decimal;

use common::Candle;

use crate::Reading;

/// Bounded rolling window of candles for one (market, timeframe).
///
/// Insertion order is arrival order. Once full, every append evicts the
/// oldest candle first, so the length never exceeds the capacity.
#[derive(Debug, Clone, PartialEq)]
pub struct CandleBuffer {
    candles: VecDeque<Candle>,
    capacity: usize,
}

impl CandleBuffer {
    pub const DEFAULT_CAPACITY: usize = 60;

    pub fn new(capacity: usize) -> Self {
        Self {
            candles: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn append(&mut self, candle: Candle) {
        if self.capacity == 0 {
            return;
        }
        if self.candles.len() >= self.capacity {
            self.candles.pop_front();
        }
        self.candles.push_back(candle);
    }

    /// The most recent `n` candles, oldest first.
    pub fn window(&self, n: usize) -> Reading<impl Iterator<Item = &Candle> + '_> {
        if n > self.candles.len() {
            return Reading::InsufficientData;
        }
        Reading::Value(self.candles.range(self.candles.len() - n..))
    }

    /// Closes of the most recent `n` candles, oldest first.
    pub fn closes(&self, n: usize) -> Reading<Vec<Decimal>> {
        self.window(n).map(|w| w.map(|c| c.close).collect())
    }

    /// Every buffered candle, oldest first.
    pub fn all(&self) -> impl ExactSizeIterator<Item = &Candle> + DoubleEndedIterator + '_ {
        self.candles.iter()
    }

    pub fn all_closes(&self) -> Vec<Decimal> {
        self.candles.iter().map(|c| c.close).collect()
    }

    pub fn first(&self) -> Option<&Candle> {
        self.candles.front()
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.back()
    }
}

impl Default for CandleBuffer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
