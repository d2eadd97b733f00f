use rust_decimal::Decimal;

use crate::{CandleBuffer, Reading};

/// Moving Average Convergence/Divergence.
///
/// Both EMAs are seeded with the oldest buffered close and folded forward
/// over the whole buffer. The signal line is the MACD scalar folded with
/// itself `signal - 1` times using the signal smoothing factor. That is not
/// an EMA over a MACD series: it always lands on the MACD value itself, so
/// the histogram (macd - signal) stays at zero up to rounding.
#[derive(Debug, Clone, Copy)]
pub struct Macd {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacdLine {
    pub macd: Decimal,
    pub signal: Decimal,
}

impl MacdLine {
    pub fn histogram(&self) -> Decimal {
        self.macd - self.signal
    }
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        Self { fast, slow, signal }
    }

    /// Needs at least `slow` candles.
    pub fn compute(&self, buffer: &CandleBuffer) -> Reading<MacdLine> {
        if self.fast == 0 || self.slow == 0 || self.signal == 0 {
            return Reading::InsufficientData;
        }
        if buffer.len() < self.slow {
            return Reading::InsufficientData;
        }

        let closes = buffer.all_closes();
        let macd = ema(&closes, self.fast) - ema(&closes, self.slow);

        let k = smoothing(self.signal);
        let signal = (1..self.signal).fold(macd, |signal, _| {
            macd * k + signal * (Decimal::ONE - k)
        });

        Reading::Value(MacdLine { macd, signal })
    }
}

/// k = 2 / (period + 1)
fn smoothing(period: usize) -> Decimal {
    Decimal::TWO / Decimal::from(period + 1)
}

/// EMA seeded with the first value. `closes` must not be empty.
fn ema(closes: &[Decimal], period: usize) -> Decimal {
    let k = smoothing(period);
    closes[1..]
        .iter()
        .fold(closes[0], |ema, close| close * k + ema * (Decimal::ONE - k))
}
