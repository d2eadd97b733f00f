use rust_decimal::Decimal;

use crate::{CandleBuffer, Reading};

/// Relative Strength Index over the last `period` close-to-close changes.
///
/// Plain averages (no Wilder smoothing). When the average loss is zero it is
/// replaced by one to avoid dividing by zero, so a pure uptrend does not
/// pin the result to 100.
#[derive(Debug, Clone, Copy)]
pub struct Rsi {
    pub period: usize,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    /// Needs `period + 1` candles.
    pub fn compute(&self, buffer: &CandleBuffer) -> Reading<Decimal> {
        if self.period == 0 {
            return Reading::InsufficientData;
        }
        buffer.closes(self.period + 1).map(|closes| {
            let (gains, losses) = closes.windows(2).map(|w| w[1] - w[0]).fold(
                (Decimal::ZERO, Decimal::ZERO),
                |(gains, losses), change| {
                    if change > Decimal::ZERO {
                        (gains + change, losses)
                    } else {
                        (gains, losses + change.abs())
                    }
                },
            );

            let period = Decimal::from(self.period);
            let average_gain = gains / period;
            let mut average_loss = losses / period;
            if average_loss.is_zero() {
                average_loss = Decimal::ONE;
            }

            let rs = average_gain / average_loss;
            Decimal::ONE_HUNDRED - Decimal::ONE_HUNDRED / (Decimal::ONE + rs)
        })
    }
}
