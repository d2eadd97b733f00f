use rust_decimal::{Decimal, MathematicalOps};

use crate::indicators::Sma;
use crate::{CandleBuffer, Reading};

/// Bollinger Bands around an SMA middle line.
///
/// The squared deviations are summed over the whole buffer, not just the
/// last `period` candles, and then divided by `period`. With a buffer longer
/// than `period` this widens the bands compared with the textbook formula.
#[derive(Debug, Clone, Copy)]
pub struct BollingerBands {
    pub period: usize,
    pub multiplier: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bands {
    pub upper: Decimal,
    pub middle: Decimal,
    pub lower: Decimal,
}

impl Bands {
    pub fn map(self, f: impl Fn(Decimal) -> Decimal) -> Self {
        Self {
            upper: f(self.upper),
            middle: f(self.middle),
            lower: f(self.lower),
        }
    }
}

impl BollingerBands {
    pub fn new(period: usize, multiplier: Decimal) -> Self {
        Self { period, multiplier }
    }

    pub fn compute(&self, buffer: &CandleBuffer) -> Reading<Bands> {
        Sma::new(self.period).compute(buffer).and_then(|middle| {
            let sum_sq_diff: Decimal = buffer
                .all()
                .map(|c| {
                    let diff = c.close - middle;
                    diff * diff
                })
                .sum();
            let variance = sum_sq_diff / Decimal::from(self.period);

            Reading::from(variance.sqrt()).map(|std_dev| Bands {
                upper: middle + self.multiplier * std_dev,
                middle,
                lower: middle - self.multiplier * std_dev,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::test_support::buffer_of;
    use rust_decimal_macros::dec;

    #[test]
    fn bands_of_linear_series() {
        let buffer = buffer_of(&[dec!(100), dec!(110), dec!(120), dec!(130), dec!(140)]);
        let bands = BollingerBands::new(5, dec!(2)).compute(&buffer).value().unwrap();
        assert_eq!(bands.middle, dec!(120));
        // variance 200 -> std dev sqrt(200)
        assert_eq!(bands.upper.round_dp(8), dec!(148.28427125));
        assert_eq!(bands.lower.round_dp(8), dec!(91.71572875));
    }

    #[test]
    fn variance_spans_the_whole_buffer() {
        // middle over the last 2 is 10, but the leading 20 still counts:
        // (10^2 + 0 + 0) / 2 = 50
        let buffer = buffer_of(&[dec!(20), dec!(10), dec!(10)]);
        let bands = BollingerBands::new(2, dec!(1)).compute(&buffer).value().unwrap();
        assert_eq!(bands.middle, dec!(10));
        assert_eq!((bands.upper - bands.middle).round_dp(6), dec!(7.071068));
    }

    #[test]
    fn flat_series_collapses_the_bands() {
        let buffer = buffer_of(&[dec!(50); 4]);
        let bands = BollingerBands::new(4, dec!(2)).compute(&buffer).value().unwrap();
        assert_eq!(bands.upper, dec!(50));
        assert_eq!(bands.lower, dec!(50));
    }

    #[test]
    fn bands_need_the_sma() {
        let buffer = buffer_of(&[dec!(100), dec!(110)]);
        assert!(BollingerBands::new(3, dec!(2)).compute(&buffer).is_insufficient());
    }
}
