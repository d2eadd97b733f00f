use rust_decimal::Decimal;

use crate::{CandleBuffer, Reading};

/// Simple moving average of the last `period` closes.
#[derive(Debug, Clone, Copy)]
pub struct Sma {
    pub period: usize,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    /// A zero period never yields a value.
    pub fn compute(&self, buffer: &CandleBuffer) -> Reading<Decimal> {
        if self.period == 0 {
            return Reading::InsufficientData;
        }
        buffer.closes(self.period).map(|closes| {
            let sum: Decimal = closes.iter().sum();
            sum / Decimal::from(self.period)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::test_support::buffer_of;
    use rust_decimal_macros::dec;

    #[test]
    fn sma_of_four_closes() {
        let buffer = buffer_of(&[dec!(100), dec!(110), dec!(120), dec!(130)]);
        assert_eq!(Sma::new(4).compute(&buffer), Reading::Value(dec!(115)));
    }

    #[test]
    fn sma_uses_only_the_latest_period() {
        let buffer = buffer_of(&[dec!(1), dec!(1000), dec!(10), dec!(20)]);
        assert_eq!(Sma::new(2).compute(&buffer), Reading::Value(dec!(15)));
    }

    #[test]
    fn sma_with_short_history_has_no_value() {
        let buffer = buffer_of(&[dec!(100), dec!(110), dec!(120)]);
        assert!(Sma::new(4).compute(&buffer).is_insufficient());
        assert!(Sma::new(0).compute(&buffer).is_insufficient());
    }
}
