use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::{CandleBuffer, Reading};

/// Time-weighted price over the whole buffer.
///
/// Each close is weighted by the whole minutes elapsed since its candle
/// opened, and the sum is divided by the total elapsed minutes. Older candles
/// therefore weigh more than recent ones. Candles stamped in the future count
/// as zero minutes.
#[derive(Debug, Clone, Copy)]
pub struct Twap {
    pub now: DateTime<Utc>,
}

impl Twap {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    /// No value when the buffer is empty or no time has elapsed at all.
    pub fn compute(&self, buffer: &CandleBuffer) -> Reading<Decimal> {
        let (weighted, elapsed) = buffer.all().fold(
            (Decimal::ZERO, Decimal::ZERO),
            |(weighted, elapsed), candle| {
                let minutes = Decimal::from((self.now - candle.timestamp).num_minutes().max(0));
                (weighted + candle.close * minutes, elapsed + minutes)
            },
        );

        if elapsed.is_zero() {
            return Reading::InsufficientData;
        }
        Reading::Value(weighted / elapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use common::Candle;
    use rust_decimal_macros::dec;

    fn at(minute: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::minutes(minute)
    }

    fn candle(minute: i64, close: Decimal) -> Candle {
        Candle::new(close, close, close, close, at(minute))
    }

    #[test]
    fn single_candle_with_elapsed_time_is_its_close() {
        let mut buffer = CandleBuffer::new(10);
        buffer.append(candle(0, dec!(123.45)));
        assert_eq!(Twap::at(at(7)).compute(&buffer), Reading::Value(dec!(123.45)));
    }

    #[test]
    fn zero_elapsed_time_has_no_value() {
        let mut buffer = CandleBuffer::new(10);
        buffer.append(candle(5, dec!(100)));
        buffer.append(candle(5, dec!(200)));
        assert!(Twap::at(at(5)).compute(&buffer).is_insufficient());
        assert!(Twap::at(at(5)).compute(&CandleBuffer::new(10)).is_insufficient());
    }

    #[test]
    fn older_candles_weigh_more() {
        // 100 is 3 minutes old, 200 is 1 minute old: (300 + 200) / 4
        let mut buffer = CandleBuffer::new(10);
        buffer.append(candle(0, dec!(100)));
        buffer.append(candle(2, dec!(200)));
        assert_eq!(Twap::at(at(3)).compute(&buffer), Reading::Value(dec!(125)));
    }

    #[test]
    fn partial_minutes_are_truncated() {
        let mut buffer = CandleBuffer::new(10);
        buffer.append(candle(0, dec!(80)));
        let now = at(0) + Duration::seconds(59);
        assert!(Twap::at(now).compute(&buffer).is_insufficient());
    }
}
