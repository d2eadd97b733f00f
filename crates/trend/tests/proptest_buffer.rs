use chrono::{Duration, TimeZone, Utc};
use common::Candle;
use proptest::prelude::*;
use rust_decimal::Decimal;
use trend::{CandleBuffer, Reading, Sma};

fn candle(i: usize, close: i64) -> Candle {
    let ts = Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::minutes(i as i64);
    let close = Decimal::from(close);
    Candle::new(close, close, close, close, ts)
}

proptest! {
    /// After N appends into capacity C the buffer holds min(N, C) candles:
    /// exactly the last ones appended, in arrival order.
    #[test]
    fn buffer_holds_the_last_capacity_candles(
        capacity in 1usize..64,
        closes in proptest::collection::vec(-1_000_000i64..1_000_000, 0..200),
    ) {
        let mut buffer = CandleBuffer::new(capacity);
        for (i, close) in closes.iter().enumerate() {
            buffer.append(candle(i, *close));
            prop_assert!(buffer.len() <= capacity);
        }

        let expected_len = closes.len().min(capacity);
        prop_assert_eq!(buffer.len(), expected_len);

        let expected: Vec<Decimal> = closes[closes.len() - expected_len..]
            .iter()
            .map(|c| Decimal::from(*c))
            .collect();
        prop_assert_eq!(buffer.all_closes(), expected);

        let timestamps: Vec<_> = buffer.all().map(|c| c.timestamp).collect();
        prop_assert!(timestamps.windows(2).all(|w| w[0] < w[1]));
    }

    /// Windows past the buffered history never produce a value.
    #[test]
    fn oversized_requests_are_insufficient(
        len in 0usize..30,
        extra in 1usize..30,
    ) {
        let mut buffer = CandleBuffer::new(64);
        for i in 0..len {
            buffer.append(candle(i, 100));
        }
        prop_assert!(buffer.window(len + extra).is_insufficient());
        prop_assert_eq!(Sma::new(len + extra).compute(&buffer), Reading::InsufficientData);
    }
}
