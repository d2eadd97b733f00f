use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds to `decimals` places, halves away from zero.
/// Example: 54.545 at 2 places -> 54.55
pub fn market_precision(value: Decimal, decimals: u32) -> Decimal {
    value.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero)
}

/// Truncates a volume toward zero at `decimals` places so an order never
/// exceeds what the caller can afford.
/// Example: 0.123456789 at 8 places -> 0.12345678
pub fn normalize_volume(volume: Decimal, decimals: u32) -> Decimal {
    volume.round_dp_with_strategy(decimals, RoundingStrategy::ToZero)
}

/// `percent` percent of `number`.
pub fn percentage(number: Decimal, percent: Decimal) -> Decimal {
    number * percent / Decimal::ONE_HUNDRED
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn market_precision_rounds_half_away_from_zero() {
        assert_eq!(market_precision(dec!(54.545), 2), dec!(54.55));
        assert_eq!(market_precision(dec!(-54.545), 2), dec!(-54.55));
        assert_eq!(market_precision(dec!(115), 8), dec!(115));
    }

    #[test]
    fn normalize_volume_never_rounds_up() {
        assert_eq!(normalize_volume(dec!(0.123456789), 8), dec!(0.12345678));
        assert_eq!(normalize_volume(dec!(1.999), 0), dec!(1));
    }

    #[test]
    fn percentage_of_number() {
        assert_eq!(percentage(dec!(200), dec!(2.5)), dec!(5));
    }
}
