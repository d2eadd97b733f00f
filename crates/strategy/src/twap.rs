use rust_decimal::Decimal;
use tracing::debug;

use common::{Balance, Candle, Market, Order, OrderSide, Position};
use trend::Trend;

use crate::orders::{build_closing_order, build_open_order, entry_volume, meets_minimums};
use crate::{open_positions, Strategy, StrategyContext, StrategyParams};

/// Mean reversion around the time-weighted price.
///
/// Enters long when the close sits below the TWAP and on or under the lower
/// Bollinger band while RSI is oversold. Exits on take-profit or once RSI is
/// overbought (mirrored for shorts). Holds at most one position per market.
pub struct TwapReversion {
    ctx: StrategyContext,
    params: StrategyParams,
}

impl TwapReversion {
    pub const NAME: &'static str = "twap";

    pub fn new(ctx: StrategyContext, params: StrategyParams) -> Self {
        Self { ctx, params }
    }

    fn should_close(&self, position: &Position, close: Decimal, rsi: Option<Decimal>) -> bool {
        let step = self.params.take_profit_pct / Decimal::ONE_HUNDRED;
        match position.side {
            OrderSide::Buy => {
                close >= position.open_price * (Decimal::ONE + step)
                    || rsi.is_some_and(|r| r >= self.params.overbought)
            }
            OrderSide::Sell => {
                close <= position.open_price * (Decimal::ONE - step)
                    || rsi.is_some_and(|r| r <= self.params.oversold)
            }
        }
    }
}

impl Strategy for TwapReversion {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn market(&self) -> Market {
        self.ctx.market
    }

    fn open(
        &self,
        trend: &Trend,
        candle: &Candle,
        balance: &Balance,
        positions: &[Position],
    ) -> Option<Order> {
        if open_positions(positions, self.ctx.market).next().is_some() {
            return None;
        }

        let tf = self.ctx.timeframe;
        let twap = trend.twap(tf).value()?;
        let bands = trend
            .bollinger(tf, self.params.bb_period, self.params.bb_multiplier)
            .value()?;
        let rsi = trend.rsi(tf, self.params.rsi_period).value()?;

        let close = candle.close;
        if !(close < twap && close <= bands.lower && rsi <= self.params.oversold) {
            return None;
        }

        let volume = entry_volume(
            balance,
            self.params.margin_fraction_pct,
            self.ctx.leverage,
            close,
            self.ctx.metadata.precision,
        )?;
        let order = build_open_order(&self.ctx, OrderSide::Buy, volume, close);
        if !meets_minimums(&order, &self.ctx.metadata) {
            debug!(
                market = %self.ctx.market,
                %volume,
                cost = %order.market_cost(),
                "Entry below exchange minimums"
            );
            return None;
        }

        debug!(market = %self.ctx.market, %twap, lower = %bands.lower, %rsi, "Reversion entry");
        Some(order)
    }

    fn close(&self, trend: &Trend, candle: &Candle, positions: &[Position]) -> Option<Order> {
        let rsi = trend.rsi(self.ctx.timeframe, self.params.rsi_period).value();

        open_positions(positions, self.ctx.market)
            .find(|p| self.should_close(p, candle.close, rsi))
            .map(|p| {
                debug!(market = %self.ctx.market, position = %p.id, close = %candle.close, "Exit");
                build_closing_order(p, self.ctx.leverage, candle.close)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{context, last_candle, long_position, trend_of};
    use rust_decimal_macros::dec;

    fn strategy() -> TwapReversion {
        TwapReversion::new(context(), StrategyParams::default())
    }

    fn funded() -> Balance {
        Balance {
            free_margin: dec!(1000),
            ..Balance::default()
        }
    }

    /// Twenty flat closes then a sharp drop: below TWAP, under the lower
    /// band, RSI at zero.
    fn dip() -> Trend {
        let mut closes = vec![dec!(100); 20];
        closes.push(dec!(90));
        trend_of(&closes)
    }

    /// Alternating closes keep RSI near the middle.
    fn choppy(last: Decimal) -> Trend {
        let mut closes: Vec<Decimal> = (0..16)
            .map(|i| if i % 2 == 0 { dec!(100) } else { dec!(101) })
            .collect();
        closes.push(last);
        trend_of(&closes)
    }

    #[test]
    fn opens_long_on_a_dip() {
        let trend = dip();
        let order = strategy()
            .open(&trend, &last_candle(&trend), &funded(), &[])
            .expect("entry expected");
        assert_eq!(order.side, OrderSide::Buy);
        assert_eq!(order.volume, dec!(5.55555555));
        assert_eq!(order.market_price, dec!(90));
        assert_eq!(order.leverage, dec!(5));
    }

    #[test]
    fn no_entry_on_a_flat_market() {
        let trend = trend_of(&[dec!(100); 21]);
        assert!(strategy()
            .open(&trend, &last_candle(&trend), &funded(), &[])
            .is_none());
    }

    #[test]
    fn no_entry_while_a_position_is_open() {
        let trend = dip();
        let positions = [long_position(dec!(1), dec!(95))];
        assert!(strategy()
            .open(&trend, &last_candle(&trend), &funded(), &positions)
            .is_none());
    }

    #[test]
    fn no_entry_below_minimums() {
        let trend = dip();
        let poor = Balance {
            free_margin: dec!(0.001),
            ..Balance::default()
        };
        assert!(strategy()
            .open(&trend, &last_candle(&trend), &poor, &[])
            .is_none());
    }

    #[test]
    fn no_entry_without_history() {
        let trend = trend_of(&[dec!(100), dec!(90)]);
        assert!(strategy()
            .open(&trend, &last_candle(&trend), &funded(), &[])
            .is_none());
    }

    #[test]
    fn closes_long_at_take_profit() {
        let trend = choppy(dec!(102));
        let positions = [long_position(dec!(0.3), dec!(100))];
        let order = strategy()
            .close(&trend, &last_candle(&trend), &positions)
            .expect("exit expected");
        assert_eq!(order.side, OrderSide::Sell);
        assert_eq!(order.volume, dec!(0.3));
        assert!(order.reduce_only);
    }

    #[test]
    fn holds_long_below_target() {
        let trend = choppy(dec!(100.5));
        let positions = [long_position(dec!(0.3), dec!(100))];
        assert!(strategy()
            .close(&trend, &last_candle(&trend), &positions)
            .is_none());
    }

    #[test]
    fn closes_short_when_price_falls() {
        let trend = choppy(dec!(98));
        let mut short = long_position(dec!(0.3), dec!(100));
        short.side = OrderSide::Sell;
        let order = strategy()
            .close(&trend, &last_candle(&trend), &[short])
            .expect("exit expected");
        assert_eq!(order.side, OrderSide::Buy);
    }

    #[test]
    fn ignores_positions_on_other_markets() {
        let trend = choppy(dec!(102));
        let mut other = long_position(dec!(0.3), dec!(100));
        other.market = Market::EthEur;
        assert!(strategy()
            .close(&trend, &last_candle(&trend), &[other])
            .is_none());
    }
}
