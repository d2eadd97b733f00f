use rust_decimal::Decimal;
use tracing::debug;

use common::{Balance, Candle, Market, Order, OrderSide, Position};
use trend::Trend;

use crate::orders::{build_closing_order, build_open_order, entry_volume, meets_minimums};
use crate::{open_positions, Strategy, StrategyContext, StrategyParams};

/// Trend following on the sign of the MACD line.
///
/// Goes long when MACD is positive and the close is above the slow SMA, short
/// on the mirror image. A position is closed once momentum flips against it
/// while it is still in profit.
pub struct MacdMomentum {
    ctx: StrategyContext,
    params: StrategyParams,
}

impl MacdMomentum {
    pub const NAME: &'static str = "macd";

    pub fn new(ctx: StrategyContext, params: StrategyParams) -> Self {
        Self { ctx, params }
    }

    fn momentum(&self, trend: &Trend) -> Option<Decimal> {
        trend
            .macd(
                self.ctx.timeframe,
                self.params.macd_fast,
                self.params.macd_slow,
                self.params.macd_signal,
            )
            .value()
            .map(|line| line.macd)
    }
}

impl Strategy for MacdMomentum {
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

        let macd = self.momentum(trend)?;
        let sma = trend
            .sma(self.ctx.timeframe, self.params.macd_slow)
            .value()?;

        let close = candle.close;
        let side = if macd > Decimal::ZERO && close > sma {
            OrderSide::Buy
        } else if macd < Decimal::ZERO && close < sma {
            OrderSide::Sell
        } else {
            return None;
        };

        let volume = entry_volume(
            balance,
            self.params.margin_fraction_pct,
            self.ctx.leverage,
            close,
            self.ctx.metadata.precision,
        )?;
        let order = build_open_order(&self.ctx, side, volume, close);
        if !meets_minimums(&order, &self.ctx.metadata) {
            return None;
        }

        debug!(market = %self.ctx.market, %side, %macd, %sma, "Momentum entry");
        Some(order)
    }

    fn close(&self, trend: &Trend, candle: &Candle, positions: &[Position]) -> Option<Order> {
        let macd = self.momentum(trend)?;
        let close = candle.close;

        open_positions(positions, self.ctx.market)
            .find(|p| match p.side {
                OrderSide::Buy => macd < Decimal::ZERO && close > p.open_price,
                OrderSide::Sell => macd > Decimal::ZERO && close < p.open_price,
            })
            .map(|p| build_closing_order(p, self.ctx.leverage, close))
    }
}
