pub mod config;
pub mod macd;
pub mod orders;
pub mod registry;
pub mod twap;

pub use config::StrategyParams;
pub use registry::StrategyRegistry;

use rust_decimal::Decimal;

use common::{Balance, Candle, Market, MarketMetadata, Order, Position, Timeframe};
use trend::Trend;

/// Everything a strategy instance knows about the market it trades.
/// Handed over once at construction; there is no global state to consult.
#[derive(Debug, Clone)]
pub struct StrategyContext {
    pub market: Market,
    pub metadata: MarketMetadata,
    /// Leverage the exchange applies to margin orders on this market.
    pub leverage: Decimal,
    /// Timeframe whose indicators drive decisions.
    pub timeframe: Timeframe,
}

/// All strategy implementations must satisfy this trait.
///
/// Both operations get a read-only view of the market's trend and return at
/// most one order. The evaluator calls `close` before `open` on every
/// trigger candle.
pub trait Strategy: Send + Sync {
    /// Registry key of this strategy.
    fn name(&self) -> &str;

    /// The market this instance trades.
    fn market(&self) -> Market;

    /// Look for an entry. Implementations must reject orders below the
    /// market's minimum cost or volume.
    fn open(
        &self,
        trend: &Trend,
        candle: &Candle,
        balance: &Balance,
        positions: &[Position],
    ) -> Option<Order>;

    /// Look for a profitable exit from an existing position.
    fn close(&self, trend: &Trend, candle: &Candle, positions: &[Position]) -> Option<Order>;
}

/// Open positions on `market`.
pub(crate) fn open_positions(
    positions: &[Position],
    market: Market,
) -> impl Iterator<Item = &Position> {
    positions
        .iter()
        .filter(move |p| p.market == market && p.is_open())
}
