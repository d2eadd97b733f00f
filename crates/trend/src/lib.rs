pub mod buffer;
pub mod indicators;
pub mod reading;
pub mod trend;

pub use buffer::CandleBuffer;
pub use indicators::{Bands, BollingerBands, Macd, MacdLine, Rsi, Sma, Twap};
pub use reading::Reading;
pub use trend::{SharedTrend, Trend};
