//! Indicator computations over a `CandleBuffer`.
//!
//! Every computation is pure decimal arithmetic and returns the unrounded
//! value; `Trend` rounds to the market's precision before handing it out.

pub mod bollinger;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod twap;

pub use bollinger::{Bands, BollingerBands};
pub use macd::{Macd, MacdLine};
pub use rsi::Rsi;
pub use sma::Sma;
pub use twap::Twap;
