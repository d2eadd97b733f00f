pub mod config;
pub mod error;
pub mod exchange;
pub mod market;
pub mod precision;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use exchange::{ExchangeClient, OrderAck};
pub use market::{MarketMetadata, MarketRegistry};
pub use types::*;
