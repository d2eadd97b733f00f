pub mod dispatcher;
pub mod evaluator;
pub mod kraken;
pub mod lifecycle;
pub mod pipeline;
pub mod poller;
pub mod shutdown;

pub use dispatcher::OrderDispatcher;
pub use evaluator::StrategyEvaluator;
pub use kraken::KrakenClient;
pub use lifecycle::Engine;
pub use pipeline::{MarketPipeline, PipelineSettings};
pub use poller::PollingWorker;
pub use shutdown::Shutdown;
