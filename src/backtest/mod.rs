pub mod metrics;
pub mod synthetic;

pub use metrics::DEFAULT_INITIAL_BALANCE;
pub use synthetic::PriceSeriesGenerator;
