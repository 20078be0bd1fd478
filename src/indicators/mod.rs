// Technical indicators module
// Implements the simple moving averages plotted over the price series

pub mod moving_average;

pub use moving_average::{calculate_sma, sma_series};
