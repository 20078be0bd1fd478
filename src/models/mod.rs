use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One day of the mock price series
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sma5: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sma20: Option<f64>,
    /// Fractional day-over-day change, None for the first day
    #[serde(skip_serializing_if = "Option::is_none")]
    pub returns: Option<f64>,
}

/// Total reward of one simulated training episode (1-based)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeReward {
    pub episode: u32,
    pub total_reward: f64,
}

/// Outcome of a backtest run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    pub initial_balance: f64,
    pub final_balance: f64,
    pub total_profit: f64,
    pub symbol: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub episodes_for_training: u32,
}

/// Agent training knobs. Bounds live in `training::hyperparameters`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Hyperparameters {
    pub gamma: f64,          // Discount factor
    pub epsilon: f64,        // Exploration rate
    pub epsilon_min: f64,
    pub epsilon_decay: f64,
    pub learning_rate: f64,
    pub episodes: u32,
    pub batch_size: u32,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            gamma: 0.95,
            epsilon: 1.0,
            epsilon_min: 0.01,
            epsilon_decay: 0.995,
            learning_rate: 0.001,
            episodes: 50,
            batch_size: 32,
        }
    }
}

/// Round to a fixed number of decimal places.
///
/// Monetary values are rounded where they are computed, not at display time.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
