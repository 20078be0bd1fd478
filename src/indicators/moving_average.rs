use crate::models::round_to;

/// Calculate Simple Moving Average (SMA) over the trailing `period` values
pub fn calculate_sma(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period {
        return None;
    }

    let sum: f64 = prices[prices.len() - period..].iter().sum();
    Some(sum / period as f64)
}

/// SMA for every index of `prices`, rounded to 2 decimals.
///
/// Entry `i` is `Some` iff `i + 1 >= period`; the window is `[i + 1 - period, i]`.
pub fn sma_series(prices: &[f64], period: usize) -> Vec<Option<f64>> {
    (0..prices.len())
        .map(|i| calculate_sma(&prices[..=i], period).map(|sma| round_to(sma, 2)))
        .collect()
}
