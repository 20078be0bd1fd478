use crate::models::{round_to, PerformanceMetrics};
use chrono::NaiveDate;
use rand::Rng;

pub const DEFAULT_INITIAL_BALANCE: f64 = 10_000.0;

/// Final balance = initial + (u - OUTCOME_BIAS) * OUTCOME_SCALE, u ~ U[0, 1)
const OUTCOME_BIAS: f64 = 0.3;
const OUTCOME_SCALE: f64 = 5_000.0;

impl PerformanceMetrics {
    /// Draw a mock backtest outcome for the given period
    ///
    /// Balances and profit are rounded to cents.
    pub fn simulate<R: Rng>(
        rng: &mut R,
        initial_balance: f64,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        episodes_for_training: u32,
    ) -> Self {
        let final_balance = initial_balance + (rng.gen::<f64>() - OUTCOME_BIAS) * OUTCOME_SCALE;
        let total_profit = final_balance - initial_balance;

        Self {
            initial_balance: round_to(initial_balance, 2),
            final_balance: round_to(final_balance, 2),
            total_profit: round_to(total_profit, 2),
            symbol: symbol.to_string(),
            start_date,
            end_date,
            episodes_for_training,
        }
    }

    /// Profit as a percentage of the initial balance
    pub fn return_pct(&self) -> f64 {
        if self.initial_balance == 0.0 {
            return 0.0;
        }
        (self.total_profit / self.initial_balance) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn period() -> (NaiveDate, NaiveDate) {
        (
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
        )
    }

    #[test]
    fn test_simulated_outcome_bounds() {
        let (start, end) = period();
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..200 {
            let m = PerformanceMetrics::simulate(
                &mut rng,
                DEFAULT_INITIAL_BALANCE,
                "AAPL",
                start,
                end,
                50,
            );
            assert!(m.final_balance >= 8_500.0 && m.final_balance <= 13_500.0);
            assert!((m.total_profit - (m.final_balance - m.initial_balance)).abs() < 0.011);
        }
    }

    #[test]
    fn test_zero_draw_loses_fifteen_hundred() {
        let (start, end) = period();
        let mut rng = StepRng::new(0, 0);
        let m = PerformanceMetrics::simulate(&mut rng, 10_000.0, "MSFT", start, end, 100);

        assert_eq!(m.initial_balance, 10_000.0);
        assert_eq!(m.final_balance, 8_500.0);
        assert_eq!(m.total_profit, -1_500.0);
        assert_eq!(m.symbol, "MSFT");
        assert_eq!(m.episodes_for_training, 100);
        assert!((m.return_pct() + 15.0).abs() < 1e-9);
    }
}
