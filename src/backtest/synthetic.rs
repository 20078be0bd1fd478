use crate::indicators::sma_series;
use crate::models::{round_to, PricePoint};
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Opening price is drawn from [150, 200)
const SEED_BASE_PRICE: f64 = 150.0;
const SEED_PRICE_SPREAD: f64 = 50.0;
/// Closes never drop below this
const PRICE_FLOOR: f64 = 10.0;
/// Centre of the daily step; below 0.5 so the walk drifts upward
const STEP_BIAS: f64 = 0.48;
const STEP_SCALE: f64 = 5.0;

const SHORT_SMA_PERIOD: usize = 5;
const LONG_SMA_PERIOD: usize = 20;

/// Generates a mock daily close series with a biased random walk
pub struct PriceSeriesGenerator<R: Rng = StdRng> {
    rng: R,
}

impl PriceSeriesGenerator<StdRng> {
    /// Create a new generator with a seed for reproducibility
    pub fn new(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> PriceSeriesGenerator<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Generate one point per calendar day in `[start, end]`
    ///
    /// Returns an empty series when `end < start`. Closes are rounded to
    /// cents as they are produced, so the moving averages are computed on
    /// already-rounded values.
    pub fn generate(&mut self, start: NaiveDate, end: NaiveDate) -> Vec<PricePoint> {
        if end < start {
            tracing::debug!(%start, %end, "End precedes start, empty series");
            return Vec::new();
        }

        let num_days = (end - start).num_days() as usize + 1;
        let mut points: Vec<PricePoint> = Vec::with_capacity(num_days);
        let mut last_close = SEED_BASE_PRICE + self.rng.gen::<f64>() * SEED_PRICE_SPREAD;

        for date in start.iter_days().take(num_days) {
            let change = (self.rng.gen::<f64>() - STEP_BIAS) * STEP_SCALE;
            let close = round_to((last_close + change).max(PRICE_FLOOR), 2);
            let returns = points
                .last()
                .map(|prev| (close - prev.close) / prev.close);

            points.push(PricePoint {
                date,
                close,
                sma5: None,
                sma20: None,
                returns,
            });
            last_close = close;
        }

        let closes: Vec<f64> = points.iter().map(|p| p.close).collect();
        let short = sma_series(&closes, SHORT_SMA_PERIOD);
        let long = sma_series(&closes, LONG_SMA_PERIOD);

        for ((point, sma5), sma20) in points.iter_mut().zip(short).zip(long) {
            point.sma5 = sma5;
            point.sma20 = sma20;
        }

        tracing::debug!(
            points = points.len(),
            first = points.first().map(|p| p.close),
            last = points.last().map(|p| p.close),
            "Generated price series"
        );

        points
    }
}
