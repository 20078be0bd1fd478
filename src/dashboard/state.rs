use crate::error::Control;
use crate::models::{EpisodeReward, Hyperparameters, PerformanceMetrics, PricePoint};
use serde::Serialize;

/// Everything the dashboard displays
///
/// Read through the getters; only the controller mutates it, through the
/// update operations below.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardState {
    stock_data: Vec<PricePoint>,
    performance_metrics: Option<PerformanceMetrics>,
    episode_data: Vec<EpisodeReward>,
    current_symbol: Option<String>,
    is_backtest_loading: bool,
    is_training_loading: bool,
    is_ai_summary_loading: bool,
    ai_summary: Option<String>,
    hyperparameters: Hyperparameters,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            stock_data: Vec::new(),
            performance_metrics: None,
            episode_data: Vec::new(),
            current_symbol: Some("AAPL".to_string()),
            is_backtest_loading: false,
            is_training_loading: false,
            is_ai_summary_loading: false,
            ai_summary: None,
            hyperparameters: Hyperparameters::default(),
        }
    }
}

impl DashboardState {
    pub fn stock_data(&self) -> &[PricePoint] {
        &self.stock_data
    }

    pub fn performance_metrics(&self) -> Option<&PerformanceMetrics> {
        self.performance_metrics.as_ref()
    }

    pub fn episode_data(&self) -> &[EpisodeReward] {
        &self.episode_data
    }

    pub fn current_symbol(&self) -> Option<&str> {
        self.current_symbol.as_deref()
    }

    pub fn is_backtest_loading(&self) -> bool {
        self.is_backtest_loading
    }

    pub fn is_training_loading(&self) -> bool {
        self.is_training_loading
    }

    pub fn is_ai_summary_loading(&self) -> bool {
        self.is_ai_summary_loading
    }

    pub fn ai_summary(&self) -> Option<&str> {
        self.ai_summary.as_deref()
    }

    pub fn hyperparameters(&self) -> &Hyperparameters {
        &self.hyperparameters
    }

    // ---- Update operations ----

    /// Backtest submitted: disable the control, clear the stale summary
    pub(crate) fn begin_backtest(&mut self, symbol: &str) {
        self.is_backtest_loading = true;
        self.ai_summary = None;
        self.current_symbol = Some(symbol.to_string());
    }

    pub(crate) fn complete_backtest(
        &mut self,
        stock_data: Vec<PricePoint>,
        metrics: PerformanceMetrics,
    ) {
        self.stock_data = stock_data;
        self.performance_metrics = Some(metrics);
        self.is_backtest_loading = false;
    }

    /// Training submitted: the new hyperparameters replace the old ones wholesale
    pub(crate) fn begin_training(&mut self, hyperparameters: Hyperparameters) {
        self.is_training_loading = true;
        self.hyperparameters = hyperparameters;
    }

    pub(crate) fn complete_training(&mut self, episode_data: Vec<EpisodeReward>) {
        self.episode_data = episode_data;
        self.is_training_loading = false;
    }

    /// Patch the episode count into existing metrics, returning the updated copy
    pub(crate) fn patch_training_episodes(&mut self, episodes: u32) -> Option<PerformanceMetrics> {
        let metrics = self.performance_metrics.as_mut()?;
        metrics.episodes_for_training = episodes;
        Some(metrics.clone())
    }

    /// A run stopped before completing: re-enable its control
    pub(crate) fn abort_run(&mut self, control: Control) {
        match control {
            Control::Backtest => self.is_backtest_loading = false,
            Control::Training => self.is_training_loading = false,
        }
    }

    pub(crate) fn begin_summary(&mut self) {
        self.is_ai_summary_loading = true;
    }

    pub(crate) fn complete_summary(&mut self, summary: String) {
        self.ai_summary = Some(summary);
        self.is_ai_summary_loading = false;
    }
}
