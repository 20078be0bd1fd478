// Dashboard controller: owns the state and drives the mock runs
pub mod state;

pub use state::DashboardState;

use crate::backtest::PriceSeriesGenerator;
use crate::config::DashboardConfig;
use crate::error::{Control, SubmitError};
use crate::llm::{self, AnalysisService, ExplanationCache, ExplanationInput};
use crate::models::{Hyperparameters, PerformanceMetrics};
use crate::training::EpisodeRewardGenerator;
use crate::validation::{validate_hyperparameters, BacktestForm, BacktestRequest};
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Symbol and period of the backtest run at startup
const STARTUP_SYMBOL: &str = "AAPL";
const STARTUP_PERIOD: ((i32, u32, u32), (i32, u32, u32)) = ((2023, 1, 1), (2023, 12, 31));

/// Single owner of the dashboard state
///
/// Runs take `&self`, so a backtest and a training run can be in flight
/// together; a second run from the same control is rejected with
/// `SubmitError::Busy` until the first finishes or is dropped. Locks are
/// only held between suspension points.
pub struct Dashboard {
    state: Mutex<DashboardState>,
    rng: Mutex<StdRng>,
    service: Arc<dyn AnalysisService>,
    explanations: Mutex<ExplanationCache>,
    settings: DashboardConfig,
}

/// Re-enables a control when its run is dropped before completing
struct RunGuard<'a> {
    state: &'a Mutex<DashboardState>,
    control: Control,
    completed: bool,
}

impl<'a> RunGuard<'a> {
    fn new(state: &'a Mutex<DashboardState>, control: Control) -> Self {
        Self {
            state,
            control,
            completed: false,
        }
    }

    fn complete(mut self) {
        self.completed = true;
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if !self.completed {
            tracing::warn!(control = %self.control, "Run dropped before completion");
            lock(self.state).abort_run(self.control);
        }
    }
}

struct BacktestRun<'a> {
    guard: RunGuard<'a>,
    request: BacktestRequest,
}

struct TrainingRun<'a> {
    guard: RunGuard<'a>,
    episodes: u32,
    /// Metrics existed at submission, so the summary is refreshed afterwards
    resummarize: bool,
}

impl Dashboard {
    pub fn new(service: Arc<dyn AnalysisService>, settings: DashboardConfig) -> Self {
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            state: Mutex::new(DashboardState::default()),
            rng: Mutex::new(rng),
            service,
            explanations: Mutex::new(ExplanationCache::new()),
            settings,
        }
    }

    /// Snapshot of the current state
    pub fn state(&self) -> DashboardState {
        lock(&self.state).clone()
    }

    /// Snapshot of the explanation cache
    pub fn explanations(&self) -> ExplanationCache {
        lock(&self.explanations).clone()
    }

    /// Populate the dashboard the way it opens: an AAPL backtest for 2023
    /// and a training run with the default hyperparameters, side by side
    ///
    /// Both runs start before either completes, so the training run sees
    /// no metrics and only the backtest requests a summary.
    pub async fn initialize(&self) {
        let ((sy, sm, sd), (ey, em, ed)) = STARTUP_PERIOD;
        let (Some(start_date), Some(end_date)) = (
            NaiveDate::from_ymd_opt(sy, sm, sd),
            NaiveDate::from_ymd_opt(ey, em, ed),
        ) else {
            return;
        };

        tracing::info!("🚀 Initializing dashboard");

        let (backtest, training) = {
            let mut state = lock(&self.state);
            let backtest = self.start_backtest(
                &mut state,
                BacktestRequest {
                    symbol: STARTUP_SYMBOL.to_string(),
                    start_date,
                    end_date,
                },
            );
            let training = self.start_training(&mut state, Hyperparameters::default());
            (backtest, training)
        };

        tokio::join!(self.finish_backtest(backtest), self.finish_training(training));
    }

    /// Validate a backtest form and run it
    ///
    /// Nothing is generated when the form is invalid or a backtest is
    /// already in flight.
    pub async fn submit_backtest(&self, form: &BacktestForm) -> Result<(), SubmitError> {
        let run = {
            let mut state = lock(&self.state);
            if state.is_backtest_loading() {
                return Err(SubmitError::Busy(Control::Backtest));
            }

            let request = form.validate()?;
            tracing::info!(symbol = %request.symbol, "Backtest initiated");
            self.start_backtest(&mut state, request)
        };

        self.finish_backtest(run).await;
        Ok(())
    }

    /// Validate hyperparameters and train with them
    pub async fn submit_training(
        &self,
        hyperparameters: &Hyperparameters,
    ) -> Result<(), SubmitError> {
        let run = {
            let mut state = lock(&self.state);
            if state.is_training_loading() {
                return Err(SubmitError::Busy(Control::Training));
            }

            let hyperparameters = validate_hyperparameters(hyperparameters)?;
            tracing::info!(episodes = hyperparameters.episodes, "Training initiated");
            self.start_training(&mut state, hyperparameters)
        };

        self.finish_training(run).await;
        Ok(())
    }

    /// Explanation for a hyperparameter label, fetched at most once per term
    pub async fn explain(&self, term: &str) -> String {
        let cached = lock(&self.explanations).begin(term);
        if let Some(text) = cached {
            return text;
        }

        let input = ExplanationInput {
            hyperparameter_name: term.to_string(),
        };
        let result = self.service.explain_hyperparameter(&input).await;
        lock(&self.explanations).finish(term, result)
    }

    /// Popover text for `term` without requesting anything
    pub fn explanation_text(&self, term: &str) -> String {
        lock(&self.explanations).display_text(term).to_string()
    }

    fn start_backtest<'a>(
        &'a self,
        state: &mut DashboardState,
        request: BacktestRequest,
    ) -> BacktestRun<'a> {
        state.begin_backtest(&request.symbol);
        BacktestRun {
            guard: RunGuard::new(&self.state, Control::Backtest),
            request,
        }
    }

    /// Generate a price series and outcome metrics, then request the summary
    async fn finish_backtest(&self, run: BacktestRun<'_>) {
        let BacktestRun { guard, request } = run;

        simulate_work(self.settings.backtest_delay()).await;

        let episodes = lock(&self.state).hyperparameters().episodes;
        let (stock_data, metrics) = {
            let mut rng = lock(&self.rng);
            let stock_data = PriceSeriesGenerator::with_rng(&mut *rng)
                .generate(request.start_date, request.end_date);
            let metrics = PerformanceMetrics::simulate(
                &mut *rng,
                self.settings.initial_balance,
                &request.symbol,
                request.start_date,
                request.end_date,
                episodes,
            );
            (stock_data, metrics)
        };

        tracing::info!(
            symbol = %metrics.symbol,
            points = stock_data.len(),
            final_balance = metrics.final_balance,
            total_profit = metrics.total_profit,
            "Backtest complete"
        );

        lock(&self.state).complete_backtest(stock_data, metrics.clone());
        guard.complete();
        self.refresh_summary(&metrics).await;
    }

    fn start_training<'a>(
        &'a self,
        state: &mut DashboardState,
        hyperparameters: Hyperparameters,
    ) -> TrainingRun<'a> {
        let episodes = hyperparameters.episodes;
        let resummarize = state.performance_metrics().is_some();
        state.begin_training(hyperparameters);
        TrainingRun {
            guard: RunGuard::new(&self.state, Control::Training),
            episodes,
            resummarize,
        }
    }

    /// Generate episode rewards and, when a backtest existed at submission,
    /// re-request its summary with the new episode count
    async fn finish_training(&self, run: TrainingRun<'_>) {
        let TrainingRun {
            guard,
            episodes,
            resummarize,
        } = run;

        simulate_work(self.settings.training_delay()).await;

        let episode_data = {
            let mut rng = lock(&self.rng);
            EpisodeRewardGenerator::with_rng(&mut *rng).generate(episodes)
        };
        tracing::info!(
            episodes,
            final_reward = episode_data.last().map(|e| e.total_reward),
            "Training complete"
        );
        lock(&self.state).complete_training(episode_data);
        guard.complete();

        if !resummarize {
            return;
        }
        let patched = lock(&self.state).patch_training_episodes(episodes);
        if let Some(metrics) = patched {
            self.refresh_summary(&metrics).await;
        }
    }

    async fn refresh_summary(&self, metrics: &PerformanceMetrics) {
        lock(&self.state).begin_summary();
        let summary = llm::summarize(self.service.as_ref(), metrics).await;
        lock(&self.state).complete_summary(summary);
    }
}

/// A panic while holding a lock leaves the data usable
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Stand-in for the time a real run would take
async fn simulate_work(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FormField, LlmError};
    use crate::llm::{
        ExplanationInput, ExplanationOutput, SummaryInput, SummaryOutput, SUMMARY_FALLBACK,
    };
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct EchoService {
        summaries: AtomicUsize,
        explanations: AtomicUsize,
    }

    #[async_trait]
    impl AnalysisService for EchoService {
        async fn analyze_summary(&self, input: &SummaryInput) -> Result<SummaryOutput, LlmError> {
            self.summaries.fetch_add(1, Ordering::SeqCst);
            Ok(SummaryOutput {
                summary: format!(
                    "{} {} to {} over {} episodes",
                    input.symbol, input.start_date, input.end_date, input.episodes
                ),
            })
        }

        async fn explain_hyperparameter(
            &self,
            input: &ExplanationInput,
        ) -> Result<ExplanationOutput, LlmError> {
            self.explanations.fetch_add(1, Ordering::SeqCst);
            Ok(ExplanationOutput {
                explanation: format!("About {}", input.hyperparameter_name),
            })
        }
    }

    struct FailingService;

    #[async_trait]
    impl AnalysisService for FailingService {
        async fn analyze_summary(&self, _input: &SummaryInput) -> Result<SummaryOutput, LlmError> {
            Err(LlmError::Api {
                status: 503,
                body: "unavailable".to_string(),
            })
        }

        async fn explain_hyperparameter(
            &self,
            _input: &ExplanationInput,
        ) -> Result<ExplanationOutput, LlmError> {
            Err(LlmError::MalformedOutput("not json".to_string()))
        }
    }

    struct StalledService;

    #[async_trait]
    impl AnalysisService for StalledService {
        async fn analyze_summary(&self, _input: &SummaryInput) -> Result<SummaryOutput, LlmError> {
            std::future::pending().await
        }

        async fn explain_hyperparameter(
            &self,
            _input: &ExplanationInput,
        ) -> Result<ExplanationOutput, LlmError> {
            std::future::pending().await
        }
    }

    fn settings() -> DashboardConfig {
        DashboardConfig {
            seed: Some(42),
            ..DashboardConfig::default()
        }
        .without_delays()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_backtest_populates_state_and_summary() {
        let service = Arc::new(EchoService::default());
        let dashboard = Dashboard::new(service.clone(), settings());

        let form = BacktestForm::new("msft", date(2023, 1, 1), date(2023, 1, 10));
        dashboard.submit_backtest(&form).await.unwrap();

        let state = dashboard.state();
        assert_eq!(state.stock_data().len(), 10);
        assert_eq!(state.current_symbol(), Some("MSFT"));
        let metrics = state.performance_metrics().unwrap();
        assert_eq!(metrics.symbol, "MSFT");
        assert_eq!(metrics.initial_balance, 10_000.0);
        assert_eq!(metrics.episodes_for_training, 50);
        assert_eq!(
            state.ai_summary(),
            Some("MSFT 2023-01-01 to 2023-01-10 over 50 episodes")
        );
        assert!(!state.is_backtest_loading());
        assert!(!state.is_ai_summary_loading());
        assert_eq!(service.summaries.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_summary_failure_uses_fallback() {
        let dashboard = Dashboard::new(Arc::new(FailingService), settings());

        let form = BacktestForm::new("AAPL", date(2023, 1, 1), date(2023, 3, 1));
        dashboard.submit_backtest(&form).await.unwrap();

        let state = dashboard.state();
        assert_eq!(state.ai_summary(), Some(SUMMARY_FALLBACK));
        assert!(!state.is_ai_summary_loading());
        assert_eq!(state.stock_data().len(), 60);
        assert!(state.performance_metrics().is_some());
    }

    #[tokio::test]
    async fn test_invalid_form_generates_nothing() {
        let service = Arc::new(EchoService::default());
        let dashboard = Dashboard::new(service.clone(), settings());

        let form = BacktestForm::new("AAPL", date(2023, 1, 1), date(2023, 1, 1));
        let err = dashboard.submit_backtest(&form).await.unwrap_err();

        match err {
            SubmitError::Validation(errors) => assert_eq!(
                errors.get(FormField::EndDate),
                Some("End date must be after start date.")
            ),
            other => panic!("unexpected error: {:?}", other),
        }

        let state = dashboard.state();
        assert!(state.stock_data().is_empty());
        assert!(state.performance_metrics().is_none());
        assert!(!state.is_backtest_loading());
        assert_eq!(service.summaries.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_training_without_backtest_skips_summary() {
        let service = Arc::new(EchoService::default());
        let dashboard = Dashboard::new(service.clone(), settings());

        let hp = Hyperparameters {
            episodes: 120,
            ..Hyperparameters::default()
        };
        dashboard.submit_training(&hp).await.unwrap();

        let state = dashboard.state();
        assert_eq!(state.episode_data().len(), 120);
        assert_eq!(state.hyperparameters(), &hp);
        assert!(!state.is_training_loading());
        assert!(state.ai_summary().is_none());
        assert_eq!(service.summaries.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_training_patches_metrics_and_resummarizes() {
        let service = Arc::new(EchoService::default());
        let dashboard = Dashboard::new(service.clone(), settings());

        let form = BacktestForm::new("AAPL", date(2023, 1, 1), date(2023, 2, 1));
        dashboard.submit_backtest(&form).await.unwrap();
        let before = dashboard.state().performance_metrics().cloned().unwrap();

        let hp = Hyperparameters {
            episodes: 300,
            ..Hyperparameters::default()
        };
        dashboard.submit_training(&hp).await.unwrap();

        let state = dashboard.state();
        let after = state.performance_metrics().unwrap();
        assert_eq!(after.episodes_for_training, 300);
        assert_eq!(after.final_balance, before.final_balance);
        assert_eq!(
            dashboard.state().ai_summary(),
            Some("AAPL 2023-01-01 to 2023-02-01 over 300 episodes")
        );
        assert_eq!(service.summaries.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalid_hyperparameters_rejected() {
        let dashboard = Dashboard::new(Arc::new(EchoService::default()), settings());

        let hp = Hyperparameters {
            batch_size: 4,
            ..Hyperparameters::default()
        };
        let err = dashboard.submit_training(&hp).await.unwrap_err();

        assert!(matches!(err, SubmitError::Validation(_)));
        assert!(dashboard.state().episode_data().is_empty());
        assert_eq!(dashboard.state().hyperparameters(), &Hyperparameters::default());
    }

    #[tokio::test]
    async fn test_initialize_runs_startup_backtest_and_training() {
        let service = Arc::new(EchoService::default());
        let dashboard = Dashboard::new(service.clone(), settings());

        dashboard.initialize().await;

        let state = dashboard.state();
        assert_eq!(state.stock_data().len(), 365);
        assert_eq!(state.episode_data().len(), 50);
        assert_eq!(state.current_symbol(), Some("AAPL"));
        assert_eq!(
            state.ai_summary(),
            Some("AAPL 2023-01-01 to 2023-12-31 over 50 episodes")
        );
        assert!(!state.is_backtest_loading());
        assert!(!state.is_training_loading());
        assert_eq!(service.summaries.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_initialize_with_delays_requests_one_summary() {
        let delayed = DashboardConfig {
            seed: Some(3),
            backtest_delay_ms: 15,
            training_delay_ms: 30,
            ..DashboardConfig::default()
        };
        let service = Arc::new(EchoService::default());
        let dashboard = Dashboard::new(service.clone(), delayed);

        dashboard.initialize().await;

        assert_eq!(service.summaries.load(Ordering::SeqCst), 1);
        assert_eq!(
            dashboard.state().performance_metrics().map(|m| m.episodes_for_training),
            Some(50)
        );
    }

    #[tokio::test]
    async fn test_same_seed_same_dashboard() {
        let a = Dashboard::new(Arc::new(EchoService::default()), settings());
        let b = Dashboard::new(Arc::new(EchoService::default()), settings());

        a.initialize().await;
        b.initialize().await;

        assert_eq!(a.state().stock_data(), b.state().stock_data());
        assert_eq!(a.state().episode_data(), b.state().episode_data());
        assert_eq!(a.state().performance_metrics(), b.state().performance_metrics());
    }

    fn delayed_settings() -> DashboardConfig {
        DashboardConfig {
            seed: Some(1),
            backtest_delay_ms: 40,
            training_delay_ms: 10,
            ..DashboardConfig::default()
        }
    }

    #[tokio::test]
    async fn test_control_disabled_while_run_in_flight() {
        let service = Arc::new(EchoService::default());
        let dashboard = Dashboard::new(service.clone(), delayed_settings());
        let form = BacktestForm::new("AAPL", date(2023, 1, 1), date(2023, 1, 31));

        let (first, second) = tokio::join!(
            dashboard.submit_backtest(&form),
            dashboard.submit_backtest(&form)
        );

        assert_eq!(first, Ok(()));
        assert_eq!(second, Err(SubmitError::Busy(Control::Backtest)));
        assert_eq!(dashboard.state().stock_data().len(), 31);
        assert_eq!(service.summaries.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_training_runs_alongside_backtest() {
        let service = Arc::new(EchoService::default());
        let dashboard = Dashboard::new(service.clone(), delayed_settings());
        let form = BacktestForm::new("AAPL", date(2023, 1, 1), date(2023, 1, 31));
        let hp = Hyperparameters {
            episodes: 80,
            ..Hyperparameters::default()
        };

        let (backtest, training) = tokio::join!(
            dashboard.submit_backtest(&form),
            dashboard.submit_training(&hp)
        );

        assert_eq!(backtest, Ok(()));
        assert_eq!(training, Ok(()));
        let state = dashboard.state();
        assert_eq!(state.stock_data().len(), 31);
        assert_eq!(state.episode_data().len(), 80);
        // No metrics existed when training was submitted
        assert_eq!(service.summaries.load(Ordering::SeqCst), 1);
        assert_eq!(
            state.performance_metrics().map(|m| m.episodes_for_training),
            Some(80)
        );
    }

    #[tokio::test]
    async fn test_dropped_run_reenables_control() {
        let dashboard = Dashboard::new(Arc::new(EchoService::default()), delayed_settings());
        let form = BacktestForm::new("AAPL", date(2023, 1, 1), date(2023, 1, 31));

        {
            let mut run = tokio_test::task::spawn(dashboard.submit_backtest(&form));
            tokio_test::assert_pending!(run.poll());
            assert!(dashboard.state().is_backtest_loading());
        }

        assert!(!dashboard.state().is_backtest_loading());
        assert!(dashboard.state().stock_data().is_empty());
        assert_eq!(dashboard.submit_backtest(&form).await, Ok(()));
        assert_eq!(dashboard.state().stock_data().len(), 31);
    }

    #[tokio::test]
    async fn test_stalled_summary_keeps_loading_flag() {
        let dashboard = Dashboard::new(Arc::new(StalledService), settings());

        {
            let form = BacktestForm::new("AAPL", date(2023, 1, 1), date(2023, 1, 31));
            let mut run = tokio_test::task::spawn(dashboard.submit_backtest(&form));
            tokio_test::assert_pending!(run.poll());
        }

        let state = dashboard.state();
        assert_eq!(state.stock_data().len(), 31);
        assert!(state.performance_metrics().is_some());
        assert!(!state.is_backtest_loading());
        assert!(state.is_ai_summary_loading());
        assert!(state.ai_summary().is_none());
    }

    #[tokio::test]
    async fn test_explanations_memoised() {
        let service = Arc::new(EchoService::default());
        let dashboard = Dashboard::new(service.clone(), settings());

        assert_eq!(
            dashboard.explanation_text("Batch Size"),
            "Hover to load explanation."
        );
        assert_eq!(dashboard.explain("Batch Size").await, "About Batch Size");
        assert_eq!(dashboard.explain("Batch Size").await, "About Batch Size");
        assert_eq!(service.explanations.load(Ordering::SeqCst), 1);
        assert_eq!(dashboard.explanations().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_explanation_falls_back() {
        let dashboard = Dashboard::new(Arc::new(FailingService), settings());

        assert_eq!(
            dashboard.explain("Learning Rate").await,
            "Could not load explanation."
        );
        assert_eq!(
            dashboard.explanation_text("Learning Rate"),
            "Could not load explanation."
        );
    }
}
