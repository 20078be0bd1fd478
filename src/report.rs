use crate::dashboard::DashboardState;
use crate::llm::SUMMARY_FALLBACK;
use crate::training::HYPERPARAMETER_FIELDS;
use crate::Result;
use std::fmt;

const CURRENCY: &str = "₹";

/// Plain-text rendering of the dashboard
pub struct Report<'a> {
    state: &'a DashboardState,
    /// Number of trailing price rows to print
    tail: usize,
}

impl<'a> Report<'a> {
    pub fn new(state: &'a DashboardState) -> Self {
        Self { state, tail: 10 }
    }

    pub fn with_tail(mut self, tail: usize) -> Self {
        self.tail = tail;
        self
    }

    fn write_header(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
        writeln!(f, "\n╔═══════════════════════════════════════════════════════╗")?;
        writeln!(f, "║ {:<53} ║", title)?;
        writeln!(f, "╚═══════════════════════════════════════════════════════╝")
    }

    fn write_performance(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = match self.state.current_symbol() {
            Some(symbol) => format!("PERFORMANCE REPORT ({})", symbol),
            None => "PERFORMANCE REPORT".to_string(),
        };
        Self::write_header(f, &title)?;

        if self.state.is_backtest_loading() {
            return writeln!(f, "  Backtest running...");
        }

        let Some(metrics) = self.state.performance_metrics() else {
            return writeln!(f, "  No backtest yet");
        };

        writeln!(
            f,
            "  Backtest period: {} - {}",
            metrics.start_date, metrics.end_date
        )?;
        writeln!(f, "  Initial Balance:   {}{:.2}", CURRENCY, metrics.initial_balance)?;
        writeln!(f, "  Final Balance:     {}{:.2}", CURRENCY, metrics.final_balance)?;
        writeln!(
            f,
            "  Total Profit:      {}{:.2} ({:+.2}%)",
            CURRENCY,
            metrics.total_profit,
            metrics.return_pct()
        )?;
        writeln!(f, "  Training Episodes: {}", metrics.episodes_for_training)?;

        if self.state.is_ai_summary_loading() {
            writeln!(f, "\n  ✨ AI Analysis: generating...")?;
        } else if let Some(summary) = self.state.ai_summary() {
            writeln!(f, "\n  ✨ AI Analysis")?;
            for line in summary.lines() {
                writeln!(f, "  {}", line)?;
            }
        }

        Ok(())
    }

    fn write_prices(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.state.stock_data();
        if data.is_empty() {
            return Ok(());
        }

        Self::write_header(f, &format!("PRICE SERIES ({} days)", data.len()))?;
        writeln!(
            f,
            "  {:<12} {:>10} {:>10} {:>10} {:>9}",
            "Date", "Close", "SMA5", "SMA20", "Return%"
        )?;
        writeln!(f, "  {}", "─".repeat(55))?;

        let skip = data.len().saturating_sub(self.tail);
        for point in &data[skip..] {
            writeln!(
                f,
                "  {:<12} {:>10.2} {:>10} {:>10} {:>9}",
                point.date.to_string(),
                point.close,
                optional(point.sma5, 2),
                optional(point.sma20, 2),
                optional(point.returns.map(|r| r * 100.0), 2)
            )?;
        }

        Ok(())
    }

    fn write_episodes(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let episodes = self.state.episode_data();
        let (Some(first), Some(last)) = (episodes.first(), episodes.last()) else {
            return Ok(());
        };

        Self::write_header(f, "EPISODE PERFORMANCE")?;
        writeln!(f, "  Episodes:      {}", episodes.len())?;
        writeln!(f, "  First Reward:  {:.2}", first.total_reward)?;
        writeln!(f, "  Last Reward:   {:.2}", last.total_reward)?;

        if let Some(best) = episodes
            .iter()
            .max_by(|a, b| a.total_reward.total_cmp(&b.total_reward))
        {
            writeln!(
                f,
                "  Best Reward:   {:.2} (episode {})",
                best.total_reward, best.episode
            )?;
        }

        Ok(())
    }

    fn write_hyperparameters(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Self::write_header(f, "HYPERPARAMETERS")?;
        let hp = self.state.hyperparameters();

        for field in HYPERPARAMETER_FIELDS.iter() {
            let value = field.value(hp);
            let (value, range) = if field.integer {
                (
                    (value as u64).to_string(),
                    format!(
                        "[{} - {}, step {}]",
                        field.widget_min as u64, field.widget_max as u64, field.step as u64
                    ),
                )
            } else {
                (
                    value.to_string(),
                    format!(
                        "[{} - {}, step {}]",
                        field.widget_min, field.widget_max, field.step
                    ),
                )
            };
            writeln!(f, "  {:<28} {:<8} {}", field.label, value, range)?;
        }

        Ok(())
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_performance(f)?;
        self.write_prices(f)?;
        self.write_episodes(f)?;
        self.write_hyperparameters(f)
    }
}

fn optional(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", decimals, v),
        None => "-".to_string(),
    }
}

/// Dashboard state as pretty camelCase JSON
pub fn render_json(state: &DashboardState) -> Result<String> {
    Ok(serde_json::to_string_pretty(state)?)
}

/// True when the summary shown is the fallback text
pub fn summary_unavailable(state: &DashboardState) -> bool {
    state.ai_summary() == Some(SUMMARY_FALLBACK)
}
