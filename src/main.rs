use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tradeai::config::AppConfig;
use tradeai::llm::{AnalysisService, OpenAiClient, UnconfiguredService};
use tradeai::report::{render_json, summary_unavailable, Report};
use tradeai::validation::BacktestForm;
use tradeai::{Dashboard, Hyperparameters, SubmitError};
use tracing_subscriber::EnvFilter;

/// Mock RL trading dashboard with AI-written summaries
#[derive(Parser, Debug)]
#[command(name = "tradeai")]
#[command(version, about = "Mock RL trading dashboard with AI-written summaries")]
struct Cli {
    /// Seed for the mock data generators
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Print the dashboard state as JSON instead of a text report
    #[arg(long, global = true)]
    json: bool,

    /// Skip the artificial work delays
    #[arg(long, global = true)]
    no_delay: bool,

    /// Price rows to show in the text report
    #[arg(long, global = true, default_value = "10")]
    tail: usize,

    /// Directory holding default.toml and environment overrides
    #[arg(long, global = true, default_value = "config")]
    config_dir: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open the dashboard: default AAPL backtest for 2023 plus a training run
    Dashboard,

    /// Run a backtest over a date range
    Backtest {
        #[arg(short, long, default_value = "AAPL")]
        symbol: String,
        /// Start date (YYYY-MM-DD)
        #[arg(long, default_value = "2020-01-01")]
        start: NaiveDate,
        /// End date (YYYY-MM-DD), must be after start
        #[arg(long, default_value = "2025-02-14")]
        end: NaiveDate,
    },

    /// Train the agent with the given hyperparameters
    Train {
        #[arg(long, default_value = "0.95")]
        gamma: f64,
        #[arg(long, default_value = "1.0")]
        epsilon: f64,
        #[arg(long, default_value = "0.01")]
        epsilon_min: f64,
        #[arg(long, default_value = "0.995")]
        epsilon_decay: f64,
        #[arg(long, default_value = "0.001")]
        learning_rate: f64,
        #[arg(long, default_value = "50")]
        episodes: u32,
        #[arg(long, default_value = "32")]
        batch_size: u32,
    },

    /// Explain a hyperparameter, e.g. "Learning Rate"
    Explain { term: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = AppConfig::load_from(&cli.config_dir).context("Failed to load configuration")?;
    setup_logging(&config.logging.level);

    let mut settings = config.dashboard.clone();
    if cli.seed.is_some() {
        settings.seed = cli.seed;
    }
    if cli.no_delay {
        settings = settings.without_delays();
    }

    let dashboard = Dashboard::new(create_service(&config), settings);

    match cli.command.unwrap_or(Command::Dashboard) {
        Command::Dashboard => dashboard.initialize().await,
        Command::Backtest { symbol, start, end } => {
            let form = BacktestForm::new(symbol, start, end);
            report_submit(dashboard.submit_backtest(&form).await)?;
        }
        Command::Train {
            gamma,
            epsilon,
            epsilon_min,
            epsilon_decay,
            learning_rate,
            episodes,
            batch_size,
        } => {
            let hyperparameters = Hyperparameters {
                gamma,
                epsilon,
                epsilon_min,
                epsilon_decay,
                learning_rate,
                episodes,
                batch_size,
            };
            report_submit(dashboard.submit_training(&hyperparameters).await)?;
        }
        Command::Explain { term } => {
            let explanation = dashboard.explain(&term).await;
            println!("\n{}\n\n{}\n", term, explanation);
            return Ok(());
        }
    }

    let state = dashboard.state();
    if cli.json {
        let json = render_json(&state).map_err(|e| anyhow::anyhow!("{}", e))?;
        println!("{}", json);
    } else {
        print!("{}", Report::new(&state).with_tail(cli.tail));
        println!();
    }

    if summary_unavailable(&state) {
        tracing::warn!("AI summary unavailable, set OPENAI_API_KEY to enable it");
    }

    Ok(())
}

// ============================================================================
// Initialization Functions
// ============================================================================

fn setup_logging(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn create_service(config: &AppConfig) -> Arc<dyn AnalysisService> {
    match OpenAiClient::from_config(&config.llm) {
        Some(client) => {
            tracing::info!(model = %config.llm.model, "AI analysis enabled");
            Arc::new(client)
        }
        None => {
            tracing::warn!("OPENAI_API_KEY not set, AI analysis will use fallback text");
            Arc::new(UnconfiguredService)
        }
    }
}

/// Print field errors the way the form would show them
fn report_submit(result: std::result::Result<(), SubmitError>) -> Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(SubmitError::Validation(errors)) => {
            for error in errors.iter() {
                eprintln!("  ✗ {}: {}", error.field, error.message);
            }
            bail!("Invalid input")
        }
        Err(e) => Err(e.into()),
    }
}
