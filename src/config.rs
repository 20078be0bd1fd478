use crate::backtest::DEFAULT_INITIAL_BALANCE;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub dashboard: DashboardConfig,
    pub llm: LlmConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Starting balance of every simulated backtest
    pub initial_balance: f64,
    /// Artificial work delay before generating a price series
    pub backtest_delay_ms: u64,
    /// Artificial work delay before generating episode rewards
    pub training_delay_ms: u64,
    /// Fixed RNG seed; random when unset
    pub seed: Option<u64>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            initial_balance: DEFAULT_INITIAL_BALANCE,
            backtest_delay_ms: 1500,
            training_delay_ms: 2000,
            seed: None,
        }
    }
}

impl DashboardConfig {
    pub fn backtest_delay(&self) -> Duration {
        Duration::from_millis(self.backtest_delay_ms)
    }

    pub fn training_delay(&self) -> Duration {
        Duration::from_millis(self.training_delay_ms)
    }

    /// Same settings without the artificial delays
    pub fn without_delays(mut self) -> Self {
        self.backtest_delay_ms = 0;
        self.training_delay_ms = 0;
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Chat-completions endpoint (OpenAI-compatible)
    pub api_url: String,
    pub model: String,
    /// Falls back to OPENAI_API_KEY when unset
    pub api_key: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Total attempts per request, including the first
    pub max_attempts: u32,
    /// Base backoff, doubled on each retry
    pub retry_delay_ms: u64,
    pub requests_per_minute: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            max_tokens: 512,
            temperature: 0.7,
            max_attempts: 3,
            retry_delay_ms: 2500,
            requests_per_minute: 30,
        }
    }
}

impl LlmConfig {
    /// Configured key, else OPENAI_API_KEY; blank keys count as missing
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .filter(|key| !key.trim().is_empty())
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing filter, overridden by RUST_LOG
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "tradeai=info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the `config` directory and the environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    ///
    /// Layers, lowest first: built-in defaults, `default.toml`,
    /// `{TRADEAI_ENV}.toml`, then `TRADEAI__SECTION__KEY` variables.
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();
        let env_name = std::env::var("TRADEAI_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(File::from(config_dir.join(format!("{}.toml", env_name))).required(false))
            .add_source(
                Environment::with_prefix("TRADEAI")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
