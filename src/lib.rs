// Core modules
pub mod backtest;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod indicators;
pub mod llm;
pub mod models;
pub mod report;
pub mod training;
pub mod validation;

// Re-export commonly used types
pub use dashboard::{Dashboard, DashboardState};
pub use error::{LlmError, SubmitError};
pub use models::*;

// Error handling
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;
