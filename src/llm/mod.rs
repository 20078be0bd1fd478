// Text-generation collaborators: backtest summaries and hyperparameter explanations
pub mod explanations;
pub mod openai;
pub mod prompts;

pub use explanations::{ExplanationCache, ExplanationState};
pub use openai::OpenAiClient;

use crate::error::LlmError;
use crate::models::PerformanceMetrics;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Shown in place of a summary the service could not produce
pub const SUMMARY_FALLBACK: &str = "Could not load AI summary.";
/// Shown in place of an explanation the service could not produce
pub const EXPLANATION_FALLBACK: &str = "Could not load explanation.";

/// Input of the backtest summary request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryInput {
    pub initial_balance: f64,
    pub final_balance: f64,
    pub total_profit: f64,
    pub episodes: u32,
    pub symbol: String,
    pub start_date: String,
    pub end_date: String,
}

impl From<&PerformanceMetrics> for SummaryInput {
    fn from(metrics: &PerformanceMetrics) -> Self {
        Self {
            initial_balance: metrics.initial_balance,
            final_balance: metrics.final_balance,
            total_profit: metrics.total_profit,
            episodes: metrics.episodes_for_training,
            symbol: metrics.symbol.clone(),
            start_date: metrics.start_date.format("%Y-%m-%d").to_string(),
            end_date: metrics.end_date.format("%Y-%m-%d").to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryOutput {
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplanationInput {
    pub hyperparameter_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplanationOutput {
    pub explanation: String,
}

/// Structured output with a single free-text field
pub trait StructuredOutput: DeserializeOwned {
    fn text(&self) -> &str;
}

impl StructuredOutput for SummaryOutput {
    fn text(&self) -> &str {
        &self.summary
    }
}

impl StructuredOutput for ExplanationOutput {
    fn text(&self) -> &str {
        &self.explanation
    }
}

/// Parse a model reply into `T`, rejecting anything that does not match the schema
///
/// Markdown code fences around the JSON are tolerated. Blank text is malformed.
pub fn parse_structured<T: StructuredOutput>(raw: &str) -> Result<T, LlmError> {
    let mut text = raw.trim();

    // Strip markdown code blocks (```json ... ``` or ``` ... ```)
    if text.starts_with("```") {
        text = text
            .trim_start_matches("```json")
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim();
    }

    let output: T = serde_json::from_str(text)
        .map_err(|e| LlmError::MalformedOutput(format!("{} (text: {})", e, text)))?;

    if output.text().trim().is_empty() {
        return Err(LlmError::MalformedOutput("empty text field".to_string()));
    }

    Ok(output)
}

/// Structured-prompt text generation backing the dashboard
#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// Summarize a backtest in plain English
    async fn analyze_summary(&self, input: &SummaryInput) -> Result<SummaryOutput, LlmError>;

    /// Explain what a hyperparameter does to the agent
    async fn explain_hyperparameter(
        &self,
        input: &ExplanationInput,
    ) -> Result<ExplanationOutput, LlmError>;
}

/// Service used when no API key is configured; every request fails
pub struct UnconfiguredService;

#[async_trait]
impl AnalysisService for UnconfiguredService {
    async fn analyze_summary(&self, _input: &SummaryInput) -> Result<SummaryOutput, LlmError> {
        Err(LlmError::NotConfigured("no API key".to_string()))
    }

    async fn explain_hyperparameter(
        &self,
        _input: &ExplanationInput,
    ) -> Result<ExplanationOutput, LlmError> {
        Err(LlmError::NotConfigured("no API key".to_string()))
    }
}

/// Summary text for `metrics`, or [`SUMMARY_FALLBACK`] if the service fails
pub async fn summarize(service: &dyn AnalysisService, metrics: &PerformanceMetrics) -> String {
    let input = SummaryInput::from(metrics);

    match service.analyze_summary(&input).await {
        Ok(output) => output.summary,
        Err(e) => {
            tracing::error!(symbol = %metrics.symbol, "Failed to fetch AI summary: {}", e);
            SUMMARY_FALLBACK.to_string()
        }
    }
}

/// Explanation of `term`, or [`EXPLANATION_FALLBACK`] if the service fails
pub async fn explain(service: &dyn AnalysisService, term: &str) -> String {
    let input = ExplanationInput {
        hyperparameter_name: term.to_string(),
    };

    match service.explain_hyperparameter(&input).await {
        Ok(output) => output.explanation,
        Err(e) => {
            tracing::error!(term, "Failed to fetch explanation: {}", e);
            EXPLANATION_FALLBACK.to_string()
        }
    }
}
