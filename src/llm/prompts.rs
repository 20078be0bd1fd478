//! Prompt templates for the analysis service

use super::{ExplanationInput, SummaryInput};

pub const SUMMARY_SYSTEM_PROMPT: &str = "You are an expert financial analyst summarizing the performance of an AI stock trading agent. Always respond with valid JSON only, no markdown formatting.";

pub const EXPLANATION_SYSTEM_PROMPT: &str =
    "You are an AI trading expert. Always respond with valid JSON only, no markdown formatting.";

/// Prompt for a plain-English backtest summary
pub fn summary_prompt(input: &SummaryInput) -> String {
    format!(
        r#"Given the following metrics from a backtest, provide a concise summary of the agent's performance in plain English.
Be sure to mention the key metrics, such as initial balance, final balance and total profit.
Also, include the episode count and the date range to provide context of the agent's trading period.
Also, mention the stock ticker symbol that the agent traded.

Initial Balance: {:.2}
Final Balance: {:.2}
Total Profit: {:.2}
Number of Episodes: {}
Stock Ticker Symbol: {}
Start Date: {}
End Date: {}

Respond ONLY with valid JSON (no markdown, no code blocks):

{{
  "summary": "A human-readable summary of the stock trading agent performance"
}}
"#,
        input.initial_balance,
        input.final_balance,
        input.total_profit,
        input.episodes,
        input.symbol,
        input.start_date,
        input.end_date,
    )
}

/// Prompt for explaining one hyperparameter
pub fn explanation_prompt(input: &ExplanationInput) -> String {
    format!(
        r#"Explain the following hyperparameter and its effects on the AI trading agent:

Hyperparameter Name: {}

Respond ONLY with valid JSON (no markdown, no code blocks):

{{
  "explanation": "The explanation of the hyperparameter and its effects"
}}
"#,
        input.hyperparameter_name
    )
}
