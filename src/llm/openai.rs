//! OpenAI-compatible chat-completions client for the analysis service
//!
//! Asks for a JSON object reply and validates it against the expected
//! output schema. No request timeout is set: a stalled call stays pending.

use super::prompts::{
    explanation_prompt, summary_prompt, EXPLANATION_SYSTEM_PROMPT, SUMMARY_SYSTEM_PROMPT,
};
use super::{
    parse_structured, AnalysisService, ExplanationInput, ExplanationOutput, StructuredOutput,
    SummaryInput, SummaryOutput,
};
use crate::config::LlmConfig;
use crate::error::LlmError;
use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

// Type alias for the rate limiter to simplify signatures
type LlmRateLimiter = RateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Debug, Deserialize)]
struct MessageContent {
    content: Option<String>,
}

/// Cloneable; clones share the rate limiter
#[derive(Clone)]
pub struct OpenAiClient {
    api_key: String,
    api_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    max_attempts: u32,
    retry_delay: Duration,
    client: reqwest::Client,
    rate_limiter: Arc<LlmRateLimiter>,
}

impl OpenAiClient {
    pub fn new(config: &LlmConfig, api_key: String) -> Self {
        let rpm = NonZeroU32::new(config.requests_per_minute).unwrap_or(NonZeroU32::MIN);

        Self {
            api_key,
            api_url: config.api_url.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            max_attempts: config.max_attempts.max(1),
            retry_delay: config.retry_delay(),
            client: reqwest::Client::new(),
            rate_limiter: Arc::new(RateLimiter::direct(Quota::per_minute(rpm))),
        }
    }

    /// Build a client from config, None when no API key is available
    pub fn from_config(config: &LlmConfig) -> Option<Self> {
        config
            .resolve_api_key()
            .map(|api_key| Self::new(config, api_key))
    }

    /// Delay before retry number `attempt` (1-based), doubling each time
    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.retry_delay.saturating_mul(factor)
    }

    /// Send one structured-prompt request and parse the reply into `T`
    ///
    /// Network errors, 429s, undecodable bodies and schema mismatches are
    /// retried with exponential backoff; other HTTP errors fail at once.
    async fn request_structured<T: StructuredOutput + Send>(
        &self,
        system: &str,
        prompt: String,
    ) -> Result<T, LlmError> {
        let request = ChatRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            response_format: ResponseFormat {
                kind: "json_object".to_string(),
            },
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                Message {
                    role: "user".to_string(),
                    content: prompt,
                },
            ],
        };

        let mut attempt = 0;

        loop {
            if attempt > 0 {
                tokio::time::sleep(self.backoff(attempt)).await;
            }
            attempt += 1;

            self.rate_limiter.until_ready().await;

            let response = match self
                .client
                .post(&self.api_url)
                .header("Authorization", format!("Bearer {}", &self.api_key))
                .header("content-type", "application/json")
                .json(&request)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(
                        "Network error: {} (attempt {}/{})",
                        e,
                        attempt,
                        self.max_attempts
                    );
                    if attempt >= self.max_attempts {
                        return Err(LlmError::Network(e));
                    }
                    continue;
                }
            };

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();

                // Retry on rate limit errors (429)
                if status.as_u16() == 429 {
                    tracing::warn!(
                        "Rate limited by LLM API (429) (attempt {}/{})",
                        attempt,
                        self.max_attempts
                    );
                    if attempt >= self.max_attempts {
                        return Err(LlmError::RateLimited(attempt));
                    }
                    continue;
                }

                // Don't retry on other errors
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    body,
                });
            }

            let chat: ChatResponse = match response.json().await {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!("JSON decode error: {} (attempt {})", e, attempt);
                    if attempt >= self.max_attempts {
                        return Err(LlmError::Decode(e.to_string()));
                    }
                    continue;
                }
            };

            let content = chat
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.message.content)
                .unwrap_or_default();

            match parse_structured::<T>(&content) {
                Ok(output) => return Ok(output),
                Err(e) => {
                    tracing::warn!("{} (attempt {})", e, attempt);
                    if attempt >= self.max_attempts {
                        return Err(e);
                    }
                }
            }
        }
    }
}

#[async_trait]
impl AnalysisService for OpenAiClient {
    async fn analyze_summary(&self, input: &SummaryInput) -> Result<SummaryOutput, LlmError> {
        tracing::debug!(symbol = %input.symbol, "Requesting backtest summary");
        self.request_structured(SUMMARY_SYSTEM_PROMPT, summary_prompt(input))
            .await
    }

    async fn explain_hyperparameter(
        &self,
        input: &ExplanationInput,
    ) -> Result<ExplanationOutput, LlmError> {
        tracing::debug!(term = %input.hyperparameter_name, "Requesting explanation");
        self.request_structured(EXPLANATION_SYSTEM_PROMPT, explanation_prompt(input))
            .await
    }
}
