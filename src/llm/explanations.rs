use super::{AnalysisService, ExplanationInput, ExplanationOutput, EXPLANATION_FALLBACK};
use crate::error::LlmError;
use std::collections::HashMap;

pub const EXPLANATION_IDLE_TEXT: &str = "Hover to load explanation.";
pub const EXPLANATION_LOADING_TEXT: &str = "Loading explanation...";

/// Lookup state of one term
#[derive(Debug, Clone, PartialEq)]
pub enum ExplanationState {
    /// Request started and not finished
    Pending,
    Resolved(String),
    /// Request failed; holds the fallback text
    Failed(String),
}

/// Per-term explanation cache
///
/// Each term is requested at most once per session. A failed lookup is
/// memoised with its fallback text just like a resolved one. A lookup whose
/// future is dropped mid-flight stays `Pending` for good.
#[derive(Debug, Clone, Default)]
pub struct ExplanationCache {
    entries: HashMap<String, ExplanationState>,
}

impl ExplanationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, term: &str) -> Option<&ExplanationState> {
        self.entries.get(term)
    }

    /// Text the popover shows for `term` right now
    pub fn display_text(&self, term: &str) -> &str {
        match self.entries.get(term) {
            None => EXPLANATION_IDLE_TEXT,
            Some(ExplanationState::Pending) => EXPLANATION_LOADING_TEXT,
            Some(ExplanationState::Resolved(text)) | Some(ExplanationState::Failed(text)) => text,
        }
    }

    /// Mark `term` as pending unless it was already requested
    ///
    /// Returns the current text when the term was requested before; `None`
    /// means the caller should ask the service and report back via `finish`.
    pub fn begin(&mut self, term: &str) -> Option<String> {
        if self.entries.contains_key(term) {
            tracing::debug!(term, "Explanation already requested");
            return Some(self.display_text(term).to_string());
        }

        self.entries
            .insert(term.to_string(), ExplanationState::Pending);
        None
    }

    /// Record the service result for `term` and return the text to show
    pub fn finish(&mut self, term: &str, result: Result<ExplanationOutput, LlmError>) -> String {
        let state = match result {
            Ok(output) => ExplanationState::Resolved(output.explanation),
            Err(e) => {
                tracing::error!(term, "Failed to fetch explanation: {}", e);
                ExplanationState::Failed(EXPLANATION_FALLBACK.to_string())
            }
        };

        self.entries.insert(term.to_string(), state);
        self.display_text(term).to_string()
    }

    /// Fetch the explanation for `term` unless it was already requested
    pub async fn fetch(&mut self, service: &dyn AnalysisService, term: &str) -> String {
        if let Some(text) = self.begin(term) {
            return text;
        }

        let input = ExplanationInput {
            hyperparameter_name: term.to_string(),
        };
        let result = service.explain_hyperparameter(&input).await;
        self.finish(term, result)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
