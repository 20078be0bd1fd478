use std::fmt;
use thiserror::Error;

/// Form fields that can carry a validation message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    Symbol,
    StartDate,
    EndDate,
    Gamma,
    Epsilon,
    EpsilonMin,
    EpsilonDecay,
    LearningRate,
    Episodes,
    BatchSize,
}

impl FormField {
    /// Wire name of the field (camelCase, as in the JSON state)
    pub fn name(&self) -> &'static str {
        match self {
            FormField::Symbol => "symbol",
            FormField::StartDate => "startDate",
            FormField::EndDate => "endDate",
            FormField::Gamma => "gamma",
            FormField::Epsilon => "epsilon",
            FormField::EpsilonMin => "epsilonMin",
            FormField::EpsilonDecay => "epsilonDecay",
            FormField::LearningRate => "learningRate",
            FormField::Episodes => "episodes",
            FormField::BatchSize => "batchSize",
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A message attached to a single form field
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: FormField,
    pub message: String,
}

/// All field errors of one form submission
#[derive(Error, Debug, Clone, PartialEq, Default)]
#[error("{}", join_errors(.0))]
pub struct FieldErrors(Vec<ValidationError>);

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl FieldErrors {
    pub fn push(&mut self, field: FormField, message: impl Into<String>) {
        self.0.push(ValidationError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// First message recorded for `field`
    pub fn get(&self, field: FormField) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.iter()
    }

    /// `Ok(value)` when no field failed
    pub fn into_result<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

/// Dashboard controls that start a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Backtest,
    Training,
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Control::Backtest => f.write_str("backtest"),
            Control::Training => f.write_str("training"),
        }
    }
}

/// Why a form submission did not start a run
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubmitError {
    #[error("Invalid input: {0}")]
    Validation(#[from] FieldErrors),

    /// The control is disabled while its previous run is in flight
    #[error("A {0} run is already in progress")]
    Busy(Control),
}

/// Failures of the text-generation service
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("LLM service not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("LLM API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Rate limited after {0} attempts")]
    RateLimited(u32),

    #[error("JSON decode error: {0}")]
    Decode(String),

    #[error("Malformed output: {0}")]
    MalformedOutput(String),
}
