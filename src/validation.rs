//! Form validation for the backtest and training controls.
//!
//! Failures are returned as field-level messages; a form that fails
//! validation never reaches a generator.

use crate::error::{FieldErrors, FormField};
use crate::models::Hyperparameters;
use crate::training::HYPERPARAMETER_FIELDS;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const MAX_SYMBOL_LEN: usize = 10;

/// Raw backtest form input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestForm {
    pub symbol: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl Default for BacktestForm {
    fn default() -> Self {
        Self {
            symbol: "AAPL".to_string(),
            start_date: NaiveDate::from_ymd_opt(2020, 1, 1),
            end_date: NaiveDate::from_ymd_opt(2025, 2, 14),
        }
    }
}

/// A backtest request that passed validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestRequest {
    /// Upper-cased ticker
    pub symbol: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl BacktestForm {
    pub fn new(symbol: impl Into<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            symbol: symbol.into(),
            start_date: Some(start_date),
            end_date: Some(end_date),
        }
    }

    /// Check the form. Date ordering is only checked once every field is present and well-formed.
    pub fn validate(&self) -> Result<BacktestRequest, FieldErrors> {
        let mut errors = FieldErrors::default();

        let symbol_len = self.symbol.chars().count();
        if symbol_len == 0 {
            errors.push(FormField::Symbol, "Symbol is required");
        } else if symbol_len > MAX_SYMBOL_LEN {
            errors.push(FormField::Symbol, "Symbol too long");
        }
        if self.start_date.is_none() {
            errors.push(FormField::StartDate, "Start date is required.");
        }
        if self.end_date.is_none() {
            errors.push(FormField::EndDate, "End date is required.");
        }

        let (start_date, end_date) = match (self.start_date, self.end_date) {
            (Some(start), Some(end)) if errors.is_empty() => (start, end),
            _ => return Err(errors),
        };

        if end_date <= start_date {
            errors.push(FormField::EndDate, "End date must be after start date.");
        }

        errors.into_result(BacktestRequest {
            symbol: self.symbol.to_uppercase(),
            start_date,
            end_date,
        })
    }
}

/// Check every hyperparameter against its accepted range
pub fn validate_hyperparameters(hp: &Hyperparameters) -> Result<Hyperparameters, FieldErrors> {
    let mut errors = FieldErrors::default();

    for field in HYPERPARAMETER_FIELDS.iter() {
        let value = field.value(hp);
        if !field.valid.contains(&value) {
            errors.push(
                field.field,
                format!(
                    "{} must be between {} and {}",
                    field.label,
                    field.valid.start(),
                    field.valid.end()
                ),
            );
        }
    }

    errors.into_result(hp.clone())
}
