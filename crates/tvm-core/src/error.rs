use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TvmError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Financial impossibility: {0}")]
    FinancialImpossibility(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Numeric overflow in {context}")]
    NumericOverflow { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for TvmError {
    fn from(e: serde_json::Error) -> Self {
        TvmError::SerializationError(e.to_string())
    }
}

impl From<ValidationErrors> for TvmError {
    fn from(errors: ValidationErrors) -> Self {
        TvmError::Validation(errors)
    }
}

/// Field name -> reason map collected while checking a calculator's inputs.
/// Every failing field is recorded before the calculator returns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors {
    pub fields: BTreeMap<String, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, reason: impl Into<String>) {
        // First reason per field wins
        self.fields
            .entry(field.to_string())
            .or_insert_with(|| reason.into());
    }

    /// Record `reason` against `field` when `failed` holds.
    pub fn check(&mut self, failed: bool, field: &str, reason: &str) {
        if failed {
            self.add(field, reason);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// `Ok(())` when nothing was recorded, otherwise the collected map as an error.
    pub fn into_result(self) -> Result<(), TvmError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(TvmError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .fields
            .iter()
            .map(|(field, reason)| format!("{field}: {reason}"))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}
