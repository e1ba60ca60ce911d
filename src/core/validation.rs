//! Caller validation
//!
//! Validation errors are raised locally, before any statement is sent to the
//! backend. They are always preventable by the caller and are reported as
//! user-actionable errors.

use crate::core::error_handling::ContextualError;
use once_cell::sync::Lazy;
use regex::Regex;

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").expect("identifier pattern is valid")
});

/// A parameter-shape violation detected before contacting the backend
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl ContextualError for ValidationError {
    fn is_user_actionable(&self) -> bool {
        true
    }

    fn user_message(&self) -> Option<&str> {
        Some(&self.message)
    }
}

/// Validate an unquoted SQL identifier (used for cursor names)
///
/// Identifiers are interpolated into `FETCH`/`CLOSE` statements, so anything
/// beyond plain letters, digits and underscores is rejected.
pub fn validate_identifier(kind: &str, value: &str) -> Result<(), ValidationError> {
    if IDENTIFIER.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::new(&format!(
            "Invalid {} '{}': expected a plain SQL identifier (letters, digits, underscore; max 63 chars)",
            kind, value
        )))
    }
}
