//! Queue Error Types

use crate::core::error_handling::ContextualError;
use crate::core::validation::ValidationError;
use crate::queue::executor::BackendError;

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// Parameter-shape violation caught before any backend call
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Failure reported by the executor, passed through untranslated
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// A result row did not have the shape the remote procedure promises
    #[error("Unexpected value for '{field}': expected {expected}, found {found}")]
    Decode {
        field: String,
        expected: &'static str,
        found: String,
    },
}

impl QueueError {
    pub fn decode(field: &str, expected: &'static str, found: impl Into<String>) -> Self {
        Self::Decode {
            field: field.to_string(),
            expected,
            found: found.into(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// The executor's error, if this is a backend failure
    pub fn backend(&self) -> Option<&BackendError> {
        match self {
            Self::Backend(error) => Some(error),
            _ => None,
        }
    }
}

impl ContextualError for QueueError {
    fn is_user_actionable(&self) -> bool {
        self.is_validation()
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            Self::Validation(error) => Some(error.message()),
            _ => None,
        }
    }
}

/// Result type for queue operations
pub type QueueResult<T> = Result<T, QueueError>;
