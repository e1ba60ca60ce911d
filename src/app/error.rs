//! Errors surfaced by the `pgqctl` front end

use crate::app::config::ConfigError;
use crate::core::error_handling::ContextualError;
use crate::core::validation::ValidationError;
use crate::queue::{BackendError, QueueError};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("No database URL configured (use --database-url, PGQ_DATABASE_URL or database_url in the configuration file)")]
    MissingDatabaseUrl,

    #[error("Could not connect to the database: {0}")]
    Connect(#[source] BackendError),

    #[error("{0}")]
    NotFound(String),

    #[error("Could not render output: {0}")]
    Render(#[from] serde_json::Error),
}

impl ContextualError for AppError {
    fn is_user_actionable(&self) -> bool {
        match self {
            AppError::Config(error) => error.is_user_actionable(),
            AppError::Queue(error) => error.is_user_actionable(),
            AppError::Invalid(_) | AppError::MissingDatabaseUrl | AppError::NotFound(_) => true,
            AppError::Connect(_) | AppError::Render(_) => false,
        }
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            AppError::Config(error) => error.user_message(),
            AppError::Queue(error) => error.user_message(),
            AppError::Invalid(error) => Some(error.message()),
            AppError::MissingDatabaseUrl => Some(
                "No database URL configured (use --database-url, PGQ_DATABASE_URL or database_url in the configuration file)",
            ),
            AppError::NotFound(message) => Some(message),
            AppError::Connect(_) | AppError::Render(_) => None,
        }
    }
}
