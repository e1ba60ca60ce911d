//! TOML configuration file loading
//!
//! `pgqctl` reads `--config FILE` if given (it must exist), otherwise
//! `<config dir>/pgqctl/pgqctl.toml` if present, otherwise built-in defaults.
//! Command-line options and `PGQ_DATABASE_URL` override file values.
//!
//! ```toml
//! database_url = "postgres://pgq@localhost/events"
//! max_connections = 4
//! log_level = "info"
//! log_format = "text"
//! log_file = "none"
//! color = true
//! ```

use crate::app::cli::args::GlobalArgs;
use crate::core::error_handling::ContextualError;
use crate::core::validation::ValidationError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];
const LOG_FORMATS: [&str; 3] = ["text", "ext", "json"];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("The specified configuration file does not exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Error reading configuration file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error parsing configuration file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

impl ContextualError for ConfigError {
    fn is_user_actionable(&self) -> bool {
        matches!(self, ConfigError::Invalid(_))
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            ConfigError::Invalid(error) => Some(error.message()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PgqConfig {
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub log_level: Option<String>,
    pub log_format: Option<String>,
    pub log_file: Option<String>,
    pub color: Option<bool>,
}

impl Default for PgqConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            log_level: None,
            log_format: None,
            log_file: None,
            color: None,
        }
    }
}

impl PgqConfig {
    /// `<config dir>/pgqctl/pgqctl.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("pgqctl").join("pgqctl.toml"))
    }

    /// Load the explicit file, or the default file if it exists
    pub async fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match config_file {
            Some(path) if !path.exists() => return Err(ConfigError::NotFound(path.to_path_buf())),
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) if path.exists() => path,
                _ => {
                    log::trace!("No configuration file found, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        let contents =
            tokio::fs::read_to_string(&path)
                .await
                .map_err(|source| ConfigError::Read {
                    path: path.clone(),
                    source,
                })?;
        let config = Self::parse(&path, &contents)?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse and validate configuration text read from `path`
    pub fn parse(path: &Path, contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_connections == 0 {
            return Err(ValidationError::new("max_connections must be at least 1"));
        }
        if let Some(level) = self.log_level.as_deref() {
            if !LOG_LEVELS.contains(&level) {
                return Err(ValidationError::new(&format!(
                    "Invalid log_level '{}': expected one of {}",
                    level,
                    LOG_LEVELS.join(", ")
                )));
            }
        }
        if let Some(format) = self.log_format.as_deref() {
            if !LOG_FORMATS.contains(&format) {
                return Err(ValidationError::new(&format!(
                    "Invalid log_format '{}': expected one of {}",
                    format,
                    LOG_FORMATS.join(", ")
                )));
            }
        }
        Ok(())
    }

    /// Apply command-line values on top of the file values
    pub fn with_overrides(mut self, args: &GlobalArgs) -> Self {
        if let Some(url) = &args.database_url {
            self.database_url = Some(url.clone());
        }
        if let Some(max) = args.max_connections {
            self.max_connections = max;
        }
        if let Some(level) = &args.log_level {
            self.log_level = Some(level.clone());
        }
        if let Some(format) = &args.log_format {
            self.log_format = Some(format.clone());
        }
        if let Some(file) = &args.log_file {
            self.log_file = Some(file.clone());
        }
        if let Some(color) = args.color_override() {
            self.color = Some(color);
        }
        self
    }
}
