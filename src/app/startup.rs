//! `pgqctl` startup: configuration, logging, connection, dispatch

use crate::app::cli::args::{Cli, Command};
use crate::app::cli::display::Output;
use crate::app::commands;
use crate::app::config::PgqConfig;
use crate::app::error::AppError;
use crate::core::error_handling::log_error_with_context;
use crate::core::logging::{init_logging, level_for_verbosity};
use crate::core::styles::StyleRole;
use crate::core::version::long_version;
use crate::queue::{PgExecutor, PgqClient};
use clap::Parser;
use std::io::IsTerminal;
use std::sync::Arc;

/// Parse arguments, run the requested command, and return the exit code
pub async fn startup() -> i32 {
    let cli = Cli::parse();

    let config = match PgqConfig::load(cli.global.config.as_deref()).await {
        Ok(config) => config.with_overrides(&cli.global),
        Err(err) => {
            eprintln!("Error: {}", err);
            return 1;
        }
    };

    let color = config
        .color
        .unwrap_or_else(|| std::io::stdout().is_terminal());
    let log_level = match cli.global.verbosity() {
        0 => config.log_level.clone(),
        verbosity => Some(level_for_verbosity(verbosity).to_string()),
    };
    if let Err(err) = init_logging(
        log_level.as_deref(),
        config.log_format.as_deref(),
        config.log_file.as_deref(),
        color,
    ) {
        eprintln!("Error: could not initialise logging: {}", err);
        return 1;
    }
    log::debug!("pgqctl {}", long_version());

    let output = Output {
        json: cli.global.json,
        color,
    };
    match execute(&cli.command, &config, output).await {
        Ok(()) => 0,
        Err(err) => {
            log_error_with_context(&err, cli.command.name());
            1
        }
    }
}

async fn execute(command: &Command, config: &PgqConfig, output: Output) -> Result<(), AppError> {
    let Some(database_url) = config.database_url.as_deref() else {
        // The client version needs no database
        if *command == Command::Version {
            output.status(StyleRole::Key, &format!("pgqctl {}", long_version()));
            return Ok(());
        }
        return Err(AppError::MissingDatabaseUrl);
    };

    let executor = PgExecutor::connect(database_url, config.max_connections)
        .await
        .map_err(AppError::Connect)?;
    let client = PgqClient::new(Arc::new(executor));
    commands::run(command, &client, output).await
}
