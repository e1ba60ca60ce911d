//! Command-line arguments for `pgqctl`
//!
//! Global options come first, then exactly one subcommand. Values given here
//! (including `PGQ_DATABASE_URL`) override the configuration file.

use crate::queue::Interval;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "pgqctl")]
#[command(about = "Administer and inspect PgQ queues")]
#[command(version, long_version = crate::core::version::long_version())]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Configuration file path
    #[arg(short = 'c', long = "config", value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// PostgreSQL connection URL
    #[arg(
        short = 'd',
        long = "database-url",
        value_name = "URL",
        env = "PGQ_DATABASE_URL",
        hide_env_values = true,
        global = true
    )]
    pub database_url: Option<String>,

    /// Maximum pooled connections
    #[arg(long = "max-connections", value_name = "COUNT", global = true)]
    pub max_connections: Option<u32>,

    /// Log level
    #[arg(short = 'l', long = "log-level", value_name = "LEVEL", global = true,
          value_parser = ["trace", "debug", "info", "warn", "error", "off"])]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(short = 'o', long = "log-format", value_name = "FORMAT", global = true,
          value_parser = ["text", "ext", "json"])]
    pub log_format: Option<String>,

    /// Log file path (use 'none' to disable file logging)
    #[arg(short = 'f', long = "log-file", value_name = "FILE", global = true)]
    pub log_file: Option<String>,

    /// More log output (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Less log output (repeatable)
    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true, conflicts_with = "verbose")]
    pub quiet: u8,

    /// Force colored output
    #[arg(long = "color", global = true, conflicts_with = "no_color")]
    pub color: bool,

    /// Disable colored output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Print results as JSON instead of tables
    #[arg(long = "json", global = true)]
    pub json: bool,
}

impl GlobalArgs {
    /// Net verbosity: `-v` counts up, `-q` counts down
    pub fn verbosity(&self) -> i8 {
        let verbose = i8::try_from(self.verbose).unwrap_or(i8::MAX);
        let quiet = i8::try_from(self.quiet).unwrap_or(i8::MAX);
        verbose.saturating_sub(quiet)
    }

    /// `Some(true)` for `--color`, `Some(false)` for `--no-color`
    pub fn color_override(&self) -> Option<bool> {
        match (self.color, self.no_color) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Show client and PgQ versions
    Version,

    /// Create a queue
    CreateQueue { queue: String },

    /// Drop a queue and its events
    DropQueue {
        queue: String,
        /// Drop even if consumers are still registered
        #[arg(long)]
        force: bool,
    },

    /// Set one queue configuration parameter
    SetConfig {
        queue: String,
        key: String,
        value: String,
    },

    /// Show queue information
    Queues { queue: Option<String> },

    /// Show consumer information
    Consumers {
        #[arg(long)]
        queue: Option<String>,
        #[arg(long, requires = "queue")]
        consumer: Option<String>,
    },

    /// Show the event table currently receiving inserts
    CurrentTable { queue: String },

    /// Insert one event
    Insert {
        queue: String,
        ev_type: String,
        data: String,
        /// Extra field value, up to four (repeatable)
        #[arg(long = "extra", value_name = "VALUE", action = ArgAction::Append)]
        extra: Vec<String>,
    },

    /// Register a consumer
    Register {
        queue: String,
        consumer: String,
        /// Start from this tick instead of the current one
        #[arg(long = "at", value_name = "TICK")]
        at: Option<i64>,
    },

    /// Unregister a consumer
    Unregister { queue: String, consumer: String },

    /// Show batch timing and sequence range
    BatchInfo { batch_id: i64 },

    /// Run one ticker step, or insert an externally numbered tick
    Tick {
        queue: String,
        #[arg(long = "tick-id", value_name = "TICK")]
        tick_id: Option<i64>,
    },

    /// Force a tick on the queue
    ForceTick {
        queue: String,
        /// Poll until the queue's last tick moves
        #[arg(long)]
        wait: bool,
        /// Polls before giving up
        #[arg(long, default_value_t = 10, requires = "wait")]
        attempts: usize,
        /// Delay between polls, e.g. "500ms" or "00:00:01"
        #[arg(long, default_value = "500ms", requires = "wait")]
        delay: Interval,
    },
}

impl Command {
    /// Operation name used when reporting failures
    pub fn name(&self) -> &'static str {
        match self {
            Command::Version => "version",
            Command::CreateQueue { .. } => "create-queue",
            Command::DropQueue { .. } => "drop-queue",
            Command::SetConfig { .. } => "set-config",
            Command::Queues { .. } => "queues",
            Command::Consumers { .. } => "consumers",
            Command::CurrentTable { .. } => "current-table",
            Command::Insert { .. } => "insert",
            Command::Register { .. } => "register",
            Command::Unregister { .. } => "unregister",
            Command::BatchInfo { .. } => "batch-info",
            Command::Tick { .. } => "tick",
            Command::ForceTick { .. } => "force-tick",
        }
    }
}
