// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::types::Selector;

/// Command-line arguments for `blockrun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "blockrun",
    version,
    about = "Start, stop and inspect named groups of shell commands.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the block definition file.
    ///
    /// If omitted, `BLOCKRUN_FILE` or `Blockfile` in the current directory is used.
    #[arg(long, short = 'f', global = true, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Path to the process registry file.
    ///
    /// If omitted, `BLOCKRUN_REGISTRY` or `.blockrun.json` is used.
    #[arg(long, global = true, value_name = "PATH")]
    pub registry: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `BLOCKRUN_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Start the commands of a block (`all` for every defined block).
    Run {
        #[arg(value_name = "BLOCK|all")]
        target: Selector,

        /// Relaunch a registered block if none of its processes is alive.
        #[arg(long)]
        reap_stale: bool,
    },

    /// Terminate every tracked process of a block (`all` for every running block).
    Kill {
        #[arg(value_name = "BLOCK|all")]
        target: Selector,

        /// Seconds to wait before force-killing processes that are still alive.
        #[arg(long, value_name = "SECS", default_value_t = 0)]
        grace: u64,
    },

    /// Report whether the tracked processes of a block are alive.
    Status {
        #[arg(value_name = "BLOCK|all")]
        target: Selector,
    },

    /// List running blocks and their pids.
    List,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
