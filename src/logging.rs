// src/logging.rs

//! Diagnostics go through `tracing`; this installs the stderr subscriber.
//!
//! The level is the first of: `--log-level`, the `BLOCKRUN_LOG` environment
//! variable, `warn`. Stdout stays reserved for report lines and for the
//! output of commands that inherit it.

use anyhow::{Result, anyhow};
use tracing::Level;
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

pub const LOG_ENV: &str = "BLOCKRUN_LOG";

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env_value = std::env::var(LOG_ENV).ok();
    let level = resolve_level(cli_level, env_value.as_deref());

    fmt()
        .with_max_level(level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("installing log subscriber: {e}"))
}

/// Unparsable environment values fall through to the default.
fn resolve_level(cli_level: Option<LogLevel>, env_value: Option<&str>) -> Level {
    cli_level
        .map(Level::from)
        .or_else(|| env_value.and_then(|v| v.trim().parse::<Level>().ok()))
        .unwrap_or(Level::WARN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_beats_environment() {
        assert_eq!(
            resolve_level(Some(LogLevel::Debug), Some("error")),
            Level::DEBUG
        );
    }

    #[test]
    fn environment_is_case_insensitive() {
        assert_eq!(resolve_level(None, Some(" INFO ")), Level::INFO);
    }

    #[test]
    fn garbage_or_missing_env_defaults_to_warn() {
        assert_eq!(resolve_level(None, Some("loud")), Level::WARN);
        assert_eq!(resolve_level(None, None), Level::WARN);
    }
}
