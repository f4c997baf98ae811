// src/errors.rs

//! Crate-wide error type and result alias.
//!
//! Whole-operation failures (missing definition file, missing registry) are
//! returned as `Err`. Per-item failures (one line, one PID, one block in an
//! `all` batch) are carried as values inside the controller reports, using the
//! same enum so callers can match on them uniformly.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BlockrunError {
    #[error("Block definition file not found: {}", .0.display())]
    DefinitionNotFound(PathBuf),

    #[error("Block not found: {0}")]
    BlockNotFound(String),

    #[error("Block '{name}' opened on line {line} is never closed")]
    UnterminatedBlock { name: String, line: usize },

    #[error("Block '{block}' is already running (pids: {pids:?})")]
    AlreadyRunning { block: String, pids: Vec<u32> },

    #[error("Failed to launch `{command}`: {source}")]
    LaunchFailure {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to terminate pid {pid}: {source}")]
    TerminationFailure {
        pid: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("No blocks running (registry {} does not exist)", .0.display())]
    RegistryMissing(PathBuf),

    #[error("Registry file {} is unreadable: {source}", .path.display())]
    RegistryCorrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, BlockrunError>;
