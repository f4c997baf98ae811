// src/config/loader.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::blocks::DefinitionFile;
use crate::cli::{CliArgs, Command};
use crate::errors::{BlockrunError, Result};
use crate::fs::FileSystem;
use crate::registry::REGISTRY_FILE;

/// Default definition file name, relative to the working directory.
pub const DEFINITION_FILE: &str = "Blockfile";

pub const FILE_ENV: &str = "BLOCKRUN_FILE";
pub const REGISTRY_ENV: &str = "BLOCKRUN_REGISTRY";

/// Resolved runtime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub definition_path: PathBuf,
    pub registry_path: PathBuf,
    /// Wait before force-killing survivors on `kill`. Zero disables it.
    pub kill_grace: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            definition_path: PathBuf::from(DEFINITION_FILE),
            registry_path: PathBuf::from(REGISTRY_FILE),
            kill_grace: Duration::ZERO,
        }
    }
}

impl Settings {
    /// Resolve settings from CLI flags, then the process environment, then
    /// defaults.
    pub fn resolve(args: &CliArgs) -> Self {
        Self::resolve_with(args, |key| std::env::var(key).ok())
    }

    /// Same as [`Settings::resolve`] with an explicit environment lookup.
    pub fn resolve_with(args: &CliArgs, env: impl Fn(&str) -> Option<String>) -> Self {
        let from_env = |key: &str| env(key).filter(|v| !v.trim().is_empty()).map(PathBuf::from);

        let defaults = Settings::default();
        let definition_path = args
            .file
            .clone()
            .or_else(|| from_env(FILE_ENV))
            .unwrap_or(defaults.definition_path);
        let registry_path = args
            .registry
            .clone()
            .or_else(|| from_env(REGISTRY_ENV))
            .unwrap_or(defaults.registry_path);
        let kill_grace = match args.command {
            Command::Kill { grace, .. } => Duration::from_secs(grace),
            _ => defaults.kill_grace,
        };

        Settings {
            definition_path,
            registry_path,
            kill_grace,
        }
    }
}

/// Read and parse the block definition file.
///
/// A missing file is [`BlockrunError::DefinitionNotFound`]; nothing else is
/// touched in that case.
pub fn load_definitions(fs: &dyn FileSystem, path: &Path) -> Result<DefinitionFile> {
    if !fs.is_file(path) {
        return Err(BlockrunError::DefinitionNotFound(path.to_path_buf()));
    }

    let source = fs.read_to_string(path)?;
    let file = DefinitionFile::parse(&source);
    debug!(path = ?path, blocks = file.entries().len(), "loaded block definitions");
    Ok(file)
}
