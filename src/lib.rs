// src/lib.rs

pub mod blocks;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod registry;
pub mod types;

use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use crate::cli::{CliArgs, Command};
use crate::config::Settings;
use crate::engine::{BlockController, KillOptions, RunOptions};
use crate::exec::{NativeProcessControl, ShellLauncher};
use crate::fs::{FileSystem, RealFileSystem};
use crate::registry::FileRegistryStore;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - settings resolution (flags, environment, defaults)
/// - the JSON registry store on the real filesystem
/// - the shell launcher and native process control
/// - the block controller, whose report is printed to stdout
///
/// Per-item failures are part of the printed report and do not make this
/// return `Err`; only unmet preconditions do.
pub async fn run(args: CliArgs) -> Result<()> {
    let settings = Settings::resolve(&args);
    debug!(?settings, "resolved settings");

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let store = FileRegistryStore::new(Arc::clone(&fs), settings.registry_path.clone());
    let mut controller = BlockController::new(
        fs,
        settings.definition_path.clone(),
        store,
        ShellLauncher::new(),
        NativeProcessControl,
    );

    match args.command {
        Command::Run { target, reap_stale } => {
            let report = controller.run(&target, RunOptions { reap_stale })?;
            print!("{report}");
        }
        Command::Kill { target, .. } => {
            let options = KillOptions {
                grace: settings.kill_grace,
            };
            let report = controller.kill(&target, options).await?;
            print!("{report}");
        }
        Command::Status { target } => {
            let report = controller.status(&target)?;
            print!("{report}");
        }
        Command::List => {
            let report = controller.list()?;
            print!("{report}");
        }
    }

    Ok(())
}
