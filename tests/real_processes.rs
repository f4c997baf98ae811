// tests/real_processes.rs

//! End-to-end runs against the real shell and process table.
//!
//! Killed children are our own, so they linger as zombies until reaped;
//! these tests never assert that a pid is gone after `kill`.

#![cfg(unix)]

use std::error::Error;
use std::sync::Arc;

use blockrun::engine::{BlockController, BlockStatus, KillOptions, Liveness, RunOptions};
use blockrun::exec::{NativeProcessControl, ShellLauncher};
use blockrun::fs::{FileSystem, RealFileSystem};
use blockrun::registry::{FileRegistryStore, RegistryStore};
use blockrun::types::Selector;
use blockrun_test_utils::builders::DefinitionBuilder;
use blockrun_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

type RealController = BlockController<FileRegistryStore, ShellLauncher, NativeProcessControl>;

fn controller(dir: &std::path::Path) -> RealController {
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let store = FileRegistryStore::new(Arc::clone(&fs), dir.join(".blockrun.json"));
    BlockController::new(
        fs,
        dir.join("Blockfile"),
        store,
        ShellLauncher::new(),
        NativeProcessControl,
    )
}

#[tokio::test]
async fn run_status_kill_with_real_processes() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let source = DefinitionBuilder::new()
        .block("dev", &["$ true", "% sleep 30", "% sleep 30"])
        .build();
    std::fs::write(dir.path().join("Blockfile"), source)?;

    let mut controller = controller(dir.path());
    let dev = Selector::Block("dev".to_string());

    let report = controller.run(&dev, RunOptions::default())?;
    assert_eq!(report.started(), vec!["dev"]);

    let registry = controller.store().load()?.expect("registry written");
    let pids = registry.get("dev").expect("dev registered").to_vec();
    assert_eq!(pids.len(), 2);

    let on_disk = std::fs::read_to_string(dir.path().join(".blockrun.json"))?;
    let parsed: serde_json::Value = serde_json::from_str(&on_disk)?;
    assert!(parsed["dev"].is_array());

    let status = controller.status(&dev)?;
    assert_eq!(
        status.get("dev"),
        Some(&BlockStatus::Tracked {
            pids: pids.clone(),
            liveness: Liveness::FullyRunning,
        })
    );

    let report = with_timeout(controller.kill(&dev, KillOptions::default())).await?;
    assert!(report.to_string().contains("dev: removed from registry"));
    assert!(!dir.path().join(".blockrun.json").exists());
    Ok(())
}

#[tokio::test]
async fn unknown_command_still_yields_a_shell_pid() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let source = DefinitionBuilder::new()
        .block("broken", &["% definitely-not-a-real-command-xyz"])
        .build();
    std::fs::write(dir.path().join("Blockfile"), source)?;

    let mut controller = controller(dir.path());
    let target = Selector::Block("broken".to_string());

    // The shell itself starts fine; the missing program only makes it exit.
    let report = controller.run(&target, RunOptions::default())?;
    assert_eq!(report.started(), vec!["broken"]);

    // Killing a pid that may already be gone still deregisters the block.
    with_timeout(controller.kill(&target, KillOptions::default())).await?;
    assert!(controller.store().load()?.is_none());
    Ok(())
}
