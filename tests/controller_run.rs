// tests/controller_run.rs

use std::error::Error;

use blockrun::engine::{LineOutcome, RunOptions, RunStatus};
use blockrun::errors::BlockrunError;
use blockrun::types::{ExecutionPolicy, Selector};
use blockrun_test_utils::builders::{DefinitionBuilder, dev_block};
use blockrun_test_utils::fake_launcher::FIRST_PID;
use blockrun_test_utils::harness::{Harness, REGISTRY_PATH};
use blockrun_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

fn dev() -> Selector {
    Selector::Block("dev".to_string())
}

#[test]
fn run_registers_only_tracked_pids_in_source_order() -> TestResult {
    init_tracing();
    let mut h = Harness::new(&dev_block());

    let report = h.controller.run(&dev(), RunOptions::default())?;

    // `$ echo hi` consumed FIRST_PID but is never recorded.
    let tracked = vec![FIRST_PID + 1, FIRST_PID + 2];
    let registry = h.registry().expect("registry should exist after run");
    assert_eq!(registry.get("dev"), Some(tracked.as_slice()));
    assert_eq!(registry.len(), 1);

    let run = report.get("dev").expect("dev in report");
    match &run.status {
        RunStatus::Started { pids } => assert_eq!(pids, &tracked),
        other => panic!("expected Started, got {:?}", other),
    }
    assert!(matches!(
        run.lines[0],
        LineOutcome::Launched {
            policy: ExecutionPolicy::OneOff,
            pid: None,
            ..
        }
    ));

    let launches = h.launches();
    let commands: Vec<&str> = launches.iter().map(|l| l.command.as_str()).collect();
    assert_eq!(commands, vec!["echo hi", "sleep 100", "echo wrap"]);
    Ok(())
}

#[test]
fn second_run_is_rejected_without_launching_or_mutating() -> TestResult {
    init_tracing();
    let mut h = Harness::new(&dev_block());

    h.controller.run(&dev(), RunOptions::default())?;
    let before = h.registry();
    let launched_before = h.launches().len();

    let report = h.controller.run(&dev(), RunOptions::default())?;

    match &report.get("dev").unwrap().status {
        RunStatus::Rejected(BlockrunError::AlreadyRunning { block, pids }) => {
            assert_eq!(block, "dev");
            assert_eq!(pids, &vec![FIRST_PID + 1, FIRST_PID + 2]);
        }
        other => panic!("expected AlreadyRunning, got {:?}", other),
    }
    assert_eq!(h.launches().len(), launched_before);
    assert_eq!(h.registry(), before);
    Ok(())
}

#[test]
fn duplicate_guard_ignores_liveness_by_default() -> TestResult {
    init_tracing();
    let mut h = Harness::new(&dev_block());
    h.controller.run(&dev(), RunOptions::default())?;

    h.processes.kill_externally(FIRST_PID + 1);
    h.processes.kill_externally(FIRST_PID + 2);

    let report = h.controller.run(&dev(), RunOptions::default())?;
    assert!(matches!(
        report.get("dev").unwrap().status,
        RunStatus::Rejected(BlockrunError::AlreadyRunning { .. })
    ));
    Ok(())
}

#[test]
fn reap_stale_relaunches_when_every_pid_is_dead() -> TestResult {
    init_tracing();
    let mut h = Harness::new(&dev_block());
    h.controller.run(&dev(), RunOptions::default())?;
    h.processes.kill_externally(FIRST_PID + 1);
    h.processes.kill_externally(FIRST_PID + 2);

    let report = h.controller.run(&dev(), RunOptions { reap_stale: true })?;

    let run = report.get("dev").unwrap();
    assert_eq!(run.reaped, vec![FIRST_PID + 1, FIRST_PID + 2]);
    assert!(run.is_started());
    assert_eq!(
        h.registry().unwrap().get("dev"),
        Some(&[FIRST_PID + 4, FIRST_PID + 5][..])
    );
    assert!(report.to_string().contains("dev: dropped stale pids 1001, 1002"));
    Ok(())
}

#[test]
fn reap_stale_still_rejects_when_any_pid_is_alive() -> TestResult {
    init_tracing();
    let mut h = Harness::new(&dev_block());
    h.controller.run(&dev(), RunOptions::default())?;
    h.processes.kill_externally(FIRST_PID + 1);

    let report = h.controller.run(&dev(), RunOptions { reap_stale: true })?;

    assert!(matches!(
        report.get("dev").unwrap().status,
        RunStatus::Rejected(BlockrunError::AlreadyRunning { .. })
    ));
    assert_eq!(h.launches().len(), 3);
    Ok(())
}

#[test]
fn missing_block_is_reported_and_registry_untouched() -> TestResult {
    init_tracing();
    let mut h = Harness::new(&dev_block());

    let report = h.controller.run(
        &Selector::Block("missingBlock".to_string()),
        RunOptions::default(),
    )?;

    assert!(matches!(
        &report.get("missingBlock").unwrap().status,
        RunStatus::Rejected(BlockrunError::BlockNotFound(name)) if name == "missingBlock"
    ));
    assert!(report.to_string().contains("missingBlock: not found in definition file"));
    assert!(!h.registry_file_exists());
    assert!(h.launches().is_empty());
    Ok(())
}

#[test]
fn missing_definition_file_fails_the_whole_run() {
    init_tracing();
    let mut h = Harness::without_definitions();

    let result = h.controller.run(&Selector::All, RunOptions::default());

    match result {
        Err(BlockrunError::DefinitionNotFound(path)) => assert!(path.ends_with("Blockfile")),
        Err(e) => panic!("Expected DefinitionNotFound, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
    assert!(!h.registry_file_exists());
}

#[test]
fn block_with_only_one_off_lines_is_not_registered() -> TestResult {
    init_tracing();
    let source = DefinitionBuilder::new()
        .block("setup", &["$ echo one", "$ echo two"])
        .build();
    let mut h = Harness::new(&source);

    let report = h
        .controller
        .run(&Selector::Block("setup".to_string()), RunOptions::default())?;

    let run = report.get("setup").unwrap();
    assert!(matches!(run.status, RunStatus::NoTrackedProcesses));
    assert_eq!(run.lines.len(), 2);
    assert_eq!(h.launches().len(), 2);
    assert!(!h.registry_file_exists());
    Ok(())
}

#[test]
fn launch_failure_does_not_stop_remaining_lines() -> TestResult {
    init_tracing();
    let mut h = Harness::with_launcher(|l| l.fail_on("sleep 100"));
    h.set_definitions(&dev_block());

    let report = h.controller.run(&dev(), RunOptions::default())?;

    let run = report.get("dev").unwrap();
    assert!(matches!(
        &run.lines[1],
        LineOutcome::Failed {
            policy: ExecutionPolicy::Sustained,
            error: BlockrunError::LaunchFailure { command, .. },
        } if command == "sleep 100"
    ));
    // The `@` line still ran and is the only tracked pid.
    assert_eq!(h.registry().unwrap().get("dev"), Some(&[FIRST_PID + 1][..]));
    Ok(())
}

#[test]
fn unrecognized_lines_are_skipped() -> TestResult {
    init_tracing();
    let source = DefinitionBuilder::new()
        .block("dev", &["echo forgot the symbol", "% sleep 5"])
        .build();
    let mut h = Harness::new(&source);

    let report = h.controller.run(&dev(), RunOptions::default())?;

    let run = report.get("dev").unwrap();
    assert!(matches!(
        &run.lines[0],
        LineOutcome::Skipped { line } if line == "echo forgot the symbol"
    ));
    assert_eq!(h.launches().len(), 1);
    assert_eq!(h.registry().unwrap().get("dev"), Some(&[FIRST_PID][..]));
    Ok(())
}

#[test]
fn run_all_continues_past_per_block_failures() -> TestResult {
    init_tracing();
    let source = DefinitionBuilder::new()
        .block("api", &["% serve api"])
        .block("setup", &["$ echo once"])
        .block("web", &["% serve web"])
        .raw("\nbroken {\n  % never\n")
        .build();
    let mut h = Harness::new(&source);

    h.controller
        .run(&Selector::Block("api".to_string()), RunOptions::default())?;

    let report = h.controller.run(&Selector::All, RunOptions::default())?;

    let names: Vec<&str> = report.blocks.iter().map(|b| b.block.as_str()).collect();
    assert_eq!(names, vec!["api", "setup", "web", "broken"]);
    assert_eq!(report.started(), vec!["web"]);
    assert!(matches!(
        report.get("api").unwrap().status,
        RunStatus::Rejected(BlockrunError::AlreadyRunning { .. })
    ));
    assert!(matches!(
        report.get("setup").unwrap().status,
        RunStatus::NoTrackedProcesses
    ));
    assert!(matches!(
        report.get("broken").unwrap().status,
        RunStatus::Rejected(BlockrunError::UnterminatedBlock { line: 13, .. })
    ));

    let registry = h.registry().unwrap();
    assert_eq!(registry.names(), vec!["api".to_string(), "web".to_string()]);
    Ok(())
}

#[test]
fn run_all_with_duplicate_headers_runs_first_definition_once() -> TestResult {
    init_tracing();
    let source = DefinitionBuilder::new()
        .block("dev", &["% first"])
        .block("dev", &["% second"])
        .build();
    let mut h = Harness::new(&source);

    let report = h.controller.run(&Selector::All, RunOptions::default())?;

    assert_eq!(report.blocks.len(), 2);
    assert!(report.blocks[0].is_started());
    assert!(matches!(
        report.blocks[1].status,
        RunStatus::Rejected(BlockrunError::AlreadyRunning { .. })
    ));
    let launches = h.launches();
    assert_eq!(launches.len(), 1);
    assert_eq!(launches[0].command, "first");
    Ok(())
}

#[test]
fn run_all_on_empty_file_reports_no_blocks() -> TestResult {
    init_tracing();
    let mut h = Harness::new("just some notes\n");

    let report = h.controller.run(&Selector::All, RunOptions::default())?;

    assert!(report.blocks.is_empty());
    assert_eq!(report.to_string(), "no blocks defined\n");
    assert!(!h.registry_file_exists());
    Ok(())
}

#[test]
fn registry_write_failure_is_reported_per_block() -> TestResult {
    init_tracing();
    let source = DefinitionBuilder::new()
        .block("api", &["% serve api"])
        .block("web", &["% serve web"])
        .build();
    let mut h = Harness::new(&source);
    h.fs.deny_writes(REGISTRY_PATH);

    let report = h.controller.run(&Selector::All, RunOptions::default())?;

    // The batch went on to `web` after `api` could not be recorded.
    assert_eq!(h.launches().len(), 2);
    assert!(report.started().is_empty());
    match &report.get("web").unwrap().status {
        RunStatus::Unrecorded { pids, .. } => assert_eq!(pids, &vec![FIRST_PID + 1]),
        other => panic!("expected Unrecorded, got {:?}", other),
    }
    assert!(
        report
            .to_string()
            .contains("api: started pids 1000 but could not record them")
    );
    assert!(!h.registry_file_exists());
    Ok(())
}

#[test]
fn run_all_sees_blocks_after_a_command_ending_in_brace() -> TestResult {
    init_tracing();
    let source = DefinitionBuilder::new()
        .block("awk", &["$ echo {", "% awk '{"])
        .block("web", &["% serve web"])
        .build();
    let mut h = Harness::new(&source);

    let report = h.controller.run(&Selector::All, RunOptions::default())?;

    assert_eq!(report.started(), vec!["awk", "web"]);
    let commands: Vec<String> = h.launches().into_iter().map(|l| l.command).collect();
    assert_eq!(commands, vec!["echo {", "awk '{", "serve web"]);
    Ok(())
}
