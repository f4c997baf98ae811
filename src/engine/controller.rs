// src/engine/controller.rs

//! Block controller: the per-block state machine behind `run`, `kill`,
//! `status` and `list`.
//!
//! A block is either *Absent* (no registry entry) or *Running* (registry entry
//! with at least one pid). The registry is the single authority for that
//! state; it is not checked against the OS process table except where stated
//! (`status`, and `run` with `reap_stale`).

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use crate::blocks::{DefinitionFile, LineClass};
use crate::config::load_definitions;
use crate::engine::report::{
    BlockKill, BlockRun, BlockStatus, KillReport, KillStatus, LineOutcome, ListReport, Liveness,
    PidKill, RunReport, RunStatus, StatusEntry, StatusReport,
};
use crate::errors::{BlockrunError, Result};
use crate::exec::{Launcher, ProcessControl};
use crate::fs::FileSystem;
use crate::registry::{Registry, RegistryStore};
use crate::types::Selector;

/// How often liveness is re-checked while waiting out a kill grace period.
const GRACE_POLL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Relaunch a registered block when none of its pids is alive, instead of
    /// rejecting it as already running.
    pub reap_stale: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KillOptions {
    /// After signalling, wait up to this long and force-kill survivors.
    /// Zero disables escalation.
    pub grace: Duration,
}

pub struct BlockController<S, L, P> {
    fs: Arc<dyn FileSystem>,
    definition_path: PathBuf,
    store: S,
    launcher: L,
    process: P,
}

impl<S, L, P> BlockController<S, L, P>
where
    S: RegistryStore,
    L: Launcher,
    P: ProcessControl,
{
    pub fn new(
        fs: Arc<dyn FileSystem>,
        definition_path: impl Into<PathBuf>,
        store: S,
        launcher: L,
        process: P,
    ) -> Self {
        Self {
            fs,
            definition_path: definition_path.into(),
            store,
            launcher,
            process,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Start one block, or every block header in the definition file.
    ///
    /// Only a missing or unreadable definition file fails the whole call;
    /// per-block problems, registry IO errors included, are reported in the
    /// result.
    pub fn run(&mut self, target: &Selector, options: RunOptions) -> Result<RunReport> {
        let definitions = load_definitions(self.fs.as_ref(), &self.definition_path)?;

        let names: Vec<String> = match target {
            Selector::All => definitions
                .block_names()
                .into_iter()
                .map(str::to_string)
                .collect(),
            Selector::Block(name) => vec![name.clone()],
        };

        let mut report = RunReport::default();
        for name in names {
            let outcome = self.run_block(&definitions, &name, options);
            report.blocks.push(outcome);
        }

        info!(started = ?report.started(), "run finished");
        Ok(report)
    }

    fn run_block(
        &mut self,
        definitions: &DefinitionFile,
        name: &str,
        options: RunOptions,
    ) -> BlockRun {
        // Reload per block so `all` sees what earlier blocks registered.
        let mut registry = match self.store.load() {
            Ok(registry) => registry.unwrap_or_default(),
            Err(err) => {
                warn!(block = %name, error = %err, "cannot read registry; block not run");
                return BlockRun::rejected(name, err);
            }
        };

        let mut reaped = Vec::new();
        if let Some(pids) = registry.get(name) {
            let pids = pids.to_vec();
            let any_alive = options.reap_stale && pids.iter().any(|&pid| self.process.is_alive(pid));

            if !options.reap_stale || any_alive {
                info!(block = %name, ?pids, "block already running; not relaunching");
                return BlockRun::rejected(
                    name,
                    BlockrunError::AlreadyRunning {
                        block: name.to_string(),
                        pids,
                    },
                );
            }

            info!(block = %name, ?pids, "no tracked process alive; replacing stale entry");
            reaped = pids;
        }

        let block = match definitions.find(name) {
            Ok(block) => block,
            Err(err) => {
                warn!(block = %name, error = %err, "cannot run block");
                return BlockRun::rejected(name, err);
            }
        };

        let mut lines = Vec::new();
        let mut tracked = Vec::new();

        for line in block.lines() {
            let cmd = match line {
                LineClass::Command(cmd) => cmd,
                LineClass::Unrecognized(text) => {
                    warn!(block = %name, line = %text, "skipping line without a $, % or @ prefix");
                    lines.push(LineOutcome::Skipped { line: text });
                    continue;
                }
            };

            match self.launcher.launch(&cmd.command, cmd.policy) {
                Ok(pid) => {
                    let pid = if cmd.policy.is_tracked() { pid } else { None };
                    match pid {
                        Some(pid) => tracked.push(pid),
                        None if cmd.policy.is_tracked() => {
                            warn!(block = %name, cmd = %cmd.command, "no pid reported; not tracked")
                        }
                        None => {}
                    }
                    lines.push(LineOutcome::Launched {
                        command: cmd.command,
                        policy: cmd.policy,
                        pid,
                    });
                }
                Err(error) => {
                    warn!(block = %name, error = %error, "launch failed; continuing with next line");
                    lines.push(LineOutcome::Failed {
                        policy: cmd.policy,
                        error,
                    });
                }
            }
        }

        let status = if tracked.is_empty() {
            let saved = if reaped.is_empty() {
                Ok(())
            } else {
                registry.remove(name);
                self.store.save(&registry)
            };
            match saved {
                Ok(()) => {
                    info!(block = %name, "no tracked processes; registry unchanged");
                    RunStatus::NoTrackedProcesses
                }
                Err(error) => {
                    warn!(block = %name, error = %error, "could not drop stale registry entry");
                    RunStatus::Unrecorded {
                        pids: Vec::new(),
                        error,
                    }
                }
            }
        } else {
            registry.insert(name, tracked.clone());
            match self.store.save(&registry) {
                Ok(()) => {
                    info!(block = %name, pids = ?tracked, "block registered");
                    RunStatus::Started { pids: tracked }
                }
                Err(error) => {
                    warn!(block = %name, pids = ?tracked, error = %error, "launched but not registered");
                    RunStatus::Unrecorded {
                        pids: tracked,
                        error,
                    }
                }
            }
        };

        BlockRun {
            block: name.to_string(),
            lines,
            reaped,
            status,
        }
    }

    /// Terminate every tracked pid of one block, or of every registered block.
    ///
    /// Blocks are deregistered after all their pids were attempted, whatever
    /// the individual outcomes. The registry is written once, before any grace
    /// period; if nothing is left the file is deleted.
    pub async fn kill(&mut self, target: &Selector, options: KillOptions) -> Result<KillReport> {
        let Some(mut registry) = self.store.load()? else {
            return Err(BlockrunError::RegistryMissing(
                self.store.location().to_path_buf(),
            ));
        };

        let names = select(&registry, target);
        let mut report = KillReport::default();
        let mut removed_any = false;

        for name in names {
            let Some(pids) = registry.remove(&name) else {
                info!(block = %name, "block not in registry; nothing to kill");
                report.blocks.push(BlockKill {
                    block: name,
                    status: KillStatus::NotFound,
                });
                continue;
            };
            removed_any = true;

            let results = pids
                .iter()
                .map(|&pid| self.terminate(&name, pid))
                .collect();

            report.blocks.push(BlockKill {
                block: name,
                status: KillStatus::Killed(results),
            });
        }

        // Deregister before waiting out the grace period.
        if removed_any {
            self.store.save(&registry)?;
        }

        if !options.grace.is_zero() {
            self.escalate(&mut report, options.grace).await;
        }

        Ok(report)
    }

    fn terminate(&self, block: &str, pid: u32) -> PidKill {
        let result = self.process.terminate(pid).map_err(|source| {
            let err = BlockrunError::TerminationFailure { pid, source };
            warn!(block = %block, error = %err, "termination failed");
            err
        });
        if result.is_ok() {
            info!(block = %block, pid, "sent termination");
        }

        PidKill {
            pid,
            result,
            forced: false,
        }
    }

    /// Wait up to `grace` for signalled pids to exit, then force-kill the rest.
    async fn escalate(&self, report: &mut KillReport, grace: Duration) {
        let signalled: Vec<u32> = report
            .blocks
            .iter()
            .filter_map(|b| match &b.status {
                KillStatus::Killed(pids) => Some(pids),
                KillStatus::NotFound => None,
            })
            .flatten()
            .filter(|p| p.result.is_ok())
            .map(|p| p.pid)
            .collect();

        // A grace too large to represent waits until every pid is gone.
        let deadline = Instant::now().checked_add(grace);
        let survivors = loop {
            let alive: Vec<u32> = signalled
                .iter()
                .copied()
                .filter(|&pid| self.process.is_alive(pid))
                .collect();

            let remaining = match deadline {
                Some(deadline) => deadline.saturating_duration_since(Instant::now()),
                None => GRACE_POLL,
            };
            if alive.is_empty() || remaining.is_zero() {
                break alive;
            }
            sleep(GRACE_POLL.min(remaining)).await;
        };

        for pid in survivors {
            match self.process.force_terminate(pid) {
                Ok(()) => {
                    info!(pid, "force-killed after grace period");
                    mark_forced(report, pid);
                }
                Err(err) => warn!(pid, error = %err, "force-kill failed"),
            }
        }
    }

    /// Probe the liveness of tracked pids.
    pub fn status(&self, target: &Selector) -> Result<StatusReport> {
        let Some(registry) = self.store.load()? else {
            return Err(BlockrunError::RegistryMissing(
                self.store.location().to_path_buf(),
            ));
        };

        let blocks = select(&registry, target)
            .into_iter()
            .map(|name| {
                let status = match registry.get(&name) {
                    Some(pids) => BlockStatus::Tracked {
                        pids: pids.to_vec(),
                        liveness: Liveness::probe(pids, |pid| self.process.is_alive(pid)),
                    },
                    None => BlockStatus::NotFound,
                };
                debug!(block = %name, ?status, "probed block");
                StatusEntry {
                    block: name,
                    status,
                }
            })
            .collect();

        Ok(StatusReport { blocks })
    }

    /// Every registered block with its pids, verbatim.
    pub fn list(&self) -> Result<ListReport> {
        let registry = self.store.load()?.unwrap_or_default();
        Ok(ListReport {
            blocks: registry
                .iter()
                .map(|(name, pids)| (name.to_string(), pids.to_vec()))
                .collect(),
        })
    }
}

/// Block names a registry-side operation applies to, in registry order.
fn select(registry: &Registry, target: &Selector) -> Vec<String> {
    match target {
        Selector::All => registry.names(),
        Selector::Block(name) => vec![name.clone()],
    }
}

fn mark_forced(report: &mut KillReport, pid: u32) {
    for block in &mut report.blocks {
        if let KillStatus::Killed(pids) = &mut block.status {
            for entry in pids.iter_mut().filter(|p| p.pid == pid) {
                entry.forced = true;
            }
        }
    }
}
