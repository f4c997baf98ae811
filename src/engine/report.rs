// src/engine/report.rs

//! Per-item outcomes returned by the block controller.
//!
//! Every report implements `Display` as the human-readable status lines the
//! binary prints, one line per item.

use std::fmt;

use crate::errors::BlockrunError;
use crate::types::ExecutionPolicy;

fn join_pids(pids: &[u32]) -> String {
    pids.iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

/// What happened to one body line during `run`.
#[derive(Debug)]
pub enum LineOutcome {
    /// The process was started. `pid` is only kept for tracked policies.
    Launched {
        command: String,
        policy: ExecutionPolicy,
        pid: Option<u32>,
    },
    /// Spawning failed (holds a [`BlockrunError::LaunchFailure`]).
    Failed {
        policy: ExecutionPolicy,
        error: BlockrunError,
    },
    /// Line without a recognized symbol.
    Skipped { line: String },
}

#[derive(Debug)]
pub enum RunStatus {
    /// At least one tracked process started; the block is now registered.
    Started { pids: Vec<u32> },
    /// Lines were attempted but nothing trackable started; registry untouched.
    NoTrackedProcesses,
    /// The block was not run: already running, not found, unterminated, or
    /// the registry could not be read.
    Rejected(BlockrunError),
    /// Lines ran but the registry write failed. `pids` are live and untracked.
    Unrecorded { pids: Vec<u32>, error: BlockrunError },
}

#[derive(Debug)]
pub struct BlockRun {
    pub block: String,
    pub lines: Vec<LineOutcome>,
    /// Dead pids dropped from the registry before relaunching (`--reap-stale`).
    pub reaped: Vec<u32>,
    pub status: RunStatus,
}

impl BlockRun {
    pub fn rejected(block: impl Into<String>, error: BlockrunError) -> Self {
        Self {
            block: block.into(),
            lines: Vec::new(),
            reaped: Vec::new(),
            status: RunStatus::Rejected(error),
        }
    }

    pub fn is_started(&self) -> bool {
        matches!(self.status, RunStatus::Started { .. })
    }
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub blocks: Vec<BlockRun>,
}

impl RunReport {
    /// Names of the blocks that were actually started.
    pub fn started(&self) -> Vec<&str> {
        self.blocks
            .iter()
            .filter(|b| b.is_started())
            .map(|b| b.block.as_str())
            .collect()
    }

    pub fn get(&self, block: &str) -> Option<&BlockRun> {
        self.blocks.iter().find(|b| b.block == block)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.blocks.is_empty() {
            return writeln!(f, "no blocks defined");
        }

        for run in &self.blocks {
            if !run.reaped.is_empty() {
                writeln!(
                    f,
                    "{}: dropped stale pids {}",
                    run.block,
                    join_pids(&run.reaped)
                )?;
            }

            for line in &run.lines {
                match line {
                    LineOutcome::Launched {
                        command,
                        policy,
                        pid: Some(pid),
                    } => writeln!(f, "  {} {} -> pid {}", policy.symbol(), command, pid)?,
                    LineOutcome::Launched {
                        command, policy, ..
                    } => writeln!(f, "  {} {} -> launched (untracked)", policy.symbol(), command)?,
                    LineOutcome::Failed { policy, error } => {
                        writeln!(f, "  {} failed: {}", policy.symbol(), error)?
                    }
                    LineOutcome::Skipped { line } => {
                        writeln!(f, "  skipped unrecognized line: {}", line)?
                    }
                }
            }

            match &run.status {
                RunStatus::Started { pids } => writeln!(
                    f,
                    "{}: started {} tracked process(es) (pids {})",
                    run.block,
                    pids.len(),
                    join_pids(pids)
                )?,
                RunStatus::NoTrackedProcesses => writeln!(
                    f,
                    "{}: no tracked processes started; nothing recorded",
                    run.block
                )?,
                RunStatus::Rejected(BlockrunError::AlreadyRunning { pids, .. }) => writeln!(
                    f,
                    "{}: already running (pids {})",
                    run.block,
                    join_pids(pids)
                )?,
                RunStatus::Rejected(BlockrunError::BlockNotFound(_)) => {
                    writeln!(f, "{}: not found in definition file", run.block)?
                }
                RunStatus::Rejected(err) => writeln!(f, "{}: {}", run.block, err)?,
                RunStatus::Unrecorded { pids, error } if pids.is_empty() => {
                    writeln!(f, "{}: registry not updated: {}", run.block, error)?
                }
                RunStatus::Unrecorded { pids, error } => writeln!(
                    f,
                    "{}: started pids {} but could not record them: {}",
                    run.block,
                    join_pids(pids),
                    error
                )?,
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// kill
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct PidKill {
    pub pid: u32,
    /// `Err` holds a [`BlockrunError::TerminationFailure`].
    pub result: Result<(), BlockrunError>,
    /// Force-terminated after the grace period ran out.
    pub forced: bool,
}

#[derive(Debug)]
pub enum KillStatus {
    /// Every pid was attempted and the block was deregistered.
    Killed(Vec<PidKill>),
    NotFound,
}

#[derive(Debug)]
pub struct BlockKill {
    pub block: String,
    pub status: KillStatus,
}

#[derive(Debug, Default)]
pub struct KillReport {
    pub blocks: Vec<BlockKill>,
}

impl KillReport {
    pub fn get(&self, block: &str) -> Option<&BlockKill> {
        self.blocks.iter().find(|b| b.block == block)
    }
}

impl fmt::Display for KillReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.blocks.is_empty() {
            return writeln!(f, "no blocks running");
        }

        for kill in &self.blocks {
            match &kill.status {
                KillStatus::NotFound => writeln!(f, "{}: not found in registry", kill.block)?,
                KillStatus::Killed(pids) => {
                    for pid in pids {
                        match (&pid.result, pid.forced) {
                            (Ok(()), false) => writeln!(f, "{}: terminated pid {}", kill.block, pid.pid)?,
                            (Ok(()), true) => {
                                writeln!(f, "{}: force-killed pid {}", kill.block, pid.pid)?
                            }
                            (Err(err), _) => writeln!(f, "{}: {}", kill.block, err)?,
                        }
                    }
                    writeln!(f, "{}: removed from registry", kill.block)?;
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// status / list
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Liveness {
    FullyRunning,
    PartiallyRunning { alive: Vec<u32>, dead: Vec<u32> },
    NotRunning,
}

impl Liveness {
    pub fn probe(pids: &[u32], mut is_alive: impl FnMut(u32) -> bool) -> Self {
        let (alive, dead): (Vec<u32>, Vec<u32>) = pids.iter().partition(|&&pid| is_alive(pid));

        if dead.is_empty() && !alive.is_empty() {
            Liveness::FullyRunning
        } else if alive.is_empty() {
            Liveness::NotRunning
        } else {
            Liveness::PartiallyRunning { alive, dead }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockStatus {
    Tracked { pids: Vec<u32>, liveness: Liveness },
    /// Not in the registry; distinct from "not running".
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    pub block: String,
    pub status: BlockStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusReport {
    pub blocks: Vec<StatusEntry>,
}

impl StatusReport {
    pub fn get(&self, block: &str) -> Option<&BlockStatus> {
        self.blocks
            .iter()
            .find(|entry| entry.block == block)
            .map(|entry| &entry.status)
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.blocks {
            match &entry.status {
                BlockStatus::NotFound => writeln!(f, "{}: not found in registry", entry.block)?,
                BlockStatus::Tracked { pids, liveness } => match liveness {
                    Liveness::FullyRunning => writeln!(
                        f,
                        "{}: running ({}/{} alive: {})",
                        entry.block,
                        pids.len(),
                        pids.len(),
                        join_pids(pids)
                    )?,
                    Liveness::PartiallyRunning { alive, dead } => writeln!(
                        f,
                        "{}: partially running ({}/{} alive: {}; dead: {})",
                        entry.block,
                        alive.len(),
                        pids.len(),
                        join_pids(alive),
                        join_pids(dead)
                    )?,
                    Liveness::NotRunning => writeln!(
                        f,
                        "{}: not running (0/{} alive; dead: {})",
                        entry.block,
                        pids.len(),
                        join_pids(pids)
                    )?,
                },
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListReport {
    pub blocks: Vec<(String, Vec<u32>)>,
}

impl ListReport {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl fmt::Display for ListReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.blocks.is_empty() {
            return writeln!(f, "no blocks running");
        }
        for (block, pids) in &self.blocks {
            writeln!(f, "{}: {}", block, join_pids(pids))?;
        }
        Ok(())
    }
}
