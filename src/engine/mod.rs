// src/engine/mod.rs

//! Orchestration engine for blockrun.
//!
//! [`controller`] owns the per-block state machine and talks to the parser,
//! launcher, registry store and process control through their traits.
//! [`report`] holds the per-item outcomes it returns.

pub mod controller;
pub mod report;

pub use controller::{BlockController, KillOptions, RunOptions};
pub use report::{
    BlockKill, BlockRun, BlockStatus, KillReport, KillStatus, LineOutcome, ListReport, Liveness,
    PidKill, RunReport, RunStatus, StatusEntry, StatusReport,
};
