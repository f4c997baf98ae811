// src/exec/launcher.rs

//! Process launcher: starts one OS process per classified command line.

use std::process::Stdio;

use tokio::process::Command;
use tracing::{info, warn};

use crate::errors::{BlockrunError, Result};
use crate::exec::platform::{interactive_invocation, shell_invocation};
use crate::types::ExecutionPolicy;

/// Trait abstracting how command lines are started.
///
/// Production code uses [`ShellLauncher`]; tests can provide their own
/// implementation that hands out pids without spawning anything.
pub trait Launcher: Send {
    /// Start `command` under `policy` and return its pid when the OS reports
    /// one. The caller decides whether the pid is kept.
    fn launch(&mut self, command: &str, policy: ExecutionPolicy) -> Result<Option<u32>>;
}

/// Launches commands through the platform shell.
///
/// Nothing is awaited: sustained and wrapped processes are detached into
/// their own process group, and one-off processes simply share the caller's
/// terminal. Must be called from within a Tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellLauncher;

impl ShellLauncher {
    pub fn new() -> Self {
        Self
    }
}

impl Launcher for ShellLauncher {
    fn launch(&mut self, command: &str, policy: ExecutionPolicy) -> Result<Option<u32>> {
        let invocation = match policy {
            ExecutionPolicy::WrappedInteractive => {
                interactive_invocation(command).unwrap_or_else(|| {
                    warn!(
                        cmd = %command,
                        "no persistent interactive shell on this platform; launching detached"
                    );
                    shell_invocation(command)
                })
            }
            ExecutionPolicy::OneOff | ExecutionPolicy::Sustained => shell_invocation(command),
        };

        let mut cmd = Command::new(invocation.program);
        cmd.args(&invocation.args);

        match policy {
            ExecutionPolicy::Sustained => {
                cmd.stdin(Stdio::null())
                    .stdout(Stdio::null())
                    .stderr(Stdio::null());
            }
            ExecutionPolicy::OneOff | ExecutionPolicy::WrappedInteractive => {
                cmd.stdin(Stdio::inherit())
                    .stdout(Stdio::inherit())
                    .stderr(Stdio::inherit());
            }
        }

        if policy.is_tracked() {
            detach(&mut cmd, policy);
        }

        let child = cmd.spawn().map_err(|source| BlockrunError::LaunchFailure {
            command: command.to_string(),
            source,
        })?;

        let pid = child.id();
        info!(cmd = %command, %policy, ?pid, "launched process");

        // Dropping the handle leaves the process running.
        drop(child);
        Ok(pid)
    }
}

#[cfg(unix)]
fn detach(cmd: &mut Command, _policy: ExecutionPolicy) {
    // New process group with pgid == pid, so `killpg(pid)` reaches the
    // shell and everything it started.
    cmd.process_group(0);
}

#[cfg(windows)]
fn detach(cmd: &mut Command, policy: ExecutionPolicy) {
    const CREATE_NEW_CONSOLE: u32 = 0x0000_0010;
    const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
    const CREATE_NO_WINDOW: u32 = 0x0800_0000;

    let flags = match policy {
        ExecutionPolicy::WrappedInteractive => CREATE_NEW_CONSOLE | CREATE_NEW_PROCESS_GROUP,
        _ => CREATE_NEW_PROCESS_GROUP | CREATE_NO_WINDOW,
    };
    cmd.creation_flags(flags);
}

#[cfg(not(any(unix, windows)))]
fn detach(_cmd: &mut Command, _policy: ExecutionPolicy) {}
