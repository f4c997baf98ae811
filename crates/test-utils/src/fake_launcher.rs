use std::io;
use std::sync::{Arc, Mutex};

use blockrun::errors::{BlockrunError, Result};
use blockrun::exec::Launcher;
use blockrun::types::ExecutionPolicy;

use crate::fake_process::FakeProcessTable;

/// First pid handed out by [`FakeLauncher`].
pub const FIRST_PID: u32 = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Launch {
    pub command: String,
    pub policy: ExecutionPolicy,
    pub pid: u32,
}

/// A fake launcher that:
/// - records every launch in order
/// - hands out sequential pids starting at [`FIRST_PID`]
/// - registers each pid as alive in a shared [`FakeProcessTable`]
/// - fails commands listed via [`FakeLauncher::fail_on`]
pub struct FakeLauncher {
    next_pid: u32,
    failing: Vec<String>,
    launches: Arc<Mutex<Vec<Launch>>>,
    processes: FakeProcessTable,
}

impl FakeLauncher {
    pub fn new(processes: FakeProcessTable, launches: Arc<Mutex<Vec<Launch>>>) -> Self {
        Self {
            next_pid: FIRST_PID,
            failing: Vec::new(),
            launches,
            processes,
        }
    }

    pub fn fail_on(mut self, command: &str) -> Self {
        self.failing.push(command.to_string());
        self
    }
}

impl Launcher for FakeLauncher {
    fn launch(&mut self, command: &str, policy: ExecutionPolicy) -> Result<Option<u32>> {
        if self.failing.iter().any(|c| c == command) {
            return Err(BlockrunError::LaunchFailure {
                command: command.to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "command not found"),
            });
        }

        let pid = self.next_pid;
        self.next_pid += 1;
        self.processes.spawn(pid);

        let mut guard = self.launches.lock().unwrap();
        guard.push(Launch {
            command: command.to_string(),
            policy,
            pid,
        });

        Ok(Some(pid))
    }
}
