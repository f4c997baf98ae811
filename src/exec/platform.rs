// src/exec/platform.rs

//! Platform-specific process capabilities.
//!
//! - POSIX: tracked processes lead their own process group, so termination
//!   signals the whole group (`killpg`). Liveness uses signal 0. There is no
//!   persistent interactive wrapper; wrapped lines launch as plain detached
//!   processes.
//! - Windows: termination is a forceful tree kill (`taskkill /F /T`),
//!   liveness is checked with `tasklist`, and wrapped lines run inside
//!   `cmd /k` so the shell stays open after the command finishes.

use std::io;

/// Program plus arguments used to run one command line through a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellInvocation {
    pub program: &'static str,
    pub args: Vec<String>,
}

/// Run `command` through the platform shell and exit when it finishes.
pub fn shell_invocation(command: &str) -> ShellInvocation {
    if cfg!(windows) {
        ShellInvocation {
            program: "cmd",
            args: vec!["/C".to_string(), command.to_string()],
        }
    } else {
        ShellInvocation {
            program: "sh",
            args: vec!["-c".to_string(), command.to_string()],
        }
    }
}

/// Run `command` inside a shell that stays open afterwards, if the platform
/// has one.
pub fn interactive_invocation(command: &str) -> Option<ShellInvocation> {
    if cfg!(windows) {
        Some(ShellInvocation {
            program: "cmd",
            args: vec!["/k".to_string(), command.to_string()],
        })
    } else {
        None
    }
}

/// Termination and liveness probing for tracked pids.
pub trait ProcessControl: Send {
    /// Ask the process (and its group/tree) to stop.
    fn terminate(&self, pid: u32) -> io::Result<()>;

    /// Stop the process (and its group/tree) without giving it a chance to
    /// clean up.
    fn force_terminate(&self, pid: u32) -> io::Result<()>;

    /// Zero-impact existence check.
    fn is_alive(&self, pid: u32) -> bool;
}

/// [`ProcessControl`] backed by the host operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeProcessControl;

#[cfg(unix)]
impl ProcessControl for NativeProcessControl {
    fn terminate(&self, pid: u32) -> io::Result<()> {
        signal_group(pid, libc::SIGTERM)
    }

    fn force_terminate(&self, pid: u32) -> io::Result<()> {
        signal_group(pid, libc::SIGKILL)
    }

    fn is_alive(&self, pid: u32) -> bool {
        let Ok(pid) = libc::pid_t::try_from(pid) else {
            return false;
        };
        if pid <= 0 {
            return false;
        }
        // SAFETY: kill(pid, 0) probes process existence without sending a signal.
        let rc = unsafe { libc::kill(pid, 0) };
        rc == 0 || io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
    }
}

#[cfg(unix)]
fn signal_group(pid: u32, signal: libc::c_int) -> io::Result<()> {
    // SAFETY: getpgrp has no preconditions and cannot fail.
    let own_group = unsafe { libc::getpgrp() };
    let pgid = libc::pid_t::try_from(pid)
        .ok()
        .filter(|pgid| *pgid > 1 && *pgid != own_group)
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("refusing to signal process group {pid}"),
            )
        })?;

    // SAFETY: plain syscall on an integer pgid; no memory is shared.
    let rc = unsafe { libc::killpg(pgid, signal) };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(windows)]
impl ProcessControl for NativeProcessControl {
    fn terminate(&self, pid: u32) -> io::Result<()> {
        taskkill_tree(pid)
    }

    fn force_terminate(&self, pid: u32) -> io::Result<()> {
        taskkill_tree(pid)
    }

    fn is_alive(&self, pid: u32) -> bool {
        let filter = format!("PID eq {pid}");
        match std::process::Command::new("tasklist")
            .args(["/FI", filter.as_str(), "/NH", "/FO", "CSV"])
            .output()
        {
            Ok(output) => String::from_utf8_lossy(&output.stdout).contains(&format!("\"{pid}\"")),
            Err(_) => false,
        }
    }
}

#[cfg(windows)]
fn taskkill_tree(pid: u32) -> io::Result<()> {
    let output = std::process::Command::new("taskkill")
        .args(["/F", "/T", "/PID", pid.to_string().as_str()])
        .output()?;
    if output.status.success() {
        Ok(())
    } else {
        Err(io::Error::other(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ))
    }
}

#[cfg(not(any(unix, windows)))]
impl ProcessControl for NativeProcessControl {
    fn terminate(&self, _pid: u32) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "terminate not supported on this platform",
        ))
    }

    fn force_terminate(&self, pid: u32) -> io::Result<()> {
        self.terminate(pid)
    }

    fn is_alive(&self, _pid: u32) -> bool {
        false
    }
}
