// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`launcher`] starts one shell process per command line according to its
//!   execution policy.
//! - [`platform`] isolates the OS-specific parts: shell selection, the
//!   interactive wrapper, termination and liveness probing.

pub mod launcher;
pub mod platform;

pub use launcher::{Launcher, ShellLauncher};
pub use platform::{NativeProcessControl, ProcessControl, ShellInvocation};
