// src/blocks/classify.rs

//! Line classifier: maps the leading symbol of a body line to an
//! [`ExecutionPolicy`].

use crate::types::ExecutionPolicy;

/// A body line that carries a recognized symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub policy: ExecutionPolicy,
    /// Everything after the symbol, trimmed. May be empty.
    pub command: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineClass {
    Command(CommandLine),
    /// The line did not start with `$`, `%` or `@`; holds the line as given.
    Unrecognized(String),
}

/// Classify one trimmed, non-empty body line.
///
/// An empty remainder after the symbol is passed through unchanged; launching
/// it is left to fail at the OS level.
pub fn classify(line: &str) -> LineClass {
    let mut chars = line.chars();
    let policy = chars.next().and_then(ExecutionPolicy::from_symbol);

    match policy {
        Some(policy) => LineClass::Command(CommandLine {
            policy,
            command: chars.as_str().trim().to_string(),
        }),
        None => LineClass::Unrecognized(line.to_string()),
    }
}
