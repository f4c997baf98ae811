// src/config/mod.rs

//! Configuration for blockrun.
//!
//! Responsibilities:
//! - Resolve runtime settings (definition file, registry file, kill grace)
//!   from CLI flags, environment variables and defaults.
//! - Load and parse the block definition file.

pub mod loader;

pub use loader::{DEFINITION_FILE, Settings, load_definitions};
