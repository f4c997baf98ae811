// src/registry/mod.rs

//! Process registry: the persisted block name → pid list mapping.
//!
//! This is the only durable state the tool keeps. It records intent (what was
//! started and not yet killed), not verified OS state.
//!
//! Known hazard: there is no locking. Two invocations running at the same time
//! in the same directory race on the read-modify-write of the registry file and
//! one of them can lose its update. Usage is assumed to be one operator, one
//! invocation at a time.

pub mod model;
pub mod store;

pub use model::Registry;
pub use store::{FileRegistryStore, REGISTRY_FILE, RegistryStore};
