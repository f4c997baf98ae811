// src/blocks/mod.rs

//! Block definitions: parsing the definition file into named blocks and
//! classifying each body line into an execution policy.

pub mod classify;
pub mod parser;

pub use classify::{CommandLine, LineClass, classify};
pub use parser::{BlockDefinition, BlockEntry, DefinitionFile};
