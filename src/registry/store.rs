// src/registry/store.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::errors::{BlockrunError, Result};
use crate::fs::FileSystem;
use crate::registry::Registry;

/// Default registry file name, relative to the working directory.
pub const REGISTRY_FILE: &str = ".blockrun.json";

/// Abstract storage for the process registry.
///
/// The controller only talks to this trait, so a locking or transactional
/// store can replace [`FileRegistryStore`] without touching control logic.
pub trait RegistryStore: Send {
    /// Where the registry lives, for diagnostics.
    fn location(&self) -> &Path;

    /// Load the persisted mapping. `Ok(None)` means there is no usable
    /// registry (absent, or unreadable and treated as absent).
    fn load(&self) -> Result<Option<Registry>>;

    /// Persist the full mapping. An empty mapping deletes the artifact.
    fn save(&mut self, registry: &Registry) -> Result<()>;

    /// Remove one block and persist the result.
    fn remove(&mut self, block: &str) -> Result<Option<Vec<u32>>> {
        let mut registry = self.load()?.unwrap_or_default();
        let removed = registry.remove(block);
        if removed.is_some() {
            self.save(&registry)?;
        }
        Ok(removed)
    }
}

/// Stores the registry as a pretty-printed JSON object in a single file.
#[derive(Debug)]
pub struct FileRegistryStore {
    fs: Arc<dyn FileSystem>,
    path: PathBuf,
}

impl FileRegistryStore {
    pub fn new(fs: Arc<dyn FileSystem>, path: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            path: path.into(),
        }
    }
}

impl RegistryStore for FileRegistryStore {
    fn location(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Option<Registry>> {
        if !self.fs.exists(&self.path) {
            debug!(path = ?self.path, "registry file absent");
            return Ok(None);
        }

        // Bytes, so invalid UTF-8 lands in the corrupt branch below.
        let contents = self.fs.read(&self.path)?;
        let mut registry = match serde_json::from_slice::<Registry>(&contents) {
            Ok(registry) => registry,
            Err(source) => {
                let err = BlockrunError::RegistryCorrupt {
                    path: self.path.clone(),
                    source,
                };
                warn!(error = %err, "treating registry as absent");
                return Ok(None);
            }
        };

        let dropped = registry.drop_empty();
        if dropped > 0 {
            warn!(path = ?self.path, dropped, "ignored registry entries without pids");
        }

        Ok(Some(registry))
    }

    fn save(&mut self, registry: &Registry) -> Result<()> {
        if registry.is_empty() {
            if self.fs.exists(&self.path) {
                self.fs.remove_file(&self.path)?;
                info!(path = ?self.path, "registry empty; removed file");
            }
            return Ok(());
        }

        let mut json = serde_json::to_string_pretty(registry)?;
        json.push('\n');
        self.fs.write(&self.path, json.as_bytes())?;
        debug!(path = ?self.path, blocks = registry.len(), "saved registry");
        Ok(())
    }
}
