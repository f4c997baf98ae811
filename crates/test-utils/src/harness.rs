use std::sync::{Arc, Mutex};

use blockrun::engine::BlockController;
use blockrun::fs::mock::MockFileSystem;
use blockrun::registry::{FileRegistryStore, Registry, RegistryStore};

use crate::fake_launcher::{FakeLauncher, Launch};
use crate::fake_process::FakeProcessTable;

pub const DEFINITION_PATH: &str = "Blockfile";
pub const REGISTRY_PATH: &str = ".blockrun.json";

pub type TestController = BlockController<FileRegistryStore, FakeLauncher, FakeProcessTable>;

/// A controller wired to an in-memory filesystem, a fake launcher and a fake
/// process table, plus handles to inspect all three.
pub struct Harness {
    pub fs: MockFileSystem,
    pub processes: FakeProcessTable,
    pub launches: Arc<Mutex<Vec<Launch>>>,
    pub controller: TestController,
}

impl Harness {
    /// Harness whose definition file contains `source`.
    pub fn new(source: &str) -> Self {
        let harness = Self::without_definitions();
        harness.fs.add_file(DEFINITION_PATH, source);
        harness
    }

    pub fn without_definitions() -> Self {
        Self::with_launcher(|launcher| launcher)
    }

    /// Like [`Harness::new`], letting the caller configure the launcher.
    pub fn with_launcher(configure: impl FnOnce(FakeLauncher) -> FakeLauncher) -> Self {
        let fs = MockFileSystem::new();
        let processes = FakeProcessTable::new();
        let launches = Arc::new(Mutex::new(Vec::new()));

        let launcher = configure(FakeLauncher::new(processes.clone(), Arc::clone(&launches)));
        let store = FileRegistryStore::new(Arc::new(fs.clone()), REGISTRY_PATH);
        let controller = BlockController::new(
            Arc::new(fs.clone()),
            DEFINITION_PATH,
            store,
            launcher,
            processes.clone(),
        );

        Self {
            fs,
            processes,
            launches,
            controller,
        }
    }

    pub fn set_definitions(&self, source: &str) {
        self.fs.add_file(DEFINITION_PATH, source);
    }

    /// Current registry as persisted (`None` when the file does not exist).
    pub fn registry(&self) -> Option<Registry> {
        self.controller.store().load().unwrap()
    }

    pub fn registry_file_exists(&self) -> bool {
        self.fs.contents(REGISTRY_PATH).is_some()
    }

    pub fn launches(&self) -> Vec<Launch> {
        self.launches.lock().unwrap().clone()
    }
}
