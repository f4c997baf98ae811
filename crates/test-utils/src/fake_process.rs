use std::collections::BTreeSet;
use std::io;
use std::sync::{Arc, Mutex};

use blockrun::exec::ProcessControl;

#[derive(Debug, Default)]
struct Table {
    alive: BTreeSet<u32>,
    /// Ignore plain termination requests.
    stubborn: BTreeSet<u32>,
    terminated: Vec<u32>,
    forced: Vec<u32>,
}

/// In-memory process table implementing [`ProcessControl`].
///
/// Clones share state, so a test can keep one handle while the controller
/// owns another.
#[derive(Debug, Clone, Default)]
pub struct FakeProcessTable {
    table: Arc<Mutex<Table>>,
}

impl FakeProcessTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&self, pid: u32) {
        self.table.lock().unwrap().alive.insert(pid);
    }

    /// Simulate a process dying outside of blockrun.
    pub fn kill_externally(&self, pid: u32) {
        self.table.lock().unwrap().alive.remove(&pid);
    }

    /// Make `pid` survive `terminate`; only `force_terminate` stops it.
    pub fn make_stubborn(&self, pid: u32) {
        self.table.lock().unwrap().stubborn.insert(pid);
    }

    pub fn alive(&self) -> Vec<u32> {
        self.table.lock().unwrap().alive.iter().copied().collect()
    }

    /// Pids that received a successful `terminate`, in order.
    pub fn terminated(&self) -> Vec<u32> {
        self.table.lock().unwrap().terminated.clone()
    }

    pub fn forced(&self) -> Vec<u32> {
        self.table.lock().unwrap().forced.clone()
    }
}

fn no_such_process(pid: u32) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("no such process: {pid}"))
}

impl ProcessControl for FakeProcessTable {
    fn terminate(&self, pid: u32) -> io::Result<()> {
        let mut table = self.table.lock().unwrap();
        if !table.alive.contains(&pid) {
            return Err(no_such_process(pid));
        }
        table.terminated.push(pid);
        if !table.stubborn.contains(&pid) {
            table.alive.remove(&pid);
        }
        Ok(())
    }

    fn force_terminate(&self, pid: u32) -> io::Result<()> {
        let mut table = self.table.lock().unwrap();
        if !table.alive.remove(&pid) {
            return Err(no_such_process(pid));
        }
        table.forced.push(pid);
        Ok(())
    }

    fn is_alive(&self, pid: u32) -> bool {
        self.table.lock().unwrap().alive.contains(&pid)
    }
}
