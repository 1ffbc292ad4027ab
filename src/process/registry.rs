//! Process handles and the registry that resolves them.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use super::page_table::SoftPageTable;
use super::supplemental::SupplementalTable;

/// Non-owning handle to a registered process.
///
/// This is what the frame table stores as an entry's owner; it is
/// resolved through the [`ProcessRegistry`] when the owner's tables are
/// needed, so frame bookkeeping never extends a process's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProcessId(u32);

impl ProcessId {
    pub(crate) const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

/// A process as the paging subsystem sees it: an id plus the two
/// per-process tables the frame manager consumes.
pub struct Process {
    id: ProcessId,
    page_table: SoftPageTable,
    supplemental: SupplementalTable,
}

impl Process {
    pub fn id(&self) -> ProcessId {
        self.id
    }

    pub fn page_table(&self) -> &SoftPageTable {
        &self.page_table
    }

    pub fn supplemental(&self) -> &SupplementalTable {
        &self.supplemental
    }
}

/// A registry of live processes, keyed by id.
///
/// Stores `Weak<Process>` so the registry (and through it, the frame
/// table) never keeps a process alive: process teardown and frame
/// teardown stay independent. A process that drops without unregistering
/// simply resolves to `None` from then on.
pub struct ProcessRegistry {
    // id -> Weak<Process>
    procs: RwLock<HashMap<ProcessId, Weak<Process>>>,
    next_id: AtomicU32,
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self {
            procs: RwLock::new(HashMap::new()),
            next_id: AtomicU32::new(1),
        }
    }

    /// Creates a process with fresh tables, registers it, and returns the
    /// owning handle.
    pub fn register(&self) -> Arc<Process> {
        let id = ProcessId::new(self.next_id.fetch_add(1, Ordering::Relaxed));

        let process = Arc::new(Process {
            id,
            page_table: SoftPageTable::new(),
            supplemental: SupplementalTable::new(),
        });

        self.procs.write().insert(id, Arc::downgrade(&process));
        process
    }

    /// Resolves an id to its process, if it is still alive and registered.
    pub fn resolve(&self, id: ProcessId) -> Option<Arc<Process>> {
        self.procs.read().get(&id).and_then(Weak::upgrade)
    }

    /// Unregisters a process on teardown.
    ///
    /// The caller is responsible for freeing the process's frames first;
    /// a frame whose owner cannot be resolved is structural corruption to
    /// the eviction path.
    pub fn unregister(&self, id: ProcessId) {
        self.procs.write().remove(&id);
    }
}

impl Default for ProcessRegistry {
    fn default() -> Self {
        Self::new()
    }
}
