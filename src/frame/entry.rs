//! Frame table entries.

use crate::phys::FrameId;
use crate::process::{ProcessId, VirtPage};

/// One entry of the frame table: a live physical frame and what it backs.
///
/// An entry exists exactly as long as its frame is handed out: it is
/// created when allocation succeeds and destroyed when the frame is freed
/// or evicted. The owner is a non-owning [`ProcessId`] resolved through
/// the process registry when the owner's page table is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTableEntry {
    /// The physical frame; unique key of the frame table.
    pub frame: FrameId,
    /// The virtual page currently backed by the frame.
    pub page: VirtPage,
    /// The process whose address space maps `page`.
    pub owner: ProcessId,
    /// While true, the frame is off-limits to the eviction scanner.
    pub pinned: bool,
}

impl FrameTableEntry {
    /// Creates an entry for a freshly allocated frame, unpinned.
    pub fn new(frame: FrameId, page: VirtPage, owner: ProcessId) -> Self {
        Self {
            frame,
            page,
            owner,
            pinned: false,
        }
    }
}
