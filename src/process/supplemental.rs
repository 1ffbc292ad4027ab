//! Supplemental page table: where each page's contents currently live.

use std::collections::HashMap;

use parking_lot::Mutex;

use super::page_table::VirtPage;
use crate::phys::FrameId;
use crate::swap::SwapSlot;

/// Current home of a virtual page's contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLocation {
    /// Backed by a physical frame.
    Resident(FrameId),
    /// Written out to the given swap slot.
    Swapped(SwapSlot),
}

/// Supplemental page table for one process.
///
/// The hardware page table only says where a page is *mapped*; this table
/// remembers where its *contents* are, which is what fault resolution
/// needs after an eviction has torn the mapping down. The frame manager
/// records the swap slot here during eviction; the fault handler records
/// residency when it maps a page in, and consults [`location`] to decide
/// whether a faulting page must be fetched from swap.
///
/// [`location`]: SupplementalTable::location
pub struct SupplementalTable {
    entries: Mutex<HashMap<VirtPage, PageLocation>>,
}

impl SupplementalTable {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Records that `page` is resident in `frame`.
    pub fn record_resident(&self, page: VirtPage, frame: FrameId) {
        self.entries
            .lock()
            .insert(page, PageLocation::Resident(frame));
    }

    /// Records that `page`'s contents were written out to `slot`.
    pub fn record_swapped(&self, page: VirtPage, slot: SwapSlot) {
        self.entries
            .lock()
            .insert(page, PageLocation::Swapped(slot));
    }

    /// Returns where `page`'s contents currently live, if tracked.
    pub fn location(&self, page: VirtPage) -> Option<PageLocation> {
        self.entries.lock().get(&page).copied()
    }

    /// Drops the record for `page`, returning its last location.
    pub fn remove(&self, page: VirtPage) -> Option<PageLocation> {
        self.entries.lock().remove(&page)
    }

    /// Number of tracked pages.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Default for SupplementalTable {
    fn default() -> Self {
        Self::new()
    }
}
