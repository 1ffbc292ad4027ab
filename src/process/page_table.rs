//! Per-process page table with simulated hardware accessed bits.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::phys::FrameId;

/// A virtual page number within one process's address space.
///
/// Page numbers are only meaningful relative to their owning process;
/// two processes may map the same VirtPage to different frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VirtPage(pub u64);

impl VirtPage {
    /// Creates a new VirtPage from a page number.
    pub const fn new(page_num: u64) -> Self {
        Self(page_num)
    }

    /// Returns the page number.
    pub const fn page_num(&self) -> u64 {
        self.0
    }
}

struct Mapping {
    frame: FrameId,
    accessed: bool,
}

/// Software page table for one process.
///
/// Stands in for the hardware page table of the real kernel: it maps
/// virtual pages to frames and carries the per-mapping accessed bit the
/// eviction scanner inspects. In the real system the MMU sets the
/// accessed bit on every load or store; here callers simulate a touch
/// with [`SoftPageTable::set_accessed`].
///
/// Mappings are installed by the fault handler after it obtains a frame,
/// and cleared by the frame manager when that frame is evicted.
pub struct SoftPageTable {
    mappings: Mutex<HashMap<VirtPage, Mapping>>,
}

impl SoftPageTable {
    pub fn new() -> Self {
        Self {
            mappings: Mutex::new(HashMap::new()),
        }
    }

    /// Installs (or replaces) the mapping for `page`.
    ///
    /// A fresh mapping starts with the accessed bit clear, as after a TLB
    /// fill that has not been touched yet.
    pub fn map(&self, page: VirtPage, frame: FrameId) {
        self.mappings.lock().insert(
            page,
            Mapping {
                frame,
                accessed: false,
            },
        );
    }

    /// Removes the mapping for `page` so no further access can reach the
    /// frame. Returns whether a mapping existed.
    pub fn clear_mapping(&self, page: VirtPage) -> bool {
        self.mappings.lock().remove(&page).is_some()
    }

    /// Returns the frame currently mapped at `page`, if any.
    pub fn lookup(&self, page: VirtPage) -> Option<FrameId> {
        self.mappings.lock().get(&page).map(|m| m.frame)
    }

    /// Returns the accessed bit for `page`; unmapped pages read as not
    /// accessed.
    pub fn is_accessed(&self, page: VirtPage) -> bool {
        self.mappings
            .lock()
            .get(&page)
            .map(|m| m.accessed)
            .unwrap_or(false)
    }

    /// Sets or clears the accessed bit for `page`.
    ///
    /// Setting it simulates a hardware touch; the eviction scanner clears
    /// it to grant a second chance. No-op on unmapped pages.
    pub fn set_accessed(&self, page: VirtPage, accessed: bool) {
        if let Some(mapping) = self.mappings.lock().get_mut(&page) {
            mapping.accessed = accessed;
        }
    }

    /// Number of installed mappings.
    pub fn mapped_count(&self) -> usize {
        self.mappings.lock().len()
    }
}

impl Default for SoftPageTable {
    fn default() -> Self {
        Self::new()
    }
}
