//! The frame registry: FrameId → entry.

use std::collections::{HashMap, TryReserveError};

use super::entry::FrameTableEntry;
use crate::phys::FrameId;

/// Mapping from frame identity to its table entry.
///
/// A pure lookup structure: key uniqueness is the only invariant it
/// enforces itself. Keeping it consistent with the eviction order is the
/// manager's job, done under the manager's lock.
pub struct FrameRegistry {
    entries: HashMap<FrameId, FrameTableEntry>,
}

impl FrameRegistry {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Reserves room for `additional` entries, surfacing heap exhaustion
    /// as an error instead of aborting.
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), TryReserveError> {
        self.entries.try_reserve(additional)
    }

    /// Adds a new entry.
    ///
    /// # Panics
    ///
    /// Panics if an entry with the same frame already exists: two live
    /// entries per frame means the allocator handed the same frame out
    /// twice.
    pub fn insert(&mut self, entry: FrameTableEntry) {
        let frame = entry.frame;
        if self.entries.insert(frame, entry).is_some() {
            panic!("frame {:?} already has a live frame table entry", frame);
        }
    }

    /// Looks up the entry for `frame`.
    pub fn get(&self, frame: FrameId) -> Option<&FrameTableEntry> {
        self.entries.get(&frame)
    }

    /// Looks up the entry for `frame`, mutably.
    pub fn get_mut(&mut self, frame: FrameId) -> Option<&mut FrameTableEntry> {
        self.entries.get_mut(&frame)
    }

    /// Removes and returns the entry for `frame`.
    ///
    /// Absence is not an error: a concurrent eviction may legitimately
    /// have reclaimed the frame already. The caller decides whether
    /// `None` matters.
    pub fn remove(&mut self, frame: FrameId) -> Option<FrameTableEntry> {
        self.entries.remove(&frame)
    }

    pub fn contains(&self, frame: FrameId) -> bool {
        self.entries.contains_key(&frame)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for FrameRegistry {
    fn default() -> Self {
        Self::new()
    }
}
