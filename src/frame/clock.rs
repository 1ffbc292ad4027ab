//! Second-chance (clock) eviction over the live frames.

use std::collections::TryReserveError;

use super::entry::FrameTableEntry;
use super::registry::FrameRegistry;
use crate::phys::FrameId;

/// Circular scan order over the live frames, plus the clock cursor.
///
/// Frames are scanned in insertion order, wrapping around; the cursor
/// persists across calls so successive evictions continue where the last
/// one stopped instead of restarting, which is what makes the policy
/// approximate LRU. The cursor is an index into the order vector, with
/// `None` meaning "reset, start from the beginning"; removal keeps it
/// valid, never pointing at a vacated slot.
pub struct ClockScanner {
    /// Live frames in insertion order.
    order: Vec<FrameId>,
    /// Index of the last inspected slot; `None` after reset.
    cursor: Option<usize>,
}

impl ClockScanner {
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            cursor: None,
        }
    }

    /// Reserves room for `additional` frames, surfacing heap exhaustion
    /// as an error instead of aborting.
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), TryReserveError> {
        self.order.try_reserve(additional)
    }

    /// Appends a frame at the end of the scan order.
    pub fn push(&mut self, frame: FrameId) {
        debug_assert!(
            !self.order.contains(&frame),
            "frame {:?} already in the eviction order",
            frame
        );
        self.order.push(frame);
    }

    /// Removes a frame from the scan order, keeping the cursor valid.
    ///
    /// No-op if the frame is not present (it was never inserted or was
    /// already removed by the same free/evict path that is calling us).
    pub fn remove(&mut self, frame: FrameId) {
        let Some(idx) = self.order.iter().position(|&f| f == frame) else {
            return;
        };
        self.order.remove(idx);

        self.cursor = match self.cursor {
            None => None,
            Some(_) if self.order.is_empty() => None,
            // Everything after idx shifted down one slot.
            Some(c) if idx < c => Some(c - 1),
            // The cursor's own slot was vacated: step back so the next
            // advance lands on the element that followed the removed one.
            Some(c) if idx == c => c.checked_sub(1),
            Some(c) => Some(c),
        };
    }

    /// Number of frames in the scan order.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Advances the cursor one step, wrapping, and returns the frame at
    /// the new position.
    fn advance(&mut self) -> FrameId {
        debug_assert!(!self.order.is_empty());
        let next = match self.cursor {
            Some(c) if c + 1 < self.order.len() => c + 1,
            _ => 0,
        };
        self.cursor = Some(next);
        self.order[next]
    }

    /// Picks the eviction victim: the first frame that is neither pinned
    /// nor recently accessed.
    ///
    /// `second_chance` is called for each unpinned candidate; it must
    /// report whether the entry's page was accessed since the last scan
    /// and, if so, clear the accessed bit. Accessed entries are skipped;
    /// that clearing is their second chance. The scan is bounded at
    /// `2n + 1` steps: one full lap may do nothing but clear accessed
    /// bits, after which the next lap is guaranteed a quiet entry unless
    /// everything is pinned. The bound assumes this scanner is the only
    /// thing clearing accessed bits during the scan; an MMU setting bits
    /// concurrently can stretch a scan, but only sustained "every frame
    /// hot or pinned" keeps it at the bound, and that is the same
    /// exhaustion condition.
    ///
    /// # Panics
    ///
    /// Panics if the order is empty or inconsistent with the registry
    /// (structural corruption: eviction was invoked with nothing to
    /// evict), and when the step bound is exceeded (every frame pinned or
    /// permanently hot, so the system cannot make progress).
    pub fn pick_victim<F>(&mut self, registry: &FrameRegistry, mut second_chance: F) -> FrameId
    where
        F: FnMut(&FrameTableEntry) -> bool,
    {
        let n = self.order.len();
        assert!(
            n > 0,
            "eviction requested with no live frames; the frame table leaked"
        );
        assert_eq!(
            n,
            registry.len(),
            "eviction order and frame registry disagree on the live frame count"
        );

        for _ in 0..=2 * n {
            let frame = self.advance();
            let entry = registry.get(frame).unwrap_or_else(|| {
                panic!("eviction order contains untracked frame {:?}", frame)
            });

            if entry.pinned {
                continue;
            }
            if second_chance(entry) {
                continue;
            }
            return frame;
        }

        panic!(
            "no evictable frame among {} live frames after {} steps: out of memory",
            n,
            2 * n + 1
        );
    }
}

impl Default for ClockScanner {
    fn default() -> Self {
        Self::new()
    }
}
