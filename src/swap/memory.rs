//! In-memory swap store for testing.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::phys::FRAME_SIZE;
use crate::swap::{check_buffer, SwapError, SwapSlot, SwapStore};

/// In-memory swap store for testing.
///
/// Keeps evicted frame contents in a `HashMap` behind a `parking_lot`
/// mutex. Slot numbers are recycled through a free list before fresh
/// ones are handed out, so tests exercise the same reuse behavior as the
/// file-backed store. Not persistent.
pub struct MemorySwap {
    inner: Mutex<MemorySwapInner>,
    /// Optional slot limit (for testing swap-full scenarios).
    max_slots: Option<u64>,
}

struct MemorySwapInner {
    /// Occupied slots and their contents.
    slots: HashMap<SwapSlot, Box<[u8; FRAME_SIZE]>>,
    /// Released slot numbers awaiting reuse.
    free: Vec<SwapSlot>,
    /// Next never-used slot number.
    next_slot: u64,
}

impl MemorySwap {
    /// Creates a new empty swap store with no capacity limit.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MemorySwapInner {
                slots: HashMap::new(),
                free: Vec::new(),
                next_slot: 0,
            }),
            max_slots: None,
        }
    }

    /// Creates a swap store that holds at most `max_slots` occupied slots.
    ///
    /// This is useful for testing `SwapFull` scenarios.
    pub fn with_max_slots(max_slots: u64) -> Self {
        Self {
            inner: Mutex::new(MemorySwapInner {
                slots: HashMap::new(),
                free: Vec::new(),
                next_slot: 0,
            }),
            max_slots: Some(max_slots),
        }
    }
}

impl Default for MemorySwap {
    fn default() -> Self {
        Self::new()
    }
}

impl SwapStore for MemorySwap {
    async fn write_out(&self, buf: &[u8]) -> Result<SwapSlot, SwapError> {
        check_buffer(buf.len())?;

        let mut inner = self.inner.lock();

        let slot = match inner.free.pop() {
            Some(slot) => slot,
            None => {
                if let Some(max) = self.max_slots {
                    if inner.next_slot >= max {
                        return Err(SwapError::SwapFull);
                    }
                }
                let slot = SwapSlot::new(inner.next_slot);
                inner.next_slot += 1;
                slot
            }
        };

        let mut contents = Box::new([0u8; FRAME_SIZE]);
        contents.copy_from_slice(buf);
        inner.slots.insert(slot, contents);

        Ok(slot)
    }

    async fn read_back(&self, slot: SwapSlot, buf: &mut [u8]) -> Result<(), SwapError> {
        check_buffer(buf.len())?;

        let inner = self.inner.lock();
        let contents = inner.slots.get(&slot).ok_or(SwapError::UnknownSlot(slot))?;

        buf.copy_from_slice(&**contents);
        Ok(())
    }

    async fn release(&self, slot: SwapSlot) -> Result<(), SwapError> {
        let mut inner = self.inner.lock();

        if inner.slots.remove(&slot).is_none() {
            return Err(SwapError::UnknownSlot(slot));
        }
        inner.free.push(slot);
        Ok(())
    }

    async fn slot_count(&self) -> u64 {
        self.inner.lock().slots.len() as u64
    }
}
