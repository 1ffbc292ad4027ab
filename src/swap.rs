//! Backing store for evicted frame contents.
//!
//! When the frame manager evicts a victim frame, the victim's contents
//! are written out to a swap store and the slot is recorded in the owning
//! process's supplemental table. A later fault on that page reads the
//! slot back and releases it for reuse.
//!
//! # Components
//!
//! - [`SwapSlot`]: slot identity within a store
//! - [`SwapStore`]: store trait consumed by the frame manager
//! - [`MemorySwap`]: in-memory store for testing
//! - [`FileSwap`]: file-backed store using tokio::fs

mod error;
mod file;
mod memory;
mod slot;

pub use error::SwapError;
pub use file::FileSwap;
pub use memory::MemorySwap;
pub use slot::SwapSlot;

use crate::phys::FRAME_SIZE;

/// Backing store trait for frame-sized swap I/O.
///
/// A store hands out slots on write and recycles them on release. All
/// I/O is whole-frame (`FRAME_SIZE` bytes) through caller-owned buffers;
/// the store never sees frame or page identities, only slots.
///
/// # Design Decisions
///
/// 1. **Async trait**: swap I/O is device I/O. `FileSwap` uses tokio::fs;
///    `MemorySwap` completes immediately.
///
/// 2. **Store-assigned slots**: `write_out` picks the slot (recycled or
///    fresh) so callers cannot double-occupy one.
///
/// 3. **Explicit release**: reading a slot back does not free it; the
///    fault-resolution logic decides when the copy is no longer needed.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`, and the returned futures `Send`:
/// the frame manager awaits `write_out` while holding its state lock.
pub trait SwapStore: Send + Sync {
    /// Writes one frame's contents to a free slot and returns the slot.
    ///
    /// # Errors
    ///
    /// Returns `SwapError::InvalidBufferSize` if `buf.len() != FRAME_SIZE`.
    /// Returns `SwapError::SwapFull` if the store has a capacity limit and
    /// no slot is available.
    fn write_out(
        &self,
        buf: &[u8],
    ) -> impl std::future::Future<Output = Result<SwapSlot, SwapError>> + Send;

    /// Reads a slot's contents into a caller-provided buffer.
    ///
    /// The slot stays occupied; call [`SwapStore::release`] once the copy
    /// is resident again.
    ///
    /// # Errors
    ///
    /// Returns `SwapError::UnknownSlot` if the slot is not occupied.
    /// Returns `SwapError::InvalidBufferSize` if `buf.len() != FRAME_SIZE`.
    fn read_back(
        &self,
        slot: SwapSlot,
        buf: &mut [u8],
    ) -> impl std::future::Future<Output = Result<(), SwapError>> + Send;

    /// Frees a slot for reuse by a later `write_out`.
    ///
    /// # Errors
    ///
    /// Returns `SwapError::UnknownSlot` if the slot is not occupied.
    fn release(
        &self,
        slot: SwapSlot,
    ) -> impl std::future::Future<Output = Result<(), SwapError>> + Send;

    /// Number of currently occupied slots.
    fn slot_count(&self) -> impl std::future::Future<Output = u64> + Send;
}

/// Validates a swap I/O buffer length.
fn check_buffer(len: usize) -> Result<(), SwapError> {
    if len != FRAME_SIZE {
        return Err(SwapError::InvalidBufferSize {
            expected: FRAME_SIZE,
            actual: len,
        });
    }
    Ok(())
}
