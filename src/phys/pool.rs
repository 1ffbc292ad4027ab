//! The physical page pool.

use parking_lot::Mutex;

use super::error::MemoryError;
use super::frame::{FrameData, FrameId, FRAME_SIZE};

/// Physical page pool trait consumed by the frame manager.
///
/// The pool owns the frame buffers and a free list; it knows nothing
/// about pages, processes, or eviction. Frame contents are accessed
/// through caller-owned buffers so the pool never leaks references into
/// the frame manager's locking discipline.
///
/// # Contract
///
/// - `acquire` is wait-free: it either pops a free frame or reports
///   exhaustion with `None`. It never blocks and never evicts; eviction
///   is the frame manager's job.
/// - `release` returns a frame to the free list. Releasing a frame that
///   is still tracked by the frame table is a caller bug the pool cannot
///   detect.
/// - `read`/`write` copy whole frames; buffers must be exactly
///   `FRAME_SIZE` bytes.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; the frame manager calls in from
/// multiple tasks.
pub trait PhysicalMemory: Send + Sync {
    /// Pops a free frame, or `None` if the pool is exhausted.
    fn acquire(&self) -> Option<FrameId>;

    /// Returns a frame to the free list.
    fn release(&self, frame: FrameId);

    /// Copies a frame's contents into a caller-provided buffer.
    ///
    /// # Errors
    ///
    /// Returns `MemoryError::UnknownFrame` if `frame` is out of range.
    /// Returns `MemoryError::InvalidBufferSize` if `buf.len() != FRAME_SIZE`.
    fn read(&self, frame: FrameId, buf: &mut [u8]) -> Result<(), MemoryError>;

    /// Overwrites a frame's contents from a caller-provided buffer.
    ///
    /// # Errors
    ///
    /// Returns `MemoryError::UnknownFrame` if `frame` is out of range.
    /// Returns `MemoryError::InvalidBufferSize` if `buf.len() != FRAME_SIZE`.
    fn write(&self, frame: FrameId, buf: &[u8]) -> Result<(), MemoryError>;

    /// Total number of frames in the pool, free or not.
    fn capacity(&self) -> usize;
}

/// The concrete physical memory pool.
///
/// Pre-allocates `capacity` page-aligned frames and starts with all of
/// them on the free list. Each frame buffer has its own lock so
/// concurrent copies to distinct frames do not serialize; the free list
/// has a separate lock for pop/push.
pub struct MainMemory {
    /// Frame buffers, indexed by FrameId. Immutable after construction.
    frames: Vec<Mutex<FrameData>>,

    /// Free frames, popped from the back.
    free: Mutex<Vec<FrameId>>,
}

impl MainMemory {
    /// Creates a pool of `capacity` zeroed frames, all free.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be > 0");

        let frames: Vec<_> = (0..capacity).map(|_| Mutex::new(FrameData::new())).collect();

        // Reversed so acquire hands out ascending indices.
        let free: Vec<_> = (0..capacity as u32).rev().map(FrameId::new).collect();

        Self {
            frames,
            free: Mutex::new(free),
        }
    }

    /// Number of frames currently on the free list.
    pub fn free_count(&self) -> usize {
        self.free.lock().len()
    }
}

impl PhysicalMemory for MainMemory {
    fn acquire(&self) -> Option<FrameId> {
        self.free.lock().pop()
    }

    fn release(&self, frame: FrameId) {
        assert!(
            frame.index() < self.frames.len(),
            "release of frame {:?} outside pool of {}",
            frame,
            self.frames.len()
        );

        let mut free = self.free.lock();
        debug_assert!(
            !free.contains(&frame),
            "double release of frame {:?}",
            frame
        );
        free.push(frame);
    }

    fn read(&self, frame: FrameId, buf: &mut [u8]) -> Result<(), MemoryError> {
        if buf.len() != FRAME_SIZE {
            return Err(MemoryError::InvalidBufferSize {
                expected: FRAME_SIZE,
                actual: buf.len(),
            });
        }

        let data = self
            .frames
            .get(frame.index())
            .ok_or(MemoryError::UnknownFrame(frame))?
            .lock();

        buf.copy_from_slice(data.as_slice());
        Ok(())
    }

    fn write(&self, frame: FrameId, buf: &[u8]) -> Result<(), MemoryError> {
        if buf.len() != FRAME_SIZE {
            return Err(MemoryError::InvalidBufferSize {
                expected: FRAME_SIZE,
                actual: buf.len(),
            });
        }

        let mut data = self
            .frames
            .get(frame.index())
            .ok_or(MemoryError::UnknownFrame(frame))?
            .lock();

        data.as_mut_slice().copy_from_slice(buf);
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.frames.len()
    }
}
