//! Physical memory errors.

use crate::phys::FrameId;

/// Physical memory errors.
#[derive(Debug)]
pub enum MemoryError {
    /// The frame index is outside the pool.
    ///
    /// The pool only ever hands out indices below its capacity, so seeing
    /// this from a frame obtained through `acquire` means the caller's
    /// bookkeeping is corrupt.
    UnknownFrame(FrameId),

    /// Invalid buffer size passed to read or write.
    ///
    /// Frame I/O is whole-frame only; buffers must be exactly FRAME_SIZE
    /// bytes.
    InvalidBufferSize {
        /// Expected buffer size (FRAME_SIZE)
        expected: usize,
        /// Actual buffer size provided
        actual: usize,
    },
}

impl std::fmt::Display for MemoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MemoryError::UnknownFrame(frame) => write!(f, "unknown frame: {:?}", frame),
            MemoryError::InvalidBufferSize { expected, actual } => {
                write!(f, "invalid buffer size: expected {}, got {}", expected, actual)
            }
        }
    }
}

impl std::error::Error for MemoryError {}
