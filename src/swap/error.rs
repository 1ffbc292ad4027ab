//! Swap store errors.

use crate::swap::SwapSlot;

/// Swap store errors.
#[derive(Debug)]
pub enum SwapError {
    /// The slot is not occupied (never written, or already released).
    UnknownSlot(SwapSlot),

    /// Invalid buffer size passed to write_out or read_back.
    ///
    /// Swap I/O is whole-frame only; buffers must be exactly FRAME_SIZE
    /// bytes.
    InvalidBufferSize {
        /// Expected buffer size (FRAME_SIZE)
        expected: usize,
        /// Actual buffer size provided
        actual: usize,
    },

    /// The store has a capacity limit and every slot is occupied.
    ///
    /// The paging core treats the backing store as always-available, so
    /// hitting this during eviction is fatal there; it is an ordinary
    /// error at this layer.
    SwapFull,

    /// I/O error from the underlying swap device.
    Io(std::io::Error),

    /// The swap file has an invalid format or size.
    Corrupted(String),
}

impl std::fmt::Display for SwapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SwapError::UnknownSlot(slot) => write!(f, "unknown swap slot: {:?}", slot),
            SwapError::InvalidBufferSize { expected, actual } => {
                write!(f, "invalid buffer size: expected {}, got {}", expected, actual)
            }
            SwapError::SwapFull => write!(f, "swap store is full"),
            SwapError::Io(e) => write!(f, "swap I/O error: {}", e),
            SwapError::Corrupted(msg) => write!(f, "swap file corruption: {}", msg),
        }
    }
}

impl std::error::Error for SwapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SwapError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SwapError {
    fn from(e: std::io::Error) -> Self {
        SwapError::Io(e)
    }
}
