//! Frame manager errors.

use std::collections::TryReserveError;

/// Frame manager errors.
///
/// This is the recoverable surface of [`allocate`]: conditions the caller
/// (the page-fault handler) is expected to handle, typically by failing
/// the faulting process. Violated invariants (table corruption, pinning
/// an untracked frame, eviction finding nothing evictable) are not
/// errors but panics; they mean the kernel itself is broken.
///
/// [`allocate`]: crate::frame::FrameManager::allocate
#[derive(Debug)]
pub enum FrameError {
    /// The entry record could not be allocated (kernel heap exhaustion).
    ///
    /// The physical frame acquired for the request has already been
    /// returned to the pool when this is surfaced.
    EntryAlloc(TryReserveError),
}

impl std::fmt::Display for FrameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameError::EntryAlloc(e) => {
                write!(f, "frame table entry allocation failed: {}", e)
            }
        }
    }
}

impl std::error::Error for FrameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FrameError::EntryAlloc(e) => Some(e),
        }
    }
}

impl From<TryReserveError> for FrameError {
    fn from(e: TryReserveError) -> Self {
        FrameError::EntryAlloc(e)
    }
}
