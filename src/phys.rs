//! Physical memory: frames, the page pool, and frame buffers.
//!
//! The paging subsystem treats physical memory as a fixed array of
//! `FRAME_SIZE` frames. The pool hands out free frames wait-free and takes
//! them back on release; it performs no bookkeeping beyond the free list.
//! Which page occupies which frame, and for which process, is tracked by
//! the frame table in [`crate::frame`].
//!
//! # Components
//!
//! - [`FrameId`], [`FRAME_SIZE`]: frame identity and granularity
//! - [`FrameData`]: a page-aligned frame buffer
//! - [`PhysicalMemory`]: pool trait consumed by the frame manager
//! - [`MainMemory`]: the concrete pool

mod error;
mod frame;
mod pool;

pub use error::MemoryError;
pub use frame::{FrameData, FrameId, FRAME_SIZE};
pub use pool::{MainMemory, PhysicalMemory};
