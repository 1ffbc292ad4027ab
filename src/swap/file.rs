//! File-backed swap store.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tokio::fs::{File as TokioFile, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};

use crate::phys::FRAME_SIZE;
use crate::swap::{check_buffer, SwapError, SwapSlot, SwapStore};

/// File-backed swap store.
///
/// Stores evicted frame contents as contiguous `FRAME_SIZE` blocks in a
/// single file, extending it as fresh slots are needed and recycling
/// released slots before growing.
///
/// # File Layout
///
/// ```text
/// +------------------+------------------+------------------+
/// | Slot 0 (4KB)     | Slot 1 (4KB)     | Slot 2 (4KB)     | ...
/// +------------------+------------------+------------------+
/// ^ offset 0         ^ offset 4096      ^ offset 8192
/// ```
///
/// # Concurrency
///
/// A `tokio::sync::Mutex` around the file handle serializes I/O; the slot
/// table has its own synchronous lock and is never held across I/O, so a
/// slot is reserved first and the data lands under the file lock.
///
/// # Durability
///
/// Swap contents are scratch state: they only need to outlive the frame,
/// not a crash. No fsync is issued.
pub struct FileSwap {
    /// Path to the swap file
    path: PathBuf,
    /// File handle wrapped in async mutex for serialized access
    file: tokio::sync::Mutex<TokioFile>,
    /// Slot accounting (next fresh slot + free list)
    slots: Mutex<SlotTable>,
}

struct SlotTable {
    /// Next never-used slot number; the file holds this many slots.
    next_slot: u64,
    /// Released slot numbers awaiting reuse.
    free: Vec<SwapSlot>,
}

impl SlotTable {
    fn is_occupied(&self, slot: SwapSlot) -> bool {
        slot.slot_num() < self.next_slot && !self.free.contains(&slot)
    }
}

impl FileSwap {
    /// Opens or creates a swap file at the given path.
    ///
    /// An existing file's slots are all treated as occupied: evicted
    /// contents must stay recoverable until explicitly released.
    ///
    /// # Errors
    ///
    /// Returns `SwapError::Corrupted` if the file size is not a multiple
    /// of FRAME_SIZE.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, SwapError> {
        let path = path.into();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .await?;

        let metadata = file.metadata().await?;
        let file_size = metadata.len();

        if file_size % FRAME_SIZE as u64 != 0 {
            return Err(SwapError::Corrupted(format!(
                "swap file size {} is not a multiple of frame size {}",
                file_size, FRAME_SIZE
            )));
        }

        Ok(Self {
            path,
            file: tokio::sync::Mutex::new(file),
            slots: Mutex::new(SlotTable {
                next_slot: file_size / FRAME_SIZE as u64,
                free: Vec::new(),
            }),
        })
    }

    /// Returns the path to the swap file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SwapStore for FileSwap {
    async fn write_out(&self, buf: &[u8]) -> Result<SwapSlot, SwapError> {
        check_buffer(buf.len())?;

        // Reserve a slot before touching the file.
        let slot = {
            let mut slots = self.slots.lock();
            match slots.free.pop() {
                Some(slot) => slot,
                None => {
                    let slot = SwapSlot::new(slots.next_slot);
                    slots.next_slot += 1;
                    slot
                }
            }
        };

        let mut file = self.file.lock().await;
        let result: Result<(), SwapError> = async {
            file.seek(std::io::SeekFrom::Start(slot.byte_offset()))
                .await?;
            file.write_all(buf).await?;
            Ok(())
        }
        .await;

        if let Err(e) = result {
            // The reserved slot never got its data; hand it back.
            self.slots.lock().free.push(slot);
            return Err(e);
        }

        Ok(slot)
    }

    async fn read_back(&self, slot: SwapSlot, buf: &mut [u8]) -> Result<(), SwapError> {
        check_buffer(buf.len())?;

        if !self.slots.lock().is_occupied(slot) {
            return Err(SwapError::UnknownSlot(slot));
        }

        let mut file = self.file.lock().await;
        file.seek(std::io::SeekFrom::Start(slot.byte_offset()))
            .await?;
        file.read_exact(buf).await?;

        Ok(())
    }

    async fn release(&self, slot: SwapSlot) -> Result<(), SwapError> {
        let mut slots = self.slots.lock();

        if !slots.is_occupied(slot) {
            return Err(SwapError::UnknownSlot(slot));
        }
        slots.free.push(slot);
        Ok(())
    }

    async fn slot_count(&self) -> u64 {
        let slots = self.slots.lock();
        slots.next_slot - slots.free.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn open_temp(dir: &tempfile::TempDir) -> FileSwap {
        FileSwap::open(dir.path().join("swap.img")).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_new_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("swap.img");
        let swap = FileSwap::open(&path).await.unwrap();
        assert_eq!(swap.slot_count().await, 0);
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_corrupted_file_size() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("swap.img");
        tokio::fs::write(&path, vec![0u8; 100]).await.unwrap();
        let result = FileSwap::open(&path).await;
        assert!(matches!(result, Err(SwapError::Corrupted(_))));
    }

    #[tokio::test]
    async fn test_write_and_read_back() {
        let dir = tempdir().unwrap();
        let swap = open_temp(&dir).await;

        let mut out = vec![0u8; FRAME_SIZE];
        out[0] = 0xAA;
        out[FRAME_SIZE - 1] = 0xBB;
        let slot = swap.write_out(&out).await.unwrap();

        let mut buf = vec![0u8; FRAME_SIZE];
        swap.read_back(slot, &mut buf).await.unwrap();
        assert_eq!(buf[0], 0xAA);
        assert_eq!(buf[FRAME_SIZE - 1], 0xBB);
    }

    #[tokio::test]
    async fn test_slots_are_distinct() {
        let dir = tempdir().unwrap();
        let swap = open_temp(&dir).await;

        let a = swap.write_out(&vec![1u8; FRAME_SIZE]).await.unwrap();
        let b = swap.write_out(&vec![2u8; FRAME_SIZE]).await.unwrap();
        assert_ne!(a, b);

        let mut buf = vec![0u8; FRAME_SIZE];
        swap.read_back(a, &mut buf).await.unwrap();
        assert_eq!(buf[0], 1);
        swap.read_back(b, &mut buf).await.unwrap();
        assert_eq!(buf[0], 2);
    }

    #[tokio::test]
    async fn test_release_recycles_slot() {
        let dir = tempdir().unwrap();
        let swap = open_temp(&dir).await;

        let a = swap.write_out(&vec![1u8; FRAME_SIZE]).await.unwrap();
        let _b = swap.write_out(&vec![2u8; FRAME_SIZE]).await.unwrap();

        swap.release(a).await.unwrap();
        assert_eq!(swap.slot_count().await, 1);

        let c = swap.write_out(&vec![3u8; FRAME_SIZE]).await.unwrap();
        assert_eq!(c, a);
        assert_eq!(swap.slot_count().await, 2);
    }

    #[tokio::test]
    async fn test_read_back_released_slot() {
        let dir = tempdir().unwrap();
        let swap = open_temp(&dir).await;

        let slot = swap.write_out(&vec![0u8; FRAME_SIZE]).await.unwrap();
        swap.release(slot).await.unwrap();

        let mut buf = vec![0u8; FRAME_SIZE];
        let result = swap.read_back(slot, &mut buf).await;
        assert!(matches!(result, Err(SwapError::UnknownSlot(_))));
    }

    #[tokio::test]
    async fn test_contents_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("swap.img");
        let slot;

        {
            let swap = FileSwap::open(&path).await.unwrap();
            let mut out = vec![0u8; FRAME_SIZE];
            out[7] = 77;
            slot = swap.write_out(&out).await.unwrap();
        }

        {
            let swap = FileSwap::open(&path).await.unwrap();
            assert_eq!(swap.slot_count().await, 1);

            let mut buf = vec![0u8; FRAME_SIZE];
            swap.read_back(slot, &mut buf).await.unwrap();
            assert_eq!(buf[7], 77);
        }
    }
}
