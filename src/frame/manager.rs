//! The frame allocator/deallocator.

use std::collections::TryReserveError;
use std::sync::Arc;

use tokio::sync::Mutex;

use super::clock::ClockScanner;
use super::entry::FrameTableEntry;
use super::error::FrameError;
use super::registry::FrameRegistry;
use crate::phys::{FrameId, PhysicalMemory, FRAME_SIZE};
use crate::process::{Process, ProcessId, ProcessRegistry, VirtPage};
use crate::swap::SwapStore;

/// The public entry point of the paging core: hands out frames, frees
/// them, and evicts when the pool runs dry.
///
/// # Architecture
///
/// ```text
/// +-------------------+
/// |   Fault handler   |
/// +-------------------+
///          |  allocate / free / pin / unpin
///          v
/// +-------------------+     resolves owners via
/// |   FrameManager    | --> ProcessRegistry -> SoftPageTable
/// +-------------------+                        SupplementalTable
///       |         |
///       v         v
/// +-----------+ +-----------+
/// | Physical  | | SwapStore |
/// | Memory    | | (trait)   |
/// +-----------+ +-----------+
/// ```
///
/// # Locking
///
/// One async mutex guards the frame table (registry + scan order +
/// cursor). Every operation holds it for its full duration, including
/// the backing-store write inside eviction, so from any other task's
/// perspective an eviction is atomic: the table never shows a frame that
/// is simultaneously free and in use. Tasks that lose the race suspend on
/// the lock; a slow swap write stalls all allocators, which is the
/// accepted trade-off for a small, bounded-concurrency kernel rather
/// than a throughput-oriented server.
///
/// The leaf collaborators (page tables, supplemental tables, the pool's
/// free list) use their own short synchronous locks and are only touched
/// while the table lock is held by mutating paths, so lock order is
/// always table-then-leaf and cannot cycle.
///
/// # Pinning
///
/// A pinned frame is skipped by the eviction scanner. Pinning is how a
/// multi-step operation (e.g. copying data into a frame mid page-in)
/// keeps the contents in place without holding the table lock for the
/// whole operation: pin, do the work, unpin.
pub struct FrameManager<M: PhysicalMemory, S: SwapStore> {
    /// The physical page pool.
    memory: M,

    /// Backing store receiving evicted frame contents.
    swap: S,

    /// Resolves entry owners to their page/supplemental tables.
    processes: Arc<ProcessRegistry>,

    /// The frame table; see the locking notes above.
    table: Mutex<FrameTable>,
}

/// Registry, scan order, and cursor: mutated together, consistent as a
/// unit under the table lock.
struct FrameTable {
    registry: FrameRegistry,
    clock: ClockScanner,
}

impl FrameTable {
    /// Reserves room for one more entry in both structures, so the
    /// insert that follows cannot fail and leave them disagreeing.
    fn try_reserve(&mut self) -> Result<(), TryReserveError> {
        self.registry.try_reserve(1)?;
        self.clock.try_reserve(1)?;
        Ok(())
    }

    /// Removes an entry from both structures.
    fn remove(&mut self, frame: FrameId) -> Option<FrameTableEntry> {
        let entry = self.registry.remove(frame)?;
        self.clock.remove(frame);
        Some(entry)
    }
}

impl<M: PhysicalMemory, S: SwapStore> FrameManager<M, S> {
    /// Creates a frame manager with an empty table and a reset cursor.
    ///
    /// Constructed once at kernel startup and shared via `Arc`; there is
    /// no teardown.
    pub fn new(memory: M, swap: S, processes: Arc<ProcessRegistry>) -> Self {
        Self {
            memory,
            swap,
            processes,
            table: Mutex::new(FrameTable {
                registry: FrameRegistry::new(),
                clock: ClockScanner::new(),
            }),
        }
    }

    /// Returns the physical page pool.
    pub fn memory(&self) -> &M {
        &self.memory
    }

    /// Returns the backing store.
    pub fn swap(&self) -> &S {
        &self.swap
    }

    /// Allocates a physical frame to back `page` in `owner`'s address
    /// space and tracks it in the frame table, unpinned.
    ///
    /// Tries the pool first; on exhaustion, evicts one victim (clock
    /// policy) and retries, which must then succeed. Installing the
    /// page-table mapping is the caller's job; the fault handler maps
    /// the page once it has filled the frame.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::EntryAlloc`] if the entry record cannot be
    /// allocated; the acquired frame has been returned to the pool.
    ///
    /// # Panics
    ///
    /// Panics on violated invariants: no evictable frame within the scan
    /// bound (every frame pinned, true memory exhaustion), eviction
    /// invoked over an empty table, the backing store failing
    /// mid-eviction, or the pool still empty right after eviction freed
    /// a frame.
    pub async fn allocate(&self, owner: ProcessId, page: VirtPage) -> Result<FrameId, FrameError> {
        let mut table = self.table.lock().await;

        let frame = match self.memory.acquire() {
            Some(frame) => frame,
            None => {
                self.evict(&mut table).await;
                self.memory.acquire().unwrap_or_else(|| {
                    panic!("physical pool still exhausted right after eviction freed a frame")
                })
            }
        };

        if let Err(e) = table.try_reserve() {
            // Out of kernel heap for the entry record: give the frame
            // back and let the fault handler decide the process's fate.
            self.memory.release(frame);
            return Err(FrameError::EntryAlloc(e));
        }

        table.registry.insert(FrameTableEntry::new(frame, page, owner));
        table.clock.push(frame);

        Ok(frame)
    }

    /// Evicts one victim frame and returns its storage to the pool.
    /// Called with the table lock held and the pool exhausted.
    async fn evict(&self, table: &mut FrameTable) {
        let FrameTable { registry, clock } = &mut *table;

        let victim = clock.pick_victim(registry, |entry| {
            let owner = self.owner_of(entry);
            let page_table = owner.page_table();
            if page_table.is_accessed(entry.page) {
                page_table.set_accessed(entry.page, false);
                true
            } else {
                false
            }
        });

        let entry = *registry
            .get(victim)
            .expect("victim frame vanished from the registry");
        let owner = self.owner_of(&entry);

        // Order matters: tear the mapping down before the contents move,
        // so no access can reach the frame once the copy starts.
        owner.page_table().clear_mapping(entry.page);

        let mut contents = vec![0u8; FRAME_SIZE];
        self.memory
            .read(entry.frame, &mut contents)
            .unwrap_or_else(|e| panic!("victim frame {:?} unreadable: {}", entry.frame, e));

        // The store is treated as always-available; failing here leaves
        // the victim unmapped with its contents nowhere, which nothing
        // can recover from.
        let slot = self
            .swap
            .write_out(&contents)
            .await
            .unwrap_or_else(|e| panic!("backing store write failed during eviction: {}", e));

        // A later fault on the victim page finds the slot here.
        owner.supplemental().record_swapped(entry.page, slot);

        table.remove(victim);
        self.memory.release(entry.frame);
    }

    /// Resolves an entry's owner, which must still be alive: processes
    /// free their frames before unregistering, so an unresolvable owner
    /// means the table is corrupt.
    fn owner_of(&self, entry: &FrameTableEntry) -> Arc<Process> {
        self.processes.resolve(entry.owner).unwrap_or_else(|| {
            panic!(
                "frame {:?} is owned by vanished process {:?}",
                entry.frame, entry.owner
            )
        })
    }

    /// Frees a frame: drops its entry and returns it to the pool.
    ///
    /// A frame that is not tracked is silently ignored: a concurrent
    /// eviction may have reclaimed it between the caller's decision and
    /// this call, and freeing twice must be harmless.
    pub async fn free(&self, frame: FrameId) {
        let mut table = self.table.lock().await;
        if table.remove(frame).is_some() {
            self.memory.release(frame);
        }
    }

    /// Drops a frame's entry without returning the frame to the pool,
    /// for when the physical frame was already repurposed elsewhere and
    /// only the bookkeeping remains. Silently ignores untracked frames
    /// like [`FrameManager::free`].
    pub async fn remove_entry(&self, frame: FrameId) {
        let mut table = self.table.lock().await;
        table.remove(frame);
    }

    /// Marks a frame ineligible for eviction.
    ///
    /// # Panics
    ///
    /// Panics if the frame is not tracked: pin is only called by code
    /// holding a valid frame reference, so an untracked frame here is an
    /// internal error, not a race.
    pub async fn pin(&self, frame: FrameId) {
        self.set_pinned(frame, true).await;
    }

    /// Makes a frame eligible for eviction again.
    ///
    /// # Panics
    ///
    /// Panics if the frame is not tracked, as for [`FrameManager::pin`].
    pub async fn unpin(&self, frame: FrameId) {
        self.set_pinned(frame, false).await;
    }

    async fn set_pinned(&self, frame: FrameId, pinned: bool) {
        let mut table = self.table.lock().await;
        let entry = table
            .registry
            .get_mut(frame)
            .unwrap_or_else(|| panic!("pin/unpin of untracked frame {:?}", frame));
        entry.pinned = pinned;
    }

    /// Whether `frame` currently has a live entry.
    pub async fn contains(&self, frame: FrameId) -> bool {
        self.table.lock().await.registry.contains(frame)
    }

    /// Number of live (tracked) frames.
    pub async fn resident_count(&self) -> usize {
        self.table.lock().await.registry.len()
    }
}
