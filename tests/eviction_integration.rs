//! Integration tests for the frame manager.
//!
//! These drive the allocate → evict → page-in cycle end to end the way
//! the fault handler would, against both the in-memory and file-backed
//! swap stores.

use std::sync::Arc;

use resident::frame::FrameManager;
use resident::phys::{FrameId, MainMemory, PhysicalMemory, FRAME_SIZE};
use resident::process::{PageLocation, Process, ProcessRegistry, VirtPage};
use resident::swap::{FileSwap, MemorySwap, SwapStore};
use tempfile::tempdir;

/// Allocates a frame for `page` and installs the mapping, the way the
/// fault handler does once it has a frame in hand.
async fn fault_in<S: SwapStore>(
    manager: &FrameManager<MainMemory, S>,
    process: &Process,
    page: u64,
) -> FrameId {
    let page = VirtPage::new(page);
    let frame = manager.allocate(process.id(), page).await.unwrap();
    process.page_table().map(page, frame);
    process.supplemental().record_resident(page, frame);
    frame
}

fn stamp(value: u8) -> Vec<u8> {
    let mut buf = vec![0u8; FRAME_SIZE];
    buf[0] = value;
    buf[FRAME_SIZE - 1] = value;
    buf
}

/// The two-frame scenario: A and B fill the pool, C forces the first
/// quiet frame out, and A's contents must be recoverable from swap.
async fn run_two_frame_eviction<S: SwapStore>(swap: S) {
    let processes = Arc::new(ProcessRegistry::new());
    let manager = FrameManager::new(MainMemory::new(2), swap, Arc::clone(&processes));
    let process = processes.register();

    let f1 = fault_in(&manager, &process, 0).await;
    let f2 = fault_in(&manager, &process, 1).await;
    assert_ne!(f1, f2);

    manager.memory().write(f1, &stamp(0xA1)).unwrap();

    // Pool exhausted; C must reuse F1, the first frame in scan order.
    let f3 = fault_in(&manager, &process, 2).await;
    assert_eq!(f3, f1);

    // A is torn down: unmapped, entry replaced, marked swapped-out.
    assert_eq!(process.page_table().lookup(VirtPage::new(0)), None);
    let slot = match process.supplemental().location(VirtPage::new(0)) {
        Some(PageLocation::Swapped(slot)) => slot,
        other => panic!("page 0 should be swapped out, got {:?}", other),
    };

    // A's contents went to the backing store before the frame was reused.
    let mut buf = vec![0u8; FRAME_SIZE];
    manager.swap().read_back(slot, &mut buf).await.unwrap();
    assert_eq!(buf[0], 0xA1);
    assert_eq!(buf[FRAME_SIZE - 1], 0xA1);

    // B survived untouched.
    assert_eq!(process.page_table().lookup(VirtPage::new(1)), Some(f2));
    assert_eq!(manager.resident_count().await, 2);
}

#[tokio::test]
async fn test_two_frame_eviction_with_memory_swap() {
    run_two_frame_eviction(MemorySwap::new()).await;
}

#[tokio::test]
async fn test_two_frame_eviction_with_file_swap() {
    let dir = tempdir().unwrap();
    let swap = FileSwap::open(dir.path().join("swap.img")).await.unwrap();
    run_two_frame_eviction(swap).await;
}

/// Same setup, but the would-be victim is pinned: eviction must shift to
/// the second frame.
#[tokio::test]
async fn test_pinned_victim_shifts_to_next_frame() {
    let processes = Arc::new(ProcessRegistry::new());
    let manager = FrameManager::new(
        MainMemory::new(2),
        MemorySwap::new(),
        Arc::clone(&processes),
    );
    let process = processes.register();

    let f1 = fault_in(&manager, &process, 0).await;
    let f2 = fault_in(&manager, &process, 1).await;

    manager.pin(f1).await;
    let f3 = fault_in(&manager, &process, 2).await;

    assert_eq!(f3, f2);
    assert_eq!(process.page_table().lookup(VirtPage::new(0)), Some(f1));
    assert!(matches!(
        process.supplemental().location(VirtPage::new(1)),
        Some(PageLocation::Swapped(_))
    ));
}

/// With every frame pinned there is nothing to evict; that is the fatal
/// exhaustion condition.
#[tokio::test]
#[should_panic(expected = "out of memory")]
async fn test_everything_pinned_is_fatal() {
    let processes = Arc::new(ProcessRegistry::new());
    let manager = FrameManager::new(
        MainMemory::new(2),
        MemorySwap::new(),
        Arc::clone(&processes),
    );
    let process = processes.register();

    let f1 = fault_in(&manager, &process, 0).await;
    let f2 = fault_in(&manager, &process, 1).await;
    manager.pin(f1).await;
    manager.pin(f2).await;

    let _ = manager.allocate(process.id(), VirtPage::new(2)).await;
}

/// Full page-in round trip: evict a page, fault it back in from swap,
/// and release its slot.
async fn run_page_in_round_trip<S: SwapStore>(swap: S) {
    let processes = Arc::new(ProcessRegistry::new());
    let manager = FrameManager::new(MainMemory::new(2), swap, Arc::clone(&processes));
    let process = processes.register();

    let f1 = fault_in(&manager, &process, 0).await;
    fault_in(&manager, &process, 1).await;
    manager.memory().write(f1, &stamp(0x5C)).unwrap();

    // Page 2 evicts page 0.
    fault_in(&manager, &process, 2).await;
    let slot = match process.supplemental().location(VirtPage::new(0)) {
        Some(PageLocation::Swapped(slot)) => slot,
        other => panic!("page 0 should be swapped out, got {:?}", other),
    };

    // Fault on page 0: bring it back the way the fault handler would.
    // Fresh frame (evicting page 1), contents from swap, remap, release
    // the slot.
    let mut contents = vec![0u8; FRAME_SIZE];
    manager.swap().read_back(slot, &mut contents).await.unwrap();

    let frame = manager.allocate(process.id(), VirtPage::new(0)).await.unwrap();
    manager.memory().write(frame, &contents).unwrap();
    process.page_table().map(VirtPage::new(0), frame);
    process.supplemental().record_resident(VirtPage::new(0), frame);
    manager.swap().release(slot).await.unwrap();

    // The restored frame carries the original contents.
    let mut buf = vec![0u8; FRAME_SIZE];
    manager.memory().read(frame, &mut buf).unwrap();
    assert_eq!(buf[0], 0x5C);
    assert_eq!(buf[FRAME_SIZE - 1], 0x5C);

    // Exactly one page (page 1, evicted to make room) still occupies
    // swap; page 0's slot was recycled.
    assert_eq!(manager.swap().slot_count().await, 1);
    assert!(matches!(
        process.supplemental().location(VirtPage::new(1)),
        Some(PageLocation::Swapped(_))
    ));
}

#[tokio::test]
async fn test_page_in_round_trip_with_memory_swap() {
    run_page_in_round_trip(MemorySwap::new()).await;
}

#[tokio::test]
async fn test_page_in_round_trip_with_file_swap() {
    let dir = tempdir().unwrap();
    let swap = FileSwap::open(dir.path().join("swap.img")).await.unwrap();
    run_page_in_round_trip(swap).await;
}

/// Eviction updates the *owner's* tables, not the requester's.
#[tokio::test]
async fn test_eviction_crosses_process_boundaries() {
    let processes = Arc::new(ProcessRegistry::new());
    let manager = FrameManager::new(
        MainMemory::new(2),
        MemorySwap::new(),
        Arc::clone(&processes),
    );
    let victim_owner = processes.register();
    let requester = processes.register();

    // Both processes map their own page 0; page numbers are
    // per-address-space.
    fault_in(&manager, &victim_owner, 0).await;
    let fb = fault_in(&manager, &requester, 0).await;

    // The requester's next page forces out the oldest frame, which
    // belongs to the other process.
    fault_in(&manager, &requester, 1).await;

    assert_eq!(victim_owner.page_table().lookup(VirtPage::new(0)), None);
    assert!(matches!(
        victim_owner.supplemental().location(VirtPage::new(0)),
        Some(PageLocation::Swapped(_))
    ));

    // The requester's first page is untouched.
    assert_eq!(requester.page_table().lookup(VirtPage::new(0)), Some(fb));
    assert_eq!(
        requester.supplemental().location(VirtPage::new(0)),
        Some(PageLocation::Resident(fb))
    );
}

/// All pages hot: one full lap clears every accessed bit before the
/// second lap picks the first frame.
#[tokio::test]
async fn test_second_chance_fairness() {
    let processes = Arc::new(ProcessRegistry::new());
    let manager = FrameManager::new(
        MainMemory::new(3),
        MemorySwap::new(),
        Arc::clone(&processes),
    );
    let process = processes.register();

    let f1 = fault_in(&manager, &process, 0).await;
    fault_in(&manager, &process, 1).await;
    fault_in(&manager, &process, 2).await;

    for page in 0..3 {
        process.page_table().set_accessed(VirtPage::new(page), true);
    }

    let f4 = fault_in(&manager, &process, 3).await;

    // The first frame still went, and the survivors' bits are spent.
    assert_eq!(f4, f1);
    assert!(!process.page_table().is_accessed(VirtPage::new(1)));
    assert!(!process.page_table().is_accessed(VirtPage::new(2)));
}

/// No two live entries ever share a frame, across an interleaved
/// history of allocations, frees, and evictions.
#[tokio::test]
async fn test_frame_uniqueness_across_interleaving() {
    let processes = Arc::new(ProcessRegistry::new());
    let manager = FrameManager::new(
        MainMemory::new(4),
        MemorySwap::new(),
        Arc::clone(&processes),
    );
    let a = processes.register();
    let b = processes.register();

    // Every page ever faulted in, with the frame it got. A record is
    // still live exactly while its mapping is intact; eviction and
    // explicit free both tear the mapping down.
    let mut history: Vec<(Arc<Process>, VirtPage, FrameId)> = Vec::new();

    for round in 0..8u64 {
        let page = VirtPage::new(round);
        let fa = fault_in(&manager, &a, round).await;
        history.push((Arc::clone(&a), page, fa));
        let fb = fault_in(&manager, &b, round).await;
        history.push((Arc::clone(&b), page, fb));

        // Every third round, retire the oldest page that is still
        // resident, fault-handler style: unmap, forget, free.
        if round % 3 == 2 {
            if let Some((process, page, frame)) = history
                .iter()
                .find(|(p, page, frame)| p.page_table().lookup(*page) == Some(*frame))
                .cloned()
            {
                process.page_table().clear_mapping(page);
                process.supplemental().remove(page);
                manager.free(frame).await;
            }
        }

        // Uniqueness: the frames backing currently-mapped pages never
        // collide, and they are exactly the live entries.
        let mut seen = std::collections::HashSet::new();
        for (process, page, frame) in &history {
            if process.page_table().lookup(*page) == Some(*frame) {
                assert!(seen.insert(*frame), "frame {:?} is mapped twice", frame);
            }
        }
        assert_eq!(seen.len(), manager.resident_count().await);
        assert!(seen.len() <= 4);
    }
}

/// Freeing twice (or freeing a frame eviction already reclaimed) is a
/// silent no-op.
#[tokio::test]
async fn test_free_is_idempotent() {
    let processes = Arc::new(ProcessRegistry::new());
    let manager = FrameManager::new(
        MainMemory::new(2),
        MemorySwap::new(),
        Arc::clone(&processes),
    );
    let process = processes.register();

    let f1 = fault_in(&manager, &process, 0).await;
    fault_in(&manager, &process, 1).await;

    manager.free(f1).await;
    manager.free(f1).await;

    assert_eq!(manager.resident_count().await, 1);
    assert_eq!(manager.memory().free_count(), 1);

    // The pool is whole again: two more allocations fit with no
    // eviction.
    fault_in(&manager, &process, 2).await;
    assert_eq!(manager.swap().slot_count().await, 0);
}
