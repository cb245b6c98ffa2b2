//! Kernel Heap Allocator
//!
//! Uses `linked_list_allocator` for heap management. The descriptor tables,
//! child maps, and kernel-side copies of user data all allocate from here
//! in the freestanding build; host test builds use the platform allocator.
//!
//! # Memory Layout
//! The heap lives in a static in-image region rather than behind linker
//! symbols, which keeps initialization order trivial.
//!
//! # Security Considerations
//! - Heap is initialized once during boot
//! - All allocations go through Rust's global allocator
//! - linked_list_allocator provides bounds checking

use linked_list_allocator::LockedHeap;

/// Global heap allocator instance. Registered as the global allocator only
/// in freestanding builds; test binaries keep the host allocator.
#[cfg_attr(not(test), global_allocator)]
static ALLOCATOR: LockedHeap = LockedHeap::empty();

/// Heap size (256 KiB). Bounded so a runaway kernel-side copy fails loudly
/// instead of eating physical memory.
const HEAP_SIZE: usize = 256 * 1024;

/// Static heap memory region
static mut HEAP_MEMORY: [u8; HEAP_SIZE] = [0; HEAP_SIZE];

/// Initialize the kernel heap.
///
/// # Safety
/// Must be called exactly once during kernel initialization, before any
/// heap allocation is attempted.
///
/// SAFETY AUDIT: 2025-08-21
/// - HEAP_MEMORY is a static, valid memory region
/// - Raw address taken without forming a reference to the static
/// - linked_list_allocator handles internal safety
pub unsafe fn init_heap() {
    // SAFETY:
    // - HEAP_MEMORY is a valid static array, accessed only here
    // - Caller guarantees the single-call contract
    // Audited: 2025-08-21
    unsafe {
        let heap_start = core::ptr::addr_of_mut!(HEAP_MEMORY) as *mut u8;
        ALLOCATOR.lock().init(heap_start, HEAP_SIZE);
    }
}

/// Get the size of the kernel heap.
pub fn heap_size() -> usize {
    HEAP_SIZE
}
