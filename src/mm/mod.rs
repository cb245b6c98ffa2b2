//! Memory management module
//!
//! Provides:
//! - Kernel heap allocation
//! - The virtual-address type and user-space layout constants
//! - The translation seam the syscall boundary validates against
//!
//! # Security Principles
//! - User addresses are data until proven mapped
//! - Unsafe code is minimal and audited
//! - Paging internals stay behind the `AddressSpace` seam

pub mod address;
pub mod addrspace;
mod allocator;

pub use address::{VirtAddr, PAGE_MASK, PAGE_SIZE, USER_TOP};
pub use addrspace::AddressSpace;
pub use allocator::{heap_size, init_heap};
