//! Address-Space Translation Seam
//!
//! The virtual-memory subsystem is outside this layer; all it exposes here
//! is one question: "where, if anywhere, is this user byte mapped right
//! now?". Validation and copying are built entirely on that primitive.
//!
//! # Security Properties
//! - No component decides validity by dereferencing a user address
//! - A `None` translation anywhere in a syscall's argument path is fatal
//!   to the calling process, never to the kernel

use crate::mm::address::VirtAddr;

/// One process's active page tables, as seen from the syscall boundary.
///
/// Implementations live in the paging subsystem. Mappings are
/// page-granular: a successful translation for an address covers every
/// byte of that address's page, and the returned pointer stays valid for
/// the duration of the current trap (the process cannot remap while it is
/// trapped in the kernel).
pub trait AddressSpace: Send + Sync {
    /// Translate a user virtual address to a kernel-accessible pointer to
    /// the same byte, or `None` if the address is not mapped.
    ///
    /// Must not be asked about kernel addresses; callers reject those
    /// before translating.
    fn translate(&self, addr: VirtAddr) -> Option<*mut u8>;
}
