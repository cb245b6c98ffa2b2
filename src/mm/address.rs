//! Virtual Address Type and User-Space Layout
//!
//! Type-safe wrapper for the untrusted addresses user programs hand to the
//! kernel, plus the constants that carve the address space.
//!
//! # Security Properties
//! - Addresses from user mode are plain data until validated; nothing here
//!   dereferences them
//! - Conversion to a pointer only happens through an address-space
//!   translation, never from the raw value
//! - Range arithmetic is overflow-checked

use core::fmt;

/// Page size (4 KiB)
pub const PAGE_SIZE: usize = 4096;
/// Page size mask
pub const PAGE_MASK: usize = PAGE_SIZE - 1;

/// First address owned by the kernel. User mappings live strictly below
/// this line; any address at or above it is rejected at the boundary.
pub const USER_TOP: usize = 0xC000_0000;

/// A user-supplied virtual address.
///
/// Newtype wrapper so raw integers from a trap frame cannot be confused
/// with kernel pointers. Carries no validity guarantee by itself.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct VirtAddr(usize);

impl VirtAddr {
    /// Create a new virtual address.
    #[inline]
    pub const fn new(addr: usize) -> Self {
        Self(addr)
    }

    /// Get the raw address value.
    #[inline]
    pub const fn as_usize(self) -> usize {
        self.0
    }

    /// Check whether this is the null address.
    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Check if this address falls in the kernel's half of the space.
    #[inline]
    pub const fn is_kernel(self) -> bool {
        self.0 >= USER_TOP
    }

    /// Check if this address is a plausible user address (non-null and
    /// below the kernel line). Says nothing about whether it is mapped.
    #[inline]
    pub const fn is_user(self) -> bool {
        self.0 != 0 && self.0 < USER_TOP
    }

    /// Align the address down to its page boundary.
    #[inline]
    pub const fn page_base(self) -> Self {
        Self(self.0 & !PAGE_MASK)
    }

    /// Get the offset within the page (lowest 12 bits).
    #[inline]
    pub const fn page_offset(self) -> usize {
        self.0 & PAGE_MASK
    }

    /// Bytes remaining in this address's page, starting at the address.
    #[inline]
    pub const fn page_remaining(self) -> usize {
        PAGE_SIZE - self.page_offset()
    }

    /// Add an offset, reporting overflow instead of wrapping.
    #[inline]
    pub const fn checked_add(self, offset: usize) -> Option<Self> {
        match self.0.checked_add(offset) {
            Some(sum) => Some(Self(sum)),
            None => None,
        }
    }
}

impl fmt::Debug for VirtAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VirtAddr({:#010x})", self.0)
    }
}

impl fmt::Display for VirtAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}
