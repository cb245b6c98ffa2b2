//! User Memory Validation
//!
//! Every address a user program hands across the trap boundary is hostile
//! until proven otherwise. This module proves it: spans are checked
//! page by page against the process address space before a single byte
//! moves, and the only way to touch user memory is through a span token
//! minted here.
//!
//! # Security Principles
//! - Validate ALL of a span before reading or writing any of it
//! - Null, kernel-half, and unmapped addresses are distinct faults, all
//!   fatal to the offending process
//! - Data is copied to kernel buffers; no filesystem call ever runs
//!   against raw user memory
//! - A fault in the middle of a multi-page walk reports the first bad
//!   address

use alloc::string::String;
use alloc::vec::Vec;

use crate::mm::{AddressSpace, VirtAddr, PAGE_SIZE};

use super::WORD_SIZE;

/// Longest user string the kernel will copy in, in bytes, not counting
/// the terminator.
pub const MAX_USER_STR: usize = 4096;

/// Why a user address was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// The null page.
    Null,
    /// At or above the kernel line, or wrapping past the top of memory.
    Kernel,
    /// Plausible user address with no mapping behind it.
    Unmapped,
}

/// A rejected user address, recorded at the first byte that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserFault {
    pub addr: VirtAddr,
    pub kind: FaultKind,
}

impl core::fmt::Display for UserFault {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.kind {
            FaultKind::Null => write!(f, "null user pointer"),
            FaultKind::Kernel => write!(f, "kernel address {} from user mode", self.addr),
            FaultKind::Unmapped => write!(f, "unmapped user address {}", self.addr),
        }
    }
}

/// Error type for user string copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserStrError {
    /// The walk hit a bad address before the terminator.
    Fault(UserFault),
    /// No terminator within [`MAX_USER_STR`] bytes.
    TooLong,
}

impl From<UserFault> for UserStrError {
    fn from(fault: UserFault) -> Self {
        Self::Fault(fault)
    }
}

impl core::fmt::Display for UserStrError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Fault(fault) => fault.fmt(f),
            Self::TooLong => write!(f, "user string exceeds {} bytes", MAX_USER_STR),
        }
    }
}

/// Check every page of `[at, at + len)` without touching the bytes.
///
/// Zero-length spans are trivially valid, whatever the address.
fn check_span(space: &dyn AddressSpace, at: VirtAddr, len: usize) -> Result<(), UserFault> {
    if len == 0 {
        return Ok(());
    }
    if at.is_null() {
        return Err(UserFault {
            addr: at,
            kind: FaultKind::Null,
        });
    }
    let last = at.checked_add(len - 1).ok_or(UserFault {
        addr: at,
        kind: FaultKind::Kernel,
    })?;
    if at.is_kernel() || last.is_kernel() {
        let first_bad = if at.is_kernel() {
            at
        } else {
            VirtAddr::new(crate::mm::USER_TOP)
        };
        return Err(UserFault {
            addr: first_bad,
            kind: FaultKind::Kernel,
        });
    }
    let mut probe = at;
    loop {
        if space.translate(probe).is_none() {
            return Err(UserFault {
                addr: probe,
                kind: FaultKind::Unmapped,
            });
        }
        match probe.page_base().checked_add(PAGE_SIZE) {
            Some(next) if next.as_usize() <= last.as_usize() => probe = next,
            _ => return Ok(()),
        }
    }
}

/// A user span proven readable. Minted only by [`validate_read`].
///
/// Holds the address space it was proven against, so the bytes can only
/// be copied out through the same translations that were checked.
pub struct UserSpan<'a> {
    space: &'a dyn AddressSpace,
    base: VirtAddr,
    len: usize,
}

impl core::fmt::Debug for UserSpan<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("UserSpan")
            .field("base", &self.base)
            .field("len", &self.len)
            .finish()
    }
}

impl UserSpan<'_> {
    /// Span length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the span covers no bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Copy span bytes starting at `offset` into `dst`.
    ///
    /// Copies `min(dst.len(), len - offset)` bytes and returns the
    /// count; an offset at or past the end copies nothing.
    pub fn read_into(&self, offset: usize, dst: &mut [u8]) -> Result<usize, UserFault> {
        let Some(remaining) = self.len.checked_sub(offset) else {
            return Ok(0);
        };
        let want = remaining.min(dst.len());
        let mut copied = 0;
        while copied < want {
            // In bounds: offset + copied < len, and base + len - 1 was
            // overflow-checked at validation.
            let src = VirtAddr::new(self.base.as_usize() + offset + copied);
            let run = src.page_remaining().min(want - copied);
            let ptr = self.space.translate(src).ok_or(UserFault {
                addr: src,
                kind: FaultKind::Unmapped,
            })?;
            // SAFETY:
            // - The translation covers `src`'s whole page and `run` does
            //   not cross the page boundary
            // - `dst` has at least `want` bytes, and `copied + run <= want`
            // Audited: 2025-08-21
            unsafe {
                core::ptr::copy_nonoverlapping(ptr.cast_const(), dst.as_mut_ptr().add(copied), run);
            }
            copied += run;
        }
        Ok(want)
    }
}

/// A user span proven writable. Minted only by [`validate_write`].
pub struct UserSpanMut<'a> {
    space: &'a dyn AddressSpace,
    base: VirtAddr,
    len: usize,
}

impl UserSpanMut<'_> {
    /// Span length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the span covers no bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Copy `src` into the span starting at `offset`.
    ///
    /// Copies `min(src.len(), len - offset)` bytes and returns the
    /// count.
    pub fn write_from(&self, offset: usize, src: &[u8]) -> Result<usize, UserFault> {
        let Some(remaining) = self.len.checked_sub(offset) else {
            return Ok(0);
        };
        let want = remaining.min(src.len());
        let mut copied = 0;
        while copied < want {
            let dst = VirtAddr::new(self.base.as_usize() + offset + copied);
            let run = dst.page_remaining().min(want - copied);
            let ptr = self.space.translate(dst).ok_or(UserFault {
                addr: dst,
                kind: FaultKind::Unmapped,
            })?;
            // SAFETY:
            // - The translation covers `dst`'s whole page and `run` does
            //   not cross the page boundary
            // - `src` has at least `want` bytes, and `copied + run <= want`
            // Audited: 2025-08-21
            unsafe {
                core::ptr::copy_nonoverlapping(src.as_ptr().add(copied), ptr, run);
            }
            copied += run;
        }
        Ok(want)
    }
}

/// Prove `[at, at + len)` readable and mint its span token.
pub fn validate_read<'a>(
    space: &'a dyn AddressSpace,
    at: VirtAddr,
    len: usize,
) -> Result<UserSpan<'a>, UserFault> {
    check_span(space, at, len)?;
    Ok(UserSpan {
        space,
        base: at,
        len,
    })
}

/// Prove `[at, at + len)` writable and mint its span token.
pub fn validate_write<'a>(
    space: &'a dyn AddressSpace,
    at: VirtAddr,
    len: usize,
) -> Result<UserSpanMut<'a>, UserFault> {
    check_span(space, at, len)?;
    Ok(UserSpanMut {
        space,
        base: at,
        len,
    })
}

/// Read one little-endian word from the user stack.
///
/// The word may straddle a page boundary; both pages are checked before
/// either byte is read.
pub fn read_user_word(space: &dyn AddressSpace, at: VirtAddr) -> Result<u32, UserFault> {
    let span = validate_read(space, at, WORD_SIZE)?;
    let mut bytes = [0u8; WORD_SIZE];
    span.read_into(0, &mut bytes)?;
    Ok(u32::from_le_bytes(bytes))
}

/// Copy a NUL-terminated string out of user memory.
///
/// Each byte's page is proven mapped before the byte is read, so a
/// string that runs off the end of its mapping faults at the exact
/// first bad address. Non-UTF-8 bytes are replaced rather than
/// rejected.
pub fn copy_user_str(space: &dyn AddressSpace, at: VirtAddr) -> Result<String, UserStrError> {
    let mut out = Vec::new();
    let mut probe = at;
    loop {
        if !probe.is_user() {
            let kind = if probe.is_null() {
                FaultKind::Null
            } else {
                FaultKind::Kernel
            };
            return Err(UserStrError::Fault(UserFault { addr: probe, kind }));
        }
        let ptr = space.translate(probe).ok_or(UserFault {
            addr: probe,
            kind: FaultKind::Unmapped,
        })?;
        let run = probe.page_remaining();
        for i in 0..run {
            // SAFETY: the translation covers `probe`'s whole page and
            // `i` stays below the bytes remaining in it.
            // Audited: 2025-08-21
            let byte = unsafe { ptr.add(i).cast_const().read() };
            if byte == 0 {
                return Ok(String::from_utf8_lossy(&out).into_owned());
            }
            if out.len() == MAX_USER_STR {
                return Err(UserStrError::TooLong);
            }
            out.push(byte);
        }
        probe = probe.checked_add(run).ok_or(UserFault {
            addr: probe,
            kind: FaultKind::Kernel,
        })?;
    }
}
