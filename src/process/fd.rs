//! File Descriptor Table
//!
//! Per-process mapping from small integer descriptors to open file
//! handles. One table per process, touched only by its owning thread, so
//! no locking.
//!
//! # Design
//! - Descriptors 0 and 1 are reserved for the console and never appear
//!   as entries; real files start at 2
//! - Numbering is monotonic: a descriptor number is never reissued after
//!   close, so a stale number can only miss, never alias a newer file
//! - The capacity limit counts live entries, not issued numbers, so
//!   close frees capacity forever

use alloc::collections::BTreeMap;

use crate::fs::FileId;

/// Maximum simultaneously open files per process.
pub const MAX_OPEN_FILES: usize = 32;

/// A descriptor number as seen by user code.
///
/// Newtype so raw trap-frame integers cannot be used as table keys by
/// accident.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
#[repr(transparent)]
pub struct Fd(i32);

impl Fd {
    /// Console input stream. Never present in a table.
    pub const CONSOLE_IN: Self = Self(0);

    /// Console output stream. Never present in a table.
    pub const CONSOLE_OUT: Self = Self(1);

    /// First descriptor that can name a real file.
    pub const FIRST_FILE: Self = Self(2);

    /// Wrap a raw descriptor number from user code.
    #[inline]
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    /// Get the raw descriptor number.
    #[inline]
    pub const fn as_i32(self) -> i32 {
        self.0
    }
}

/// Error type for descriptor allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FdError {
    /// The table already holds `MAX_OPEN_FILES` live entries, or the
    /// descriptor counter cannot advance.
    Exhausted,
}

impl core::fmt::Display for FdError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Exhausted => write!(f, "descriptor table exhausted"),
        }
    }
}

/// One process's open-file table.
#[derive(Debug)]
pub struct FdTable {
    entries: BTreeMap<Fd, FileId>,
    next: i32,
}

impl FdTable {
    /// Create an empty table. The first descriptor it will issue is 2.
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next: Fd::FIRST_FILE.0,
        }
    }

    /// Store a freshly opened handle under the next descriptor number.
    ///
    /// The handle is owned by the table from here until [`remove`] or
    /// [`drain`] gives it back; the caller must release it through the
    /// filesystem if installation fails.
    ///
    /// [`remove`]: Self::remove
    /// [`drain`]: Self::drain
    pub fn install(&mut self, file: FileId) -> Result<Fd, FdError> {
        if self.entries.len() >= MAX_OPEN_FILES {
            return Err(FdError::Exhausted);
        }
        let fd = Fd(self.next);
        self.next = self.next.checked_add(1).ok_or(FdError::Exhausted)?;
        self.entries.insert(fd, file);
        Ok(fd)
    }

    /// Look up a live descriptor. Reserved and unknown numbers miss.
    #[inline]
    pub fn get(&self, fd: Fd) -> Option<FileId> {
        self.entries.get(&fd).copied()
    }

    /// Remove a descriptor, yielding the handle for the caller to close.
    /// Unknown descriptors yield `None` (a close on them is a no-op).
    pub fn remove(&mut self, fd: Fd) -> Option<FileId> {
        self.entries.remove(&fd)
    }

    /// Take every live entry, ascending by descriptor. Used by process
    /// teardown, which closes each yielded handle.
    pub fn drain(&mut self) -> impl Iterator<Item = (Fd, FileId)> {
        core::mem::take(&mut self.entries).into_iter()
    }

    /// Number of live entries.
    #[inline]
    pub fn live(&self) -> usize {
        self.entries.len()
    }
}

impl Default for FdTable {
    fn default() -> Self {
        Self::new()
    }
}
