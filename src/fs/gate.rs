//! Filesystem Gate
//!
//! One lock, shared by every process, around the whole filesystem. The
//! guard is scoped: acquisition and the primitive call sit in the same
//! expression, so the lock is provably released on every path.
//!
//! # Locking Discipline
//! - Held for exactly one primitive call at a time
//! - Never held while validating or copying user memory; bulk I/O copies
//!   through kernel buffers and re-acquires per chunk
//! - Console I/O (descriptors 0 and 1) never touches it

use alloc::boxed::Box;
use spin::{Mutex, MutexGuard};

use super::FileSystem;

/// Serializes all access to the shared filesystem.
pub struct FsGate {
    inner: Mutex<Box<dyn FileSystem + Send>>,
}

impl FsGate {
    /// Wrap a filesystem in its gate. Called once at kernel bring-up.
    pub fn new(fs: Box<dyn FileSystem + Send>) -> Self {
        Self {
            inner: Mutex::new(fs),
        }
    }

    /// Acquire the gate for one primitive call.
    ///
    /// Callers keep the guard for a single call expression:
    /// `gate.lock().create(name, size)`. Holding it longer stalls every
    /// other process's file syscalls.
    pub fn lock(&self) -> MutexGuard<'_, Box<dyn FileSystem + Send>> {
        self.inner.lock()
    }
}
