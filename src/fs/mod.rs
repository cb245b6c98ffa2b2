//! Filesystem Interface
//!
//! The syscall boundary treats the filesystem as a foreign machine: a set
//! of primitives over opaque handles, shared by every process and
//! serialized by [`gate::FsGate`]. Nothing here knows about on-disk
//! layout.
//!
//! # Ownership
//! A [`FileId`] is owned by exactly one (process, descriptor) pair from
//! the moment `open` returns it until exactly one `close` releases it.
//! The descriptor table enforces the single release; this module only
//! defines the tokens and the primitive set.

pub mod gate;

pub use gate::FsGate;

/// Opaque handle to an open file, minted by the filesystem.
///
/// The value carries no meaning at this layer; it is stored in a
/// descriptor table slot and handed back to the filesystem verbatim.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[repr(transparent)]
pub struct FileId(u64);

impl FileId {
    /// Wrap a raw handle value.
    #[inline]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw handle value.
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

/// The filesystem primitive set.
///
/// Implementations must never panic on any input reaching them through
/// the syscall path; failures surface as `false`, `None`, or short
/// counts. All methods take `&mut self`; concurrent callers are
/// serialized by the gate, so implementations need no locking of their
/// own.
///
/// Position semantics: every open handle carries its own read/write
/// position, advanced by `read`/`write` and set by `seek`. Writes may
/// grow the file.
pub trait FileSystem: Send {
    /// Create a file of the given initial size. `false` if the name
    /// already exists or creation fails.
    fn create(&mut self, name: &str, initial_size: u32) -> bool;

    /// Remove a file by name. `false` if no such file. Open handles to a
    /// removed file remain usable until closed.
    fn remove(&mut self, name: &str) -> bool;

    /// Open a file by name, minting a fresh handle.
    fn open(&mut self, name: &str) -> Option<FileId>;

    /// Current size of the file behind the handle, in bytes.
    fn length(&mut self, file: FileId) -> u32;

    /// Read from the handle's position into `buf`; returns bytes read
    /// (short at end of file) and advances the position.
    fn read(&mut self, file: FileId, buf: &mut [u8]) -> usize;

    /// Write `buf` at the handle's position; returns bytes written and
    /// advances the position.
    fn write(&mut self, file: FileId, buf: &[u8]) -> usize;

    /// Set the handle's position (may exceed the current length).
    fn seek(&mut self, file: FileId, position: u32);

    /// The handle's current position.
    fn tell(&mut self, file: FileId) -> u32;

    /// Release the handle. After this the `FileId` is dead.
    fn close(&mut self, file: FileId);
}
