//! Process State and Seams
//!
//! Per-process kernel state touched by traps: the open-file table, the
//! children a process has spawned, and its recorded exit status. The
//! actual process lifecycle (loading images, scheduling, reaping) lives
//! behind the [`ProcessManager`] and [`Scheduler`] seams.
//!
//! # Design
//! - `Process` is owned by its thread; traps receive `&mut Process` and
//!   no lock is involved
//! - Children are tracked as a map from child id to that child's load
//!   gate, so membership check and claim are one keyed lookup
//! - Exit status is write-once: the first recorded value is the one
//!   reported, later attempts are ignored

pub mod fd;
pub mod load_gate;

pub use fd::{Fd, FdError, FdTable, MAX_OPEN_FILES};
pub use load_gate::{LoadGate, Scheduler};

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::sync::Arc;

use crate::mm::AddressSpace;

/// Process identifier.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
#[repr(transparent)]
pub struct Pid(i32);

impl Pid {
    /// Wrap a raw process id.
    #[inline]
    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    /// Get the raw process id.
    #[inline]
    pub const fn as_i32(self) -> i32 {
        self.0
    }
}

/// Error type for spawn requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnError {
    /// No thread or memory available for a new process.
    NoResources,

    /// The command line was rejected before a thread was created.
    Rejected,
}

impl core::fmt::Display for SpawnError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NoResources => write!(f, "out of resources for new process"),
            Self::Rejected => write!(f, "command line rejected"),
        }
    }
}

/// Process lifecycle operations the trap layer delegates.
pub trait ProcessManager: Send + Sync {
    /// Start loading a new process for `parent` from `cmdline`.
    ///
    /// The returned id is assigned before the load completes; the load
    /// outcome arrives through `gate`, which the loader signals exactly
    /// once. `Err` means no thread was created and the gate will never
    /// be signaled.
    fn spawn(&self, parent: Pid, cmdline: &str, gate: Arc<LoadGate>) -> Result<Pid, SpawnError>;

    /// Block `parent` until `child` exits and yield its exit status.
    ///
    /// Callers have already verified that `child` belongs to `parent`
    /// and claimed the one allowed wait on it.
    fn wait(&self, parent: Pid, child: Pid) -> i32;
}

/// Kernel-side state of one user process.
pub struct Process {
    pid: Pid,
    name: String,
    space: Arc<dyn AddressSpace>,
    fds: FdTable,
    children: BTreeMap<Pid, Arc<LoadGate>>,
    exit_status: Option<i32>,
}

impl Process {
    /// Create the trap-visible state for a freshly loaded process.
    pub fn new(pid: Pid, name: &str, space: Arc<dyn AddressSpace>) -> Self {
        Self {
            pid,
            name: String::from(name),
            space,
            fds: FdTable::new(),
            children: BTreeMap::new(),
            exit_status: None,
        }
    }

    /// Process id.
    #[inline]
    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// Program name, as printed in the exit line.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Handle to this process's address space.
    ///
    /// Cloned out so callers can hold the space and the rest of the
    /// process state at the same time.
    #[inline]
    pub fn address_space(&self) -> Arc<dyn AddressSpace> {
        Arc::clone(&self.space)
    }

    /// Open-file table, read side.
    #[inline]
    pub fn fds(&self) -> &FdTable {
        &self.fds
    }

    /// Open-file table, write side.
    #[inline]
    pub fn fds_mut(&mut self) -> &mut FdTable {
        &mut self.fds
    }

    /// Register a spawned child and the gate its loader will signal.
    pub fn adopt(&mut self, child: Pid, gate: Arc<LoadGate>) {
        self.children.insert(child, gate);
    }

    /// Claim the one allowed wait on `child`.
    ///
    /// Yields the child's gate if `child` is an unclaimed child of this
    /// process, removing it so a second claim misses.
    pub fn release_child(&mut self, child: Pid) -> Option<Arc<LoadGate>> {
        self.children.remove(&child)
    }

    /// Record the exit status if none is recorded yet.
    ///
    /// Returns the effective status, which is the first one ever
    /// recorded.
    pub fn record_exit(&mut self, status: i32) -> i32 {
        *self.exit_status.get_or_insert(status)
    }

    /// Recorded exit status, if the process has one.
    #[inline]
    pub fn exit_status(&self) -> Option<i32> {
        self.exit_status
    }
}
