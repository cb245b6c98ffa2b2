//! Test Doubles
//!
//! Host-side fakes for every seam the trap layer calls through. Only
//! compiled into test builds.
//!
//! The fakes favor observability over realism: `FakeFs` journals every
//! close and `FakeConsole` captures output for exact-byte assertions,
//! while `FakePm` records the spawns and waits it is asked for.

use std::cell::UnsafeCell;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};

use crate::drivers::{Console, Power};
use crate::fs::{FileId, FileSystem};
use crate::mm::{AddressSpace, VirtAddr, PAGE_MASK, PAGE_SIZE};
use crate::process::{LoadGate, Pid, ProcessManager, Scheduler, SpawnError};
use crate::syscall::WORD_SIZE;

/// Page-granular address space backed by heap pages.
pub struct FakeSpace {
    pages: BTreeMap<usize, Box<UnsafeCell<[u8; PAGE_SIZE]>>>,
}

// Pages are boxed and never move, and each test touches its space from
// one thread at a time.
unsafe impl Send for FakeSpace {}
unsafe impl Sync for FakeSpace {}

impl FakeSpace {
    pub fn new() -> Self {
        Self {
            pages: BTreeMap::new(),
        }
    }

    /// Map one zeroed page. `base` must be page-aligned.
    pub fn map_page(&mut self, base: usize) {
        assert_eq!(base & PAGE_MASK, 0, "page base must be aligned");
        self.pages
            .insert(base, Box::new(UnsafeCell::new([0u8; PAGE_SIZE])));
    }

    /// Write bytes into mapped test memory. Panics on unmapped addresses
    /// so a bad test fails loudly.
    pub fn poke(&self, addr: usize, bytes: &[u8]) {
        for (i, byte) in bytes.iter().enumerate() {
            let p = self
                .translate(VirtAddr::new(addr + i))
                .expect("poke of unmapped test address");
            unsafe { *p = *byte };
        }
    }

    /// Read bytes back out of mapped test memory.
    pub fn peek(&self, addr: usize, len: usize) -> Vec<u8> {
        (0..len)
            .map(|i| {
                let p = self
                    .translate(VirtAddr::new(addr + i))
                    .expect("peek of unmapped test address");
                unsafe { *p }
            })
            .collect()
    }
}

impl AddressSpace for FakeSpace {
    fn translate(&self, addr: VirtAddr) -> Option<*mut u8> {
        let page = self.pages.get(&addr.page_base().as_usize())?;
        let base = page.get() as *mut u8;
        // In-bounds: page_offset is below PAGE_SIZE.
        Some(unsafe { base.add(addr.page_offset()) })
    }
}

/// Lay out little-endian words starting at `usp`, the way user code
/// pushes a syscall number and its arguments.
pub fn user_stack(space: &FakeSpace, usp: usize, words: &[u32]) {
    for (i, word) in words.iter().enumerate() {
        space.poke(usp + i * WORD_SIZE, &word.to_le_bytes());
    }
}

#[derive(Default)]
struct OpenHandle {
    data: Arc<Mutex<Vec<u8>>>,
    pos: usize,
}

#[derive(Default)]
struct FsState {
    files: BTreeMap<String, Arc<Mutex<Vec<u8>>>>,
    open: BTreeMap<u64, OpenHandle>,
    next: u64,
    closed: Vec<FileId>,
}

/// In-memory filesystem with per-handle positions and a close journal.
///
/// Clones share state, so a test can keep a probe handle while the gate
/// owns the boxed original.
#[derive(Clone)]
pub struct FakeFs {
    state: Arc<Mutex<FsState>>,
}

impl FakeFs {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FsState {
                next: 1,
                ..FsState::default()
            })),
        }
    }

    /// Current bytes of a named file, `None` once removed.
    pub fn contents(&self, name: &str) -> Option<Vec<u8>> {
        let state = self.state.lock().unwrap();
        state.files.get(name).map(|data| data.lock().unwrap().clone())
    }

    /// Every handle ever closed, in close order.
    pub fn closed(&self) -> Vec<FileId> {
        self.state.lock().unwrap().closed.clone()
    }

    /// Number of live handles.
    pub fn open_count(&self) -> usize {
        self.state.lock().unwrap().open.len()
    }
}

impl FileSystem for FakeFs {
    fn create(&mut self, name: &str, initial_size: u32) -> bool {
        let mut state = self.state.lock().unwrap();
        if state.files.contains_key(name) {
            return false;
        }
        let data = Arc::new(Mutex::new(vec![0; initial_size as usize]));
        state.files.insert(name.to_string(), data);
        true
    }

    fn remove(&mut self, name: &str) -> bool {
        // Open handles keep their own reference to the data.
        self.state.lock().unwrap().files.remove(name).is_some()
    }

    fn open(&mut self, name: &str) -> Option<FileId> {
        let mut state = self.state.lock().unwrap();
        let data = Arc::clone(state.files.get(name)?);
        let id = state.next;
        state.next += 1;
        state.open.insert(id, OpenHandle { data, pos: 0 });
        Some(FileId::new(id))
    }

    fn length(&mut self, file: FileId) -> u32 {
        let state = self.state.lock().unwrap();
        match state.open.get(&file.as_u64()) {
            Some(h) => h.data.lock().unwrap().len() as u32,
            None => 0,
        }
    }

    fn read(&mut self, file: FileId, buf: &mut [u8]) -> usize {
        let mut state = self.state.lock().unwrap();
        let Some(h) = state.open.get_mut(&file.as_u64()) else {
            return 0;
        };
        let data = h.data.lock().unwrap();
        let n = buf.len().min(data.len().saturating_sub(h.pos));
        buf[..n].copy_from_slice(&data[h.pos..h.pos + n]);
        drop(data);
        h.pos += n;
        n
    }

    fn write(&mut self, file: FileId, buf: &[u8]) -> usize {
        let mut state = self.state.lock().unwrap();
        let Some(h) = state.open.get_mut(&file.as_u64()) else {
            return 0;
        };
        let mut data = h.data.lock().unwrap();
        let end = h.pos + buf.len();
        if end > data.len() {
            data.resize(end, 0);
        }
        data[h.pos..end].copy_from_slice(buf);
        drop(data);
        h.pos = end;
        buf.len()
    }

    fn seek(&mut self, file: FileId, position: u32) {
        let mut state = self.state.lock().unwrap();
        if let Some(h) = state.open.get_mut(&file.as_u64()) {
            h.pos = position as usize;
        }
    }

    fn tell(&mut self, file: FileId) -> u32 {
        let state = self.state.lock().unwrap();
        match state.open.get(&file.as_u64()) {
            Some(h) => h.pos as u32,
            None => 0,
        }
    }

    fn close(&mut self, file: FileId) {
        let mut state = self.state.lock().unwrap();
        state.open.remove(&file.as_u64());
        state.closed.push(file);
    }
}

/// Console that records output and serves scripted input.
pub struct FakeConsole {
    out: Mutex<Vec<u8>>,
    input: Mutex<VecDeque<u8>>,
}

impl FakeConsole {
    pub fn new() -> Self {
        Self::with_input(&[])
    }

    pub fn with_input(bytes: &[u8]) -> Self {
        Self {
            out: Mutex::new(Vec::new()),
            input: Mutex::new(bytes.iter().copied().collect()),
        }
    }

    /// Take everything written so far.
    pub fn take_output(&self) -> Vec<u8> {
        std::mem::take(&mut *self.out.lock().unwrap())
    }
}

impl Console for FakeConsole {
    fn read_byte(&self) -> u8 {
        // The real console blocks; the fake returns NUL when the script
        // runs dry rather than hanging a test.
        self.input.lock().unwrap().pop_front().unwrap_or(0)
    }

    fn write_bytes(&self, bytes: &[u8]) {
        self.out.lock().unwrap().extend_from_slice(bytes);
    }
}

/// Scheduler whose sleep is a yield, so gate retry loops spin politely.
pub struct FakeSched;

impl Scheduler for FakeSched {
    fn sleep_current(&self) {
        std::thread::yield_now();
    }

    fn wake(&self, _pid: Pid) {}
}

struct PmState {
    next_pid: i32,
    load_ok: bool,
    refuse: bool,
    spawned: Vec<String>,
    waits: Vec<(Pid, Pid)>,
    wait_status: i32,
}

/// Process manager that loads synchronously and returns scripted wait
/// statuses.
pub struct FakePm {
    state: Mutex<PmState>,
    sched: FakeSched,
}

impl FakePm {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(PmState {
                next_pid: 100,
                load_ok: true,
                refuse: false,
                spawned: Vec::new(),
                waits: Vec::new(),
                wait_status: 0,
            }),
            sched: FakeSched,
        }
    }

    /// Spawns succeed but every load fails.
    pub fn load_failure() -> Self {
        let pm = Self::new();
        pm.state.lock().unwrap().load_ok = false;
        pm
    }

    /// Every spawn is refused before a thread exists.
    pub fn out_of_threads() -> Self {
        let pm = Self::new();
        pm.state.lock().unwrap().refuse = true;
        pm
    }

    /// Scripted status for every wait.
    pub fn with_wait_status(status: i32) -> Self {
        let pm = Self::new();
        pm.state.lock().unwrap().wait_status = status;
        pm
    }

    /// Command lines spawned, in order.
    pub fn spawned(&self) -> Vec<String> {
        self.state.lock().unwrap().spawned.clone()
    }

    /// The (parent, child) pairs waited on, in order.
    pub fn waits(&self) -> Vec<(Pid, Pid)> {
        self.state.lock().unwrap().waits.clone()
    }
}

impl ProcessManager for FakePm {
    fn spawn(&self, _parent: Pid, cmdline: &str, gate: Arc<LoadGate>) -> Result<Pid, SpawnError> {
        let mut state = self.state.lock().unwrap();
        if state.refuse {
            return Err(SpawnError::NoResources);
        }
        state.spawned.push(cmdline.to_string());
        let pid = Pid::new(state.next_pid);
        state.next_pid += 1;
        // The fake's loader runs inline: the outcome is ready before the
        // parent ever waits.
        gate.signal(state.load_ok, &self.sched);
        Ok(pid)
    }

    fn wait(&self, parent: Pid, child: Pid) -> i32 {
        let mut state = self.state.lock().unwrap();
        state.waits.push((parent, child));
        state.wait_status
    }
}

/// Power control that panics instead of halting the host.
pub struct FakePower;

impl Power for FakePower {
    fn power_off(&self) -> ! {
        panic!("machine powered off");
    }
}
