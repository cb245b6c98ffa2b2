//! File System Calls
//!
//! Service routines for the file half of the syscall table. Arguments
//! arrive pre-validated: names are already kernel-side strings, buffers
//! are span tokens proven mapped. No raw user address reaches this
//! module.
//!
//! # Ordering Rules
//! - The filesystem gate is taken per primitive call and never spans a
//!   user memory access; bulk I/O moves through a kernel bounce buffer
//!   one chunk at a time
//! - Console descriptors (0 and 1) never touch the gate

use crate::drivers::Console;
use crate::fs::FsGate;
use crate::process::{Fd, FdTable};

use super::validate::{UserFault, UserSpan, UserSpanMut};

/// Bounce-buffer size for user I/O, one disk sector.
pub const USER_IO_CHUNK: usize = 512;

/// `create(name, initial_size)`: nonzero on success.
pub fn sys_create(gate: &FsGate, name: &str, initial_size: u32) -> i32 {
    i32::from(gate.lock().create(name, initial_size))
}

/// `remove(name)`: nonzero on success. Open handles survive removal.
pub fn sys_remove(gate: &FsGate, name: &str) -> i32 {
    i32::from(gate.lock().remove(name))
}

/// `open(name)`: new descriptor, or -1.
///
/// If the descriptor table is full the freshly minted handle is closed
/// again before the failure is reported, so the filesystem never leaks
/// a handle the process cannot reach.
pub fn sys_open(gate: &FsGate, fds: &mut FdTable, name: &str) -> i32 {
    let Some(file) = gate.lock().open(name) else {
        return -1;
    };
    match fds.install(file) {
        Ok(fd) => fd.as_i32(),
        Err(err) => {
            log::debug!("open(\"{}\"): {}", name, err);
            gate.lock().close(file);
            -1
        }
    }
}

/// `filesize(fd)`: size in bytes, or -1 for unknown descriptors.
pub fn sys_filesize(gate: &FsGate, fds: &FdTable, fd: i32) -> i32 {
    match fds.get(Fd::from_raw(fd)) {
        Some(file) => gate.lock().length(file) as i32,
        None => -1,
    }
}

/// `read(fd, buffer, size)`: bytes read, or -1.
///
/// Descriptor 0 reads the console and blocks until the span is full.
/// Descriptor 1 and unknown descriptors fail. File reads stop short at
/// end of file.
pub fn sys_read(
    gate: &FsGate,
    console: &dyn Console,
    fds: &FdTable,
    fd: i32,
    buf: &UserSpanMut<'_>,
) -> Result<i32, UserFault> {
    let total = buf.len();
    let fd = Fd::from_raw(fd);
    if fd == Fd::CONSOLE_OUT {
        return Ok(-1);
    }
    let mut chunk = [0u8; USER_IO_CHUNK];
    if fd == Fd::CONSOLE_IN {
        let mut done = 0;
        while done < total {
            let want = (total - done).min(USER_IO_CHUNK);
            for slot in chunk.iter_mut().take(want) {
                *slot = console.read_byte();
            }
            buf.write_from(done, &chunk[..want])?;
            done += want;
        }
        return Ok(total as i32);
    }
    let Some(file) = fds.get(fd) else {
        return Ok(-1);
    };
    let mut done = 0;
    while done < total {
        let want = (total - done).min(USER_IO_CHUNK);
        let got = gate.lock().read(file, &mut chunk[..want]);
        buf.write_from(done, &chunk[..got])?;
        done += got;
        if got < want {
            break;
        }
    }
    Ok(done as i32)
}

/// `write(fd, buffer, size)`: bytes written, or -1.
///
/// Descriptor 1 writes the console. Descriptor 0 and unknown
/// descriptors fail. File writes may come up short.
pub fn sys_write(
    gate: &FsGate,
    console: &dyn Console,
    fds: &FdTable,
    fd: i32,
    buf: &UserSpan<'_>,
) -> Result<i32, UserFault> {
    let total = buf.len();
    let fd = Fd::from_raw(fd);
    if fd == Fd::CONSOLE_IN {
        return Ok(-1);
    }
    let mut chunk = [0u8; USER_IO_CHUNK];
    if fd == Fd::CONSOLE_OUT {
        let mut done = 0;
        while done < total {
            let got = buf.read_into(done, &mut chunk)?;
            console.write_bytes(&chunk[..got]);
            done += got;
        }
        return Ok(total as i32);
    }
    let Some(file) = fds.get(fd) else {
        return Ok(-1);
    };
    let mut done = 0;
    while done < total {
        let got = buf.read_into(done, &mut chunk)?;
        let wrote = gate.lock().write(file, &chunk[..got]);
        done += wrote;
        if wrote < got {
            break;
        }
    }
    Ok(done as i32)
}

/// `seek(fd, position)`: no result. Unknown descriptors are ignored.
pub fn sys_seek(gate: &FsGate, fds: &FdTable, fd: i32, position: u32) -> i32 {
    if let Some(file) = fds.get(Fd::from_raw(fd)) {
        gate.lock().seek(file, position);
    }
    0
}

/// `tell(fd)`: position, or -1 for unknown descriptors.
pub fn sys_tell(gate: &FsGate, fds: &FdTable, fd: i32) -> i32 {
    match fds.get(Fd::from_raw(fd)) {
        Some(file) => gate.lock().tell(file) as i32,
        None => -1,
    }
}

/// `close(fd)`: releases the descriptor. Closing a console descriptor
/// or an unknown number is a no-op.
pub fn sys_close(gate: &FsGate, fds: &mut FdTable, fd: i32) -> i32 {
    if let Some(file) = fds.remove(Fd::from_raw(fd)) {
        gate.lock().close(file);
    }
    0
}
