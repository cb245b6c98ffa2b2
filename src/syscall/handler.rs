//! System Call Dispatch
//!
//! The single entry point for every trap out of user mode. Reads the
//! syscall number off the user stack, decodes the arguments each call
//! expects, and routes to the service routines.
//!
//! # Security Considerations
//! - The user stack pointer is untrusted; a fault while reading the
//!   number or any argument slot kills the caller
//! - Unknown numbers are inert: logged, return slot untouched, process
//!   resumed
//! - A killed process goes through the same teardown as a voluntary
//!   exit, with status -1

use core::fmt::Write as _;

use alloc::string::String;
use alloc::sync::Arc;

use crate::drivers::{Console, ConsoleWriter, Power};
use crate::fs::FsGate;
use crate::mm::{AddressSpace, VirtAddr};
use crate::process::{LoadGate, Pid, Process, ProcessManager, Scheduler};
use crate::trap::{Disposition, TrapFrame};

use super::args::ArgReader;
use super::file;
use super::validate::{copy_user_str, validate_read, validate_write, UserFault, UserStrError};

/// System call numbers as pushed in slot 0.
pub mod numbers {
    pub const SYS_HALT: u32 = 0;
    pub const SYS_EXIT: u32 = 1;
    pub const SYS_EXEC: u32 = 2;
    pub const SYS_WAIT: u32 = 3;
    pub const SYS_CREATE: u32 = 4;
    pub const SYS_REMOVE: u32 = 5;
    pub const SYS_OPEN: u32 = 6;
    pub const SYS_FILESIZE: u32 = 7;
    pub const SYS_READ: u32 = 8;
    pub const SYS_WRITE: u32 = 9;
    pub const SYS_SEEK: u32 = 10;
    pub const SYS_TELL: u32 = 11;
    pub const SYS_CLOSE: u32 = 12;
}

/// The kernel services the dispatcher runs against, borrowed for one
/// trap.
pub struct Services<'a> {
    pub fs: &'a FsGate,
    pub console: &'a dyn Console,
    pub procs: &'a dyn ProcessManager,
    pub sched: &'a dyn Scheduler,
    pub power: &'a dyn Power,
}

/// Handle one syscall trap.
///
/// On `Resume` the frame's return slot holds the call's result (or is
/// untouched for unknown numbers) and the vector glue restores user
/// mode. On `Exit` the process has already been torn down and the frame
/// is dead; the glue retires the thread.
pub fn handle_trap(frame: &mut TrapFrame, proc: &mut Process, sv: &Services<'_>) -> Disposition {
    let space = proc.address_space();
    let args = ArgReader::new(&*space, frame.user_sp());
    let number = match args.uint(0) {
        Ok(number) => number,
        Err(fault) => return kill(proc, sv, fault),
    };

    let serviced = match number {
        numbers::SYS_HALT => sv.power.power_off(),
        numbers::SYS_EXIT => {
            return match args.int(1) {
                Ok(status) => terminate(proc, sv, status),
                Err(fault) => kill(proc, sv, fault),
            };
        }
        numbers::SYS_EXEC => exec(&args, &*space, proc, sv),
        numbers::SYS_WAIT => wait(&args, proc, sv),
        numbers::SYS_CREATE => create(&args, &*space, sv),
        numbers::SYS_REMOVE => remove(&args, &*space, sv),
        numbers::SYS_OPEN => open(&args, &*space, proc, sv),
        numbers::SYS_FILESIZE => filesize(&args, proc, sv),
        numbers::SYS_READ => read(&args, &*space, proc, sv),
        numbers::SYS_WRITE => write(&args, &*space, proc, sv),
        numbers::SYS_SEEK => seek(&args, proc, sv),
        numbers::SYS_TELL => tell(&args, proc, sv),
        numbers::SYS_CLOSE => close(&args, proc, sv),
        unknown => {
            log::warn!("pid {}: unknown syscall {}", proc.pid().as_i32(), unknown);
            return Disposition::Resume;
        }
    };

    match serviced {
        Ok(value) => {
            frame.set_return(value);
            Disposition::Resume
        }
        Err(fault) => kill(proc, sv, fault),
    }
}

/// Tear the process down with the given status.
///
/// Teardown order is fixed: record the status, print the exit line,
/// then release every descriptor in ascending order.
fn terminate(proc: &mut Process, sv: &Services<'_>, status: i32) -> Disposition {
    let status = proc.record_exit(status);
    let _ = writeln!(ConsoleWriter(sv.console), "{}: exit({})", proc.name(), status);
    for (_, file) in proc.fds_mut().drain() {
        sv.fs.lock().close(file);
    }
    Disposition::Exit(status)
}

/// Kill a process that handed the kernel a bad address.
fn kill(proc: &mut Process, sv: &Services<'_>, fault: UserFault) -> Disposition {
    log::debug!("pid {} killed: {}", proc.pid().as_i32(), fault);
    terminate(proc, sv, -1)
}

/// Copy a name or command line out of user memory.
///
/// `Ok(None)` is the recoverable over-length case; the syscall fails
/// without killing the process. A bad address is fatal as usual.
fn copy_name(space: &dyn AddressSpace, at: VirtAddr) -> Result<Option<String>, UserFault> {
    match copy_user_str(space, at) {
        Ok(name) => Ok(Some(name)),
        Err(UserStrError::TooLong) => Ok(None),
        Err(UserStrError::Fault(fault)) => Err(fault),
    }
}

/// `exec(cmdline)`: spawn a child and report its id once its image is
/// known to have loaded, -1 otherwise.
fn exec(
    args: &ArgReader<'_>,
    space: &dyn AddressSpace,
    proc: &mut Process,
    sv: &Services<'_>,
) -> Result<i32, UserFault> {
    let Some(cmdline) = copy_name(space, args.addr(1)?)? else {
        return Ok(-1);
    };
    let gate = Arc::new(LoadGate::new());
    let child = match sv.procs.spawn(proc.pid(), &cmdline, Arc::clone(&gate)) {
        Ok(pid) => pid,
        Err(err) => {
            log::debug!("pid {}: exec \"{}\": {}", proc.pid().as_i32(), cmdline, err);
            return Ok(-1);
        }
    };
    if gate.wait(proc.pid(), sv.sched) {
        proc.adopt(child, gate);
        Ok(child.as_i32())
    } else {
        Ok(-1)
    }
}

/// `wait(pid)`: block until the child exits and report its status.
///
/// Only a direct child can be waited for, and only once; everything
/// else fails without blocking.
fn wait(args: &ArgReader<'_>, proc: &mut Process, sv: &Services<'_>) -> Result<i32, UserFault> {
    let child = Pid::new(args.int(1)?);
    if proc.release_child(child).is_none() {
        return Ok(-1);
    }
    Ok(sv.procs.wait(proc.pid(), child))
}

fn create(
    args: &ArgReader<'_>,
    space: &dyn AddressSpace,
    sv: &Services<'_>,
) -> Result<i32, UserFault> {
    let name_at = args.addr(1)?;
    let size = args.uint(2)?;
    let Some(name) = copy_name(space, name_at)? else {
        return Ok(0);
    };
    Ok(file::sys_create(sv.fs, &name, size))
}

fn remove(
    args: &ArgReader<'_>,
    space: &dyn AddressSpace,
    sv: &Services<'_>,
) -> Result<i32, UserFault> {
    let Some(name) = copy_name(space, args.addr(1)?)? else {
        return Ok(0);
    };
    Ok(file::sys_remove(sv.fs, &name))
}

fn open(
    args: &ArgReader<'_>,
    space: &dyn AddressSpace,
    proc: &mut Process,
    sv: &Services<'_>,
) -> Result<i32, UserFault> {
    let Some(name) = copy_name(space, args.addr(1)?)? else {
        return Ok(-1);
    };
    Ok(file::sys_open(sv.fs, proc.fds_mut(), &name))
}

fn filesize(args: &ArgReader<'_>, proc: &Process, sv: &Services<'_>) -> Result<i32, UserFault> {
    Ok(file::sys_filesize(sv.fs, proc.fds(), args.int(1)?))
}

fn read(
    args: &ArgReader<'_>,
    space: &dyn AddressSpace,
    proc: &Process,
    sv: &Services<'_>,
) -> Result<i32, UserFault> {
    let fd = args.int(1)?;
    let buf = validate_write(space, args.addr(2)?, args.uint(3)? as usize)?;
    file::sys_read(sv.fs, sv.console, proc.fds(), fd, &buf)
}

fn write(
    args: &ArgReader<'_>,
    space: &dyn AddressSpace,
    proc: &Process,
    sv: &Services<'_>,
) -> Result<i32, UserFault> {
    let fd = args.int(1)?;
    let buf = validate_read(space, args.addr(2)?, args.uint(3)? as usize)?;
    file::sys_write(sv.fs, sv.console, proc.fds(), fd, &buf)
}

fn seek(args: &ArgReader<'_>, proc: &Process, sv: &Services<'_>) -> Result<i32, UserFault> {
    Ok(file::sys_seek(sv.fs, proc.fds(), args.int(1)?, args.uint(2)?))
}

fn tell(args: &ArgReader<'_>, proc: &Process, sv: &Services<'_>) -> Result<i32, UserFault> {
    Ok(file::sys_tell(sv.fs, proc.fds(), args.int(1)?))
}

fn close(args: &ArgReader<'_>, proc: &mut Process, sv: &Services<'_>) -> Result<i32, UserFault> {
    Ok(file::sys_close(sv.fs, proc.fds_mut(), args.int(1)?))
}
