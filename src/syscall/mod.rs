//! System Call Interface
//!
//! The boundary between untrusted user programs and the kernel. A trap
//! arrives with nothing but a register frame; everything else, starting
//! with the syscall number itself, lives on the user stack and must be
//! validated before use.
//!
//! # Security Model
//! - Whitelist approach: only the numbers in [`handler::numbers`] do
//!   anything, all others are logged and ignored
//! - Every user address is validated in full before any byte moves;
//!   invalid addresses kill the offending process, never the kernel
//! - User data is copied to kernel buffers before the filesystem sees
//!   it, so a process cannot race its own syscall
//! - Handlers return errors, never panic
//!
//! # Syscall Table
//! - 0: halt() - power off the machine
//! - 1: exit(status) - terminate the current process
//! - 2: exec(cmdline) - spawn a child process
//! - 3: wait(pid) - await a child's exit status
//! - 4: create(name, size) / 5: remove(name)
//! - 6: open(name) / 12: close(fd)
//! - 7: filesize(fd) / 10: seek(fd, pos) / 11: tell(fd)
//! - 8: read(fd, buf, size) / 9: write(fd, buf, size)

mod args;
mod file;
mod handler;
mod validate;

pub use args::ArgReader;
pub use file::USER_IO_CHUNK;
pub use handler::{handle_trap, numbers, Services};
pub use validate::{
    copy_user_str, read_user_word, validate_read, validate_write, FaultKind, UserFault, UserSpan,
    UserSpanMut, UserStrError, MAX_USER_STR,
};

/// Width of one user stack slot. Syscall numbers and arguments are
/// pushed as 4-byte words whatever the machine word size.
pub const WORD_SIZE: usize = 4;
