//! OcelotOS Syscall Boundary
//!
//! The user/kernel boundary layer of OcelotOS: trap-frame decoding,
//! user-memory validation, the thirteen-call syscall table, and the
//! per-process bookkeeping they need.
//!
//! # Security Model
//! - User memory is hostile input; every span is proven mapped before a
//!   byte moves, and all data crosses through kernel buffers
//! - A process that hands over a bad address is killed with status -1;
//!   the kernel itself never faults on user data
//! - The shared filesystem sits behind one gate, taken per primitive
//!   call and never held across a user memory access
//!
//! # Layout
//! - [`trap`]: the saved register frame and the resume/exit verdict
//! - [`syscall`]: validation, argument decoding, dispatch
//! - [`process`]: descriptor table, load handshake, process state
//! - [`mm`], [`fs`], [`drivers`]: the seams the boundary calls through
//!
//! The machine-dependent pieces (vector glue, paging, the real
//! filesystem and UART) live in the embedding kernel and plug in via
//! the trait seams.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_op_in_unsafe_fn)]

extern crate alloc;

pub mod drivers;
pub mod fs;
pub mod mm;
pub mod process;
pub mod syscall;
pub mod trap;

#[cfg(test)]
mod testutil;

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
