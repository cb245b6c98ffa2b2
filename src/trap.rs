//! Trap Frame and Resume Contract
//!
//! The register state captured when user mode traps into the kernel, and
//! the verdict the syscall boundary hands back to the vector glue.
//!
//! # Frame Layout
//! The assembly save path pushes the register file in this exact order, so
//! the struct is `#[repr(C)]` and must not be reordered:
//! - x0..x30 (x0 doubles as the syscall return slot)
//! - the user stack pointer at the moment of the trap
//! - ELR (user return address) and SPSR (saved program status)
//!
//! # Security Considerations
//! - Every field is attacker-controlled input until validated
//! - The user stack pointer is only ever interpreted through address
//!   validation; the kernel never switches onto it

use crate::mm::VirtAddr;

/// Register state saved on entry from user mode.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct TrapFrame {
    /// General purpose registers x0-x30
    pub gpr: [u64; 31],
    /// User stack pointer at trap entry
    pub usp: u64,
    /// Exception Link Register (return address)
    pub elr: u64,
    /// Saved Program Status Register
    pub spsr: u64,
}

impl TrapFrame {
    /// An all-zero frame. The vector glue overwrites every field on entry;
    /// tests build frames from this.
    pub const fn zeroed() -> Self {
        Self {
            gpr: [0; 31],
            usp: 0,
            elr: 0,
            spsr: 0,
        }
    }

    /// The user stack pointer as an (unvalidated) virtual address.
    #[inline]
    pub fn user_sp(&self) -> VirtAddr {
        VirtAddr::new(self.usp as usize)
    }

    /// Write a syscall return value into the frame's return slot (x0),
    /// sign-extended so negative sentinels survive the round trip.
    #[inline]
    pub fn set_return(&mut self, value: i32) {
        self.gpr[0] = value as i64 as u64;
    }

    /// Read back the return slot. Mostly useful to the restore path and
    /// to tests.
    #[inline]
    pub fn return_value(&self) -> u64 {
        self.gpr[0]
    }
}

/// What the vector glue must do with the trapped thread after the
/// boundary layer returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Restore the frame and resume user mode. If the call produced a
    /// value, it is already in the return slot.
    Resume,
    /// The process has been torn down with this exit status: descriptors
    /// released, exit line printed. The frame must never be resumed; the
    /// scheduler retires the thread and makes the status available to a
    /// waiting parent.
    Exit(i32),
}
