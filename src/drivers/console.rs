//! Console Interface
//!
//! The boundary layer's view of the machine console. The concrete UART
//! driver lives in the embedding kernel; syscall code only needs one byte
//! of input at a time and ordered byte output.
//!
//! # Security Considerations
//! - Output is raw bytes; line discipline (CR/LF) belongs to the driver
//! - Input is blocking by contract, so `read` on descriptor 0 always
//!   returns exactly the bytes typed

use core::fmt;

/// Machine console as consumed by the syscall boundary.
pub trait Console: Send + Sync {
    /// Block until one byte of input is available and return it.
    fn read_byte(&self) -> u8;

    /// Write the bytes to the console in order.
    fn write_bytes(&self, bytes: &[u8]);
}

/// `core::fmt` adapter over a console, used for the process exit line.
pub struct ConsoleWriter<'a>(pub &'a dyn Console);

impl fmt::Write for ConsoleWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0.write_bytes(s.as_bytes());
        Ok(())
    }
}
