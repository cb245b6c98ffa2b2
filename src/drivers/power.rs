//! Machine Power Control
//!
//! Seam for the one irreversible machine operation the syscall boundary
//! can request. The implementation (PSCI call, port write, whatever the
//! platform wants) lives with the platform code.

/// Machine power control as consumed by the `halt` syscall.
pub trait Power: Send + Sync {
    /// Cut machine power. Does not return.
    fn power_off(&self) -> !;
}
