//! Trap Frame Argument Access
//!
//! User code passes a syscall number and its arguments as little-endian
//! words on its own stack. Nothing about that stack can be trusted: the
//! pointer may be null, dangling, or parked one word below the kernel
//! line. Every slot read goes through full span validation.
//!
//! # Layout
//! - Slot `n` lives at `usp + 4 * n`
//! - Slot 0 holds the syscall number, arguments follow in order
//! - Each slot is validated independently; handlers that take two
//!   arguments never touch slot 3

use crate::mm::{AddressSpace, VirtAddr};

use super::validate::{read_user_word, FaultKind, UserFault};
use super::WORD_SIZE;

/// Typed reader over one trap's stack slots.
pub struct ArgReader<'a> {
    space: &'a dyn AddressSpace,
    base: VirtAddr,
}

impl<'a> ArgReader<'a> {
    /// Wrap the user stack pointer captured at trap entry.
    pub fn new(space: &'a dyn AddressSpace, usp: VirtAddr) -> Self {
        Self { space, base: usp }
    }

    fn slot(&self, n: usize) -> Result<VirtAddr, UserFault> {
        self.base.checked_add(n * WORD_SIZE).ok_or(UserFault {
            addr: self.base,
            kind: FaultKind::Kernel,
        })
    }

    /// Read slot `n` as an unsigned word.
    pub fn uint(&self, n: usize) -> Result<u32, UserFault> {
        read_user_word(self.space, self.slot(n)?)
    }

    /// Read slot `n` as a signed word.
    pub fn int(&self, n: usize) -> Result<i32, UserFault> {
        Ok(self.uint(n)? as i32)
    }

    /// Read slot `n` as a user address. The address itself is not
    /// validated here; it is validated when dereferenced.
    pub fn addr(&self, n: usize) -> Result<VirtAddr, UserFault> {
        Ok(VirtAddr::new(self.uint(n)? as usize))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mm::PAGE_SIZE;
    use crate::testutil::{user_stack, FakeSpace};

    const STACK_PAGE: usize = 0x0804_0000;

    #[test]
    fn test_slots_walk_up_the_stack() {
        let mut space = FakeSpace::new();
        space.map_page(STACK_PAGE);
        let usp = STACK_PAGE + 0x100;
        user_stack(&space, usp, &[3, 42, 0x0800_0040]);

        let args = ArgReader::new(&space, VirtAddr::new(usp));
        assert_eq!(args.uint(0).unwrap(), 3);
        assert_eq!(args.int(1).unwrap(), 42);
        assert_eq!(args.addr(2).unwrap(), VirtAddr::new(0x0800_0040));
    }

    #[test]
    fn test_negative_argument_keeps_its_sign() {
        let mut space = FakeSpace::new();
        space.map_page(STACK_PAGE);
        user_stack(&space, STACK_PAGE, &[1, 0xffff_fff9]);

        let args = ArgReader::new(&space, VirtAddr::new(STACK_PAGE));
        assert_eq!(args.int(1).unwrap(), -7);
    }

    #[test]
    fn test_slot_past_mapping_faults() {
        let mut space = FakeSpace::new();
        space.map_page(STACK_PAGE);
        // Slot 0 is the last word of the page; slot 1 is off the map.
        let usp = STACK_PAGE + PAGE_SIZE - WORD_SIZE;
        user_stack(&space, usp, &[9]);

        let args = ArgReader::new(&space, VirtAddr::new(usp));
        assert_eq!(args.uint(0).unwrap(), 9);
        assert_eq!(args.uint(1).unwrap_err().kind, FaultKind::Unmapped);
    }

    #[test]
    fn test_slot_straddling_two_pages_reads_whole_word() {
        let mut space = FakeSpace::new();
        space.map_page(STACK_PAGE);
        space.map_page(STACK_PAGE + PAGE_SIZE);
        let usp = STACK_PAGE + PAGE_SIZE - 2;
        space.poke(usp, &0x0102_0304u32.to_le_bytes());

        let args = ArgReader::new(&space, VirtAddr::new(usp));
        assert_eq!(args.uint(0).unwrap(), 0x0102_0304);
    }

    #[test]
    fn test_null_stack_pointer_faults() {
        let space = FakeSpace::new();
        let args = ArgReader::new(&space, VirtAddr::new(0));
        assert_eq!(args.uint(0).unwrap_err().kind, FaultKind::Null);
    }
}
