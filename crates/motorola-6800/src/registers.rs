//! 6800 CPU registers.

use crate::Status;
use crate::flags::I;

/// 6800 CPU register set.
///
/// - A, B: 8-bit accumulators
/// - IX: 16-bit index register
/// - SP: 16-bit stack pointer (points at the next free byte, grows down)
/// - PC: 16-bit program counter
/// - P: condition codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Registers {
    /// Accumulator A.
    pub a: u8,
    /// Accumulator B.
    pub b: u8,
    /// Index register.
    pub ix: u16,
    /// Stack pointer.
    pub sp: u16,
    /// Program counter.
    pub pc: u16,
    /// Condition codes.
    pub p: Status,
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

impl Registers {
    /// Power-on register state.
    ///
    /// The 6800 leaves A, B, IX and SP undefined at power-on; we use 0.
    /// The interrupt mask is set, as the reset sequence would leave it.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            a: 0,
            b: 0,
            ix: 0,
            sp: 0,
            pc: 0,
            p: Status::from_byte(I),
        }
    }

    /// Address for a push: the current SP, which is then decremented.
    pub fn push(&mut self) -> u16 {
        let addr = self.sp;
        self.sp = self.sp.wrapping_sub(1);
        addr
    }

    /// Address for a pull: SP is incremented first, then used.
    pub fn pull(&mut self) -> u16 {
        self.sp = self.sp.wrapping_add(1);
        self.sp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_then_pull_returns_same_address() {
        let mut regs = Registers::new();
        regs.sp = 0x01FF;
        let pushed = regs.push();
        assert_eq!(pushed, 0x01FF);
        assert_eq!(regs.sp, 0x01FE);
        assert_eq!(regs.pull(), 0x01FF);
        assert_eq!(regs.sp, 0x01FF);
    }

    #[test]
    fn stack_wraps_at_bottom_of_memory() {
        let mut regs = Registers::new();
        regs.sp = 0x0000;
        assert_eq!(regs.push(), 0x0000);
        assert_eq!(regs.sp, 0xFFFF);
    }
}
