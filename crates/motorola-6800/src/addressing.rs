//! Addressing mode sequencer.
//!
//! Emits the steps that read an instruction's operand bytes and form the
//! effective address, leaving the sequence ready for the operation body.
//! Extra internal cycles here exist only to match the MC6800's published
//! timing; they touch no registers.

use crate::microcode::{Addr, Latch, Seq};

/// How an instruction locates its operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AddressingMode {
    /// Inherent or accumulator: no operand bytes.
    None,
    /// One operand byte (also the offset of a relative branch).
    Immediate8,
    /// Two operand bytes, high first.
    Immediate16,
    /// One byte address in page zero ("direct").
    Direct,
    /// Two byte address, high first ("extended").
    Extended,
    /// One byte unsigned offset added to IX.
    Indexed,
    /// Not an MC6800 opcode.
    Invalid,
}

impl AddressingMode {
    /// Operand bytes following the opcode.
    #[must_use]
    pub const fn operand_len(self) -> u8 {
        match self {
            AddressingMode::None | AddressingMode::Invalid => 0,
            AddressingMode::Immediate8 | AddressingMode::Direct | AddressingMode::Indexed => 1,
            AddressingMode::Immediate16 | AddressingMode::Extended => 2,
        }
    }
}

/// What the instruction does with memory at the effective address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Access {
    None,
    Read,
    Write,
    ReadModifyWrite,
}

/// Emit operand and address steps for `mode`.
///
/// On return:
/// - `Immediate8`/`Immediate16`: the first operand byte has been read; the
///   next step sees it.
/// - `Direct`/`Extended`/`Indexed` with `Access::Read` or
///   `Access::ReadModifyWrite`: the operand at AD has been read.
/// - ... with `Access::Write`: an internal cycle with AD on the pins has
///   been spent; the body writes next.
/// - ... with `Access::None`: AD is formed in a step still waiting for its
///   bus cycle, so a jump can share it.
pub fn operand(seq: &mut Seq, mode: AddressingMode, access: Access) {
    match mode {
        AddressingMode::None | AddressingMode::Invalid => return,
        AddressingMode::Immediate8 | AddressingMode::Immediate16 => {
            seq.read(Addr::PcInc);
            return;
        }
        AddressingMode::Direct => {
            seq.read(Addr::PcInc);
            seq.latch(Latch::Direct);
        }
        AddressingMode::Extended => {
            seq.read(Addr::PcInc);
            seq.latch(Latch::High);
            seq.read(Addr::PcInc);
            seq.latch(Latch::Low);
        }
        AddressingMode::Indexed => {
            seq.read(Addr::PcInc);
            seq.latch(Latch::Indexed);
            seq.internal(Addr::Pc);
            seq.internal(Addr::Ad);
            seq.latch(Latch::None);
        }
    }

    match access {
        Access::Read | Access::ReadModifyWrite => seq.read(Addr::Ad),
        Access::Write => seq.internal(Addr::Ad),
        Access::None => {}
    }
}

/// Read the second byte of a 16-bit operand.
pub fn second_byte(seq: &mut Seq, mode: AddressingMode) {
    match mode {
        AddressingMode::Immediate16 => seq.read(Addr::PcInc),
        _ => seq.read(Addr::AdNext),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::microcode::{BusOp, Trailer};

    fn steps(mode: AddressingMode, access: Access) -> Vec<BusOp> {
        let mut seq = Seq::new();
        operand(&mut seq, mode, access);
        seq.finish(Trailer::Idle).iter().map(|op| op.bus).collect()
    }

    #[test]
    fn direct_read_is_two_cycles() {
        assert_eq!(
            steps(AddressingMode::Direct, Access::Read),
            [BusOp::Read(Addr::PcInc), BusOp::Read(Addr::Ad)]
        );
    }

    #[test]
    fn extended_write_spends_internal_cycle() {
        assert_eq!(
            steps(AddressingMode::Extended, Access::Write),
            [
                BusOp::Read(Addr::PcInc),
                BusOp::Read(Addr::PcInc),
                BusOp::Internal(Addr::Ad),
            ]
        );
    }

    #[test]
    fn indexed_inserts_internal_cycles() {
        assert_eq!(
            steps(AddressingMode::Indexed, Access::Read),
            [
                BusOp::Read(Addr::PcInc),
                BusOp::Internal(Addr::Pc),
                BusOp::Internal(Addr::Ad),
                BusOp::Read(Addr::Ad),
            ]
        );
    }

    #[test]
    fn no_access_leaves_step_open() {
        let mut seq = Seq::new();
        operand(&mut seq, AddressingMode::Extended, Access::None);
        assert!(seq.is_open());
        assert_eq!(seq.len(), 3);
    }

    #[test]
    fn operand_lengths() {
        assert_eq!(AddressingMode::None.operand_len(), 0);
        assert_eq!(AddressingMode::Indexed.operand_len(), 1);
        assert_eq!(AddressingMode::Immediate16.operand_len(), 2);
    }
}
