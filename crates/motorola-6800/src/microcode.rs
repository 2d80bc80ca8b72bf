//! Micro-operations: one bus cycle of work each.
//!
//! A step runs in three phases, always in this order:
//!
//! 1. `latch` folds the byte read on the previous cycle into the effective
//!    address register,
//! 2. `exec` does register/ALU work (also seeing the previous cycle's byte),
//! 3. `bus` decides what goes on the pins this cycle.
//!
//! Instruction sequences are assembled once with [`Seq`] and never change.

use crate::alu::{BinaryOp, UnaryOp};
use crate::Status;

/// Effective address updates, applied with the byte read last cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Latch {
    None,
    /// AD = data (direct page address).
    Direct,
    /// AD = data << 8 (first byte of an extended address).
    High,
    /// AD |= data (second byte of an extended address).
    Low,
    /// AD = IX + data, unsigned offset with full 16-bit carry.
    Indexed,
    /// AD = PC + sign-extended data (branch target).
    Relative,
}

/// Address put on the bus for a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Addr {
    /// PC, unchanged.
    Pc,
    /// PC, then PC is incremented.
    PcInc,
    /// The effective address.
    Ad,
    /// The effective address plus one (second byte of a 16-bit operand).
    AdNext,
    /// SP, unchanged.
    Sp,
    /// SP, then SP is decremented.
    Push,
    /// SP is incremented, then used.
    Pull,
    /// A fixed vector address.
    Vector(u16),
}

/// Byte driven onto the data bus for a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    A,
    B,
    P,
    PcLo,
    PcHi,
    IxLo,
    IxHi,
    SpLo,
    SpHi,
    /// Output of the last read-modify-write operation.
    Result,
}

/// Register loaded from the byte read last cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dest {
    A,
    B,
    P,
    IxHi,
    IxLo,
    PcHi,
    PcLo,
}

/// What the bus does during a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusOp {
    Read(Addr),
    Write(Addr, Source),
    /// Address on the pins with VMA low: memory must ignore it.
    Internal(Addr),
    /// Opcode fetch at PC. Always the last step of a sequence.
    Fetch,
}

/// Accumulator selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acc {
    A,
    B,
}

impl Acc {
    /// The accumulator as a write source.
    #[must_use]
    pub const fn source(self) -> Source {
        match self {
            Acc::A => Source::A,
            Acc::B => Source::B,
        }
    }

    /// The accumulator as a load destination.
    #[must_use]
    pub const fn dest(self) -> Dest {
        match self {
            Acc::A => Dest::A,
            Acc::B => Dest::B,
        }
    }
}

/// 16-bit register selector for STX/STS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reg16 {
    Ix,
    Sp,
}

impl Reg16 {
    /// High and low byte sources, in the order they are stored.
    #[must_use]
    pub const fn sources(self) -> (Source, Source) {
        match self {
            Reg16::Ix => (Source::IxHi, Source::IxLo),
            Reg16::Sp => (Source::SpHi, Source::SpLo),
        }
    }
}

/// 16-bit operations that read a two-byte operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordOp {
    Cpx,
    Lds,
    Ldx,
}

/// Branch conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cond {
    Always,
    Hi,
    Ls,
    Cc,
    Cs,
    Ne,
    Eq,
    Vc,
    Vs,
    Pl,
    Mi,
    Ge,
    Lt,
    Gt,
    Le,
}

impl Cond {
    /// Evaluate the condition against the condition codes.
    #[must_use]
    pub const fn test(self, p: Status) -> bool {
        use crate::flags::{C, N, V, Z};
        match self {
            Cond::Always => true,
            Cond::Hi => !p.is_set(C) && !p.is_set(Z),
            Cond::Ls => p.is_set(C) || p.is_set(Z),
            Cond::Cc => !p.is_set(C),
            Cond::Cs => p.is_set(C),
            Cond::Ne => !p.is_set(Z),
            Cond::Eq => p.is_set(Z),
            Cond::Vc => !p.is_set(V),
            Cond::Vs => p.is_set(V),
            Cond::Pl => !p.is_set(N),
            Cond::Mi => p.is_set(N),
            Cond::Ge => !p.lt(),
            Cond::Lt => p.lt(),
            Cond::Gt => !p.is_set(Z) && !p.lt(),
            Cond::Le => p.is_set(Z) || p.lt(),
        }
    }
}

/// Register-only instructions (opcodes $00-$1F and the 4-cycle stack
/// pointer transfers in $30-$35).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inherent {
    Nop,
    Tap,
    Tpa,
    Inx,
    Dex,
    Clv,
    Sev,
    Clc,
    Sec,
    Cli,
    Sei,
    Sba,
    Cba,
    Tab,
    Tba,
    Daa,
    Aba,
    Tsx,
    Ins,
    Des,
    Txs,
}

impl Inherent {
    /// INX, DEX and the SP/IX transfers take 4 cycles; everything else 2.
    #[must_use]
    pub const fn is_long(self) -> bool {
        matches!(
            self,
            Inherent::Inx
                | Inherent::Dex
                | Inherent::Tsx
                | Inherent::Ins
                | Inherent::Des
                | Inherent::Txs
        )
    }
}

/// Register and ALU work done in a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exec {
    None,
    Inherent(Inherent),
    /// Single-operand op on an accumulator.
    Unary(UnaryOp, Acc),
    /// Single-operand op on the byte just read; result kept for write-back.
    UnaryMem(UnaryOp),
    /// Accumulator op with the byte just read.
    Binary(BinaryOp, Acc),
    /// Flags for STAA/STAB.
    Store(Acc),
    /// Flags for STX/STS.
    StoreWord(Reg16),
    /// Latch the high byte of a 16-bit operand.
    WordHigh,
    /// Combine the low byte and run the 16-bit op.
    Word(WordOp),
    Load(Dest),
    /// PC = AD when the condition holds.
    Branch(Cond),
    /// PC = AD.
    Jump,
    /// Set the interrupt mask.
    SetI,
    /// Enter the WAI idle state once this step's bus cycle completes.
    Wait,
    /// Illegal opcode handler.
    Trap,
}

/// One clock cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MicroOp {
    pub latch: Latch,
    pub exec: Exec,
    pub bus: BusOp,
}

impl MicroOp {
    /// A bare opcode fetch.
    pub const FETCH: Self = Self {
        latch: Latch::None,
        exec: Exec::None,
        bus: BusOp::Fetch,
    };

    /// True when this step reads the next opcode.
    #[must_use]
    pub const fn is_fetch(&self) -> bool {
        matches!(self.bus, BusOp::Fetch)
    }

    /// True when VMA is asserted for this step.
    #[must_use]
    pub const fn is_valid_memory(&self) -> bool {
        !matches!(self.bus, BusOp::Internal(_))
    }
}

/// How a sequence ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trailer {
    /// The last step's work shares its cycle with the next opcode fetch.
    /// Used after a final operand read and for JMP.
    Overlap,
    /// Finish any pending step with an internal cycle, then fetch in a cycle
    /// of its own. Used after writes and register-only work.
    Dedicated,
    /// No fetch at all: the sequence hands control to an idle state.
    Idle,
}

#[derive(Debug, Clone, Copy)]
struct Step {
    latch: Latch,
    exec: Exec,
    bus: Option<BusOp>,
}

impl Step {
    const fn open(latch: Latch, exec: Exec) -> Self {
        Self {
            latch,
            exec,
            bus: None,
        }
    }
}

/// Sequence builder.
///
/// `latch` and `exec` open a step; `bus` closes the open step or adds a new
/// one. Trailing work left open is resolved by the [`Trailer`] in
/// [`Seq::finish`].
#[derive(Debug, Default)]
pub struct Seq {
    steps: Vec<Step>,
}

impl Seq {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of steps so far, open or closed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// True when the last step is waiting for a bus operation.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.steps.last().is_some_and(|step| step.bus.is_none())
    }

    fn open_step(&mut self) -> Option<&mut Step> {
        self.steps.last_mut().filter(|step| step.bus.is_none())
    }

    /// Close a pending step with an internal cycle.
    fn close(&mut self) {
        if let Some(step) = self.open_step() {
            step.bus = Some(BusOp::Internal(Addr::Pc));
        }
    }

    /// Start a new step that latches the previous cycle's byte.
    pub fn latch(&mut self, latch: Latch) {
        self.close();
        self.steps.push(Step::open(latch, Exec::None));
    }

    /// Attach work to the open step, or start a new one.
    pub fn exec(&mut self, exec: Exec) {
        let fillable = self.open_step().is_some_and(|step| step.exec == Exec::None);
        if !fillable {
            self.close();
            self.steps.push(Step::open(Latch::None, Exec::None));
        }
        if let Some(step) = self.steps.last_mut() {
            step.exec = exec;
        }
    }

    /// Give the open step its bus cycle, or add a step with only a bus cycle.
    pub fn bus(&mut self, bus: BusOp) {
        match self.open_step() {
            Some(step) => step.bus = Some(bus),
            None => self.steps.push(Step {
                latch: Latch::None,
                exec: Exec::None,
                bus: Some(bus),
            }),
        }
    }

    pub fn read(&mut self, addr: Addr) {
        self.bus(BusOp::Read(addr));
    }

    pub fn write(&mut self, addr: Addr, source: Source) {
        self.bus(BusOp::Write(addr, source));
    }

    pub fn internal(&mut self, addr: Addr) {
        self.bus(BusOp::Internal(addr));
    }

    /// Apply the trailer and freeze the sequence.
    #[must_use]
    pub fn finish(mut self, trailer: Trailer) -> Vec<MicroOp> {
        match trailer {
            Trailer::Overlap => self.bus(BusOp::Fetch),
            Trailer::Dedicated => {
                self.close();
                self.bus(BusOp::Fetch);
            }
            Trailer::Idle => self.close(),
        }
        self.steps
            .into_iter()
            .map(|step| MicroOp {
                latch: step.latch,
                exec: step.exec,
                bus: step.bus.unwrap_or(BusOp::Internal(Addr::Pc)),
            })
            .collect()
    }
}

/// Bus cycles an instruction occupies.
///
/// A sequence ending in a fetch counts that fetch in place of its own opcode
/// fetch, so its length is its cycle count. A sequence that idles instead
/// (WAI) adds its own opcode fetch.
#[must_use]
pub fn cycle_count(ops: &[MicroOp]) -> u8 {
    let steps = ops.len() as u8;
    match ops.last() {
        Some(op) if op.is_fetch() => steps,
        _ => steps + 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_merges_fetch_into_open_step() {
        let mut seq = Seq::new();
        seq.read(Addr::PcInc);
        seq.exec(Exec::Jump);
        let ops = seq.finish(Trailer::Overlap);
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[1].exec, Exec::Jump);
        assert!(ops[1].is_fetch());
    }

    #[test]
    fn dedicated_closes_open_step_first() {
        let mut seq = Seq::new();
        seq.exec(Exec::Inherent(Inherent::Nop));
        let ops = seq.finish(Trailer::Dedicated);
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].bus, BusOp::Internal(Addr::Pc));
        assert!(!ops[0].is_valid_memory());
        assert_eq!(ops[1], MicroOp::FETCH);
    }

    #[test]
    fn latch_and_exec_share_a_step() {
        let mut seq = Seq::new();
        seq.read(Addr::PcInc);
        seq.latch(Latch::Direct);
        seq.exec(Exec::Jump);
        assert_eq!(seq.len(), 2);
        assert!(seq.is_open());
    }

    #[test]
    fn second_exec_starts_new_step() {
        let mut seq = Seq::new();
        seq.exec(Exec::SetI);
        seq.exec(Exec::Jump);
        let ops = seq.finish(Trailer::Idle);
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].bus, BusOp::Internal(Addr::Pc));
    }

    #[test]
    fn cycle_count_adds_own_fetch_when_idling() {
        let mut seq = Seq::new();
        seq.internal(Addr::Pc);
        seq.exec(Exec::Wait);
        let ops = seq.finish(Trailer::Idle);
        assert_eq!(ops.len(), 2);
        assert_eq!(cycle_count(&ops), 3);
    }

    #[test]
    fn long_inherent_ops() {
        assert!(Inherent::Inx.is_long());
        assert!(Inherent::Txs.is_long());
        assert!(!Inherent::Tab.is_long());
    }
}
