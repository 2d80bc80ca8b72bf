//! Stack and interrupt sequences.
//!
//! The stack grows down: a push writes at SP then decrements, a pull
//! increments then reads. Subroutine calls push PC low byte first, so the
//! high byte ends up at the lower address. Interrupt entry stacks
//! PC, IX, A, B, P (low bytes first) and RTI unstacks in reverse.

use std::sync::LazyLock;

use crate::microcode::{Addr, Dest, Exec, MicroOp, Seq, Source, Trailer};

/// Maskable interrupt vector.
pub const IRQ_VECTOR: u16 = 0xFFF8;
/// Software interrupt vector.
pub const SWI_VECTOR: u16 = 0xFFFA;
/// Non-maskable interrupt vector.
pub const NMI_VECTOR: u16 = 0xFFFC;
/// Reset vector.
pub const RESET_VECTOR: u16 = 0xFFFE;

/// Bytes stacked by SWI, WAI and hardware interrupts, in push order.
const MACHINE_STATE: [Source; 7] = [
    Source::PcLo,
    Source::PcHi,
    Source::IxLo,
    Source::IxHi,
    Source::A,
    Source::B,
    Source::P,
];

/// JSR and BSR once the target is in AD.
///
/// `settle` adds the two extra internal cycles taken by BSR and extended
/// JSR; indexed JSR starts pushing straight away.
pub fn call(seq: &mut Seq, settle: bool) {
    if settle {
        seq.internal(Addr::Sp);
    }
    seq.write(Addr::Push, Source::PcLo);
    seq.write(Addr::Push, Source::PcHi);
    seq.internal(Addr::Sp);
    if settle {
        seq.internal(Addr::Sp);
    }
    seq.exec(Exec::Jump);
    seq.internal(Addr::Pc);
}

pub fn rts(seq: &mut Seq) {
    seq.internal(Addr::Sp);
    seq.internal(Addr::Sp);
    seq.read(Addr::Pull);
    seq.exec(Exec::Load(Dest::PcHi));
    seq.read(Addr::Pull);
    seq.exec(Exec::Load(Dest::PcLo));
}

pub fn psh(seq: &mut Seq, source: Source) {
    seq.internal(Addr::Sp);
    seq.write(Addr::Push, source);
    seq.internal(Addr::Sp);
}

pub fn pul(seq: &mut Seq, dest: Dest) {
    seq.internal(Addr::Sp);
    seq.internal(Addr::Sp);
    seq.read(Addr::Pull);
    seq.exec(Exec::Load(dest));
}

/// Stack the whole machine state, one byte per cycle.
fn push_state(seq: &mut Seq) {
    for source in MACHINE_STATE {
        seq.write(Addr::Push, source);
    }
}

/// Mask interrupts and jump through `vector`, with one internal cycle either
/// side of the vector reads.
fn enter_vector(seq: &mut Seq, vector: u16) {
    seq.exec(Exec::SetI);
    seq.internal(Addr::Sp);
    seq.read(Addr::Vector(vector));
    seq.exec(Exec::Load(Dest::PcHi));
    seq.read(Addr::Vector(vector.wrapping_add(1)));
    seq.exec(Exec::Load(Dest::PcLo));
    seq.internal(Addr::Pc);
}

pub fn swi(seq: &mut Seq) {
    push_state(seq);
    enter_vector(seq, SWI_VECTOR);
}

pub fn rti(seq: &mut Seq) {
    seq.internal(Addr::Sp);
    seq.read(Addr::Pull);
    for dest in [Dest::P, Dest::B, Dest::A, Dest::IxHi, Dest::IxLo, Dest::PcHi] {
        seq.exec(Exec::Load(dest));
        seq.read(Addr::Pull);
    }
    seq.exec(Exec::Load(Dest::PcLo));
    seq.internal(Addr::Pc);
}

/// WAI stacks everything up front so a later interrupt only has to load its
/// vector. The last push hands over to the idle state.
pub fn wai(seq: &mut Seq) {
    seq.internal(Addr::Pc);
    let [rest @ .., last] = MACHINE_STATE;
    for source in rest {
        seq.write(Addr::Push, source);
    }
    seq.exec(Exec::Wait);
    seq.write(Addr::Push, last);
}

/// Hardware interrupt entry: the SWI sequence through another vector.
#[must_use]
pub fn interrupt_entry(vector: u16) -> Vec<MicroOp> {
    let mut seq = Seq::new();
    push_state(&mut seq);
    enter_vector(&mut seq, vector);
    seq.finish(Trailer::Dedicated)
}

/// Mask interrupts, read a vector and fetch from it. Used by reset and by
/// an interrupt ending WAI (state is already stacked).
#[must_use]
pub fn vector_load(vector: u16) -> Vec<MicroOp> {
    let mut seq = Seq::new();
    seq.exec(Exec::SetI);
    seq.read(Addr::Vector(vector));
    seq.exec(Exec::Load(Dest::PcHi));
    seq.read(Addr::Vector(vector.wrapping_add(1)));
    seq.exec(Exec::Load(Dest::PcLo));
    seq.finish(Trailer::Overlap)
}

/// Sequences run outside the opcode table.
#[derive(Debug)]
pub struct Sequences {
    /// A lone opcode fetch at the current PC.
    pub boot: Vec<MicroOp>,
    pub reset: Vec<MicroOp>,
    pub irq: Vec<MicroOp>,
    pub nmi: Vec<MicroOp>,
    pub wake_irq: Vec<MicroOp>,
    pub wake_nmi: Vec<MicroOp>,
}

static SEQUENCES: LazyLock<Sequences> = LazyLock::new(|| Sequences {
    boot: vec![MicroOp::FETCH],
    reset: vector_load(RESET_VECTOR),
    irq: interrupt_entry(IRQ_VECTOR),
    nmi: interrupt_entry(NMI_VECTOR),
    wake_irq: vector_load(IRQ_VECTOR),
    wake_nmi: vector_load(NMI_VECTOR),
});

/// The shared non-opcode sequences.
#[must_use]
pub fn sequences() -> &'static Sequences {
    &SEQUENCES
}
