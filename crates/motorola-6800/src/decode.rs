//! Opcode decoder.
//!
//! An opcode splits into three fields:
//!
//! ```text
//!   7 6 | 5 4 | 3 2 1 0
//!   aa  | bb  |  cccc
//! ```
//!
//! `aa` picks the group (register ops, unary ops, accumulator A, accumulator
//! B), `bb` the row within it (usually the addressing mode) and `cccc` the
//! operation. Mode and access come from a fixed table indexed by the three
//! fields; the operation is decoded from the same fields. Each descriptor's
//! micro-op sequence is addressing steps, then the operation body, then a
//! trailer that places the next opcode fetch.

use std::sync::LazyLock;

use crate::addressing::{self, Access, AddressingMode};
use crate::alu::{BinaryOp, UnaryOp};
use crate::microcode::{
    Acc, Addr, Cond, Exec, Inherent, Latch, MicroOp, Reg16, Seq, Source, Trailer, WordOp,
    cycle_count,
};
use crate::stack;

type Entry = (AddressingMode, Access);

const NON: Entry = (AddressingMode::None, Access::None);
const INV: Entry = (AddressingMode::Invalid, Access::None);
const PUL: Entry = (AddressingMode::None, Access::Read);
const PSH: Entry = (AddressingMode::None, Access::Write);
const I8R: Entry = (AddressingMode::Immediate8, Access::Read);
const I8N: Entry = (AddressingMode::Immediate8, Access::None);
const I16: Entry = (AddressingMode::Immediate16, Access::Read);
const DRD: Entry = (AddressingMode::Direct, Access::Read);
const DWR: Entry = (AddressingMode::Direct, Access::Write);
const XRD: Entry = (AddressingMode::Indexed, Access::Read);
const XWR: Entry = (AddressingMode::Indexed, Access::Write);
const XRM: Entry = (AddressingMode::Indexed, Access::ReadModifyWrite);
const XNO: Entry = (AddressingMode::Indexed, Access::None);
const ERD: Entry = (AddressingMode::Extended, Access::Read);
const EWR: Entry = (AddressingMode::Extended, Access::Write);
const ERM: Entry = (AddressingMode::Extended, Access::ReadModifyWrite);
const ENO: Entry = (AddressingMode::Extended, Access::None);

/// `[aa][bb][cccc]` -> (addressing mode, memory access).
#[rustfmt::skip]
const MODES: [[[Entry; 16]; 4]; 4] = [
    // aa = 0: register, branch and stack operations
    [
        [INV, NON, INV, INV, INV, INV, NON, NON, NON, NON, NON, NON, NON, NON, NON, NON],
        [NON, NON, INV, INV, INV, INV, NON, NON, INV, NON, INV, NON, INV, INV, INV, INV],
        [I8R, INV, I8R, I8R, I8R, I8R, I8R, I8R, I8R, I8R, I8R, I8R, I8R, I8R, I8R, I8R],
        [NON, NON, PUL, PUL, NON, NON, PSH, PSH, INV, PUL, INV, PUL, INV, INV, PSH, PSH],
    ],
    // aa = 1: unary operations on A, B, indexed and extended memory
    [
        [NON, INV, INV, NON, NON, INV, NON, NON, NON, NON, NON, INV, NON, NON, INV, NON],
        [NON, INV, INV, NON, NON, INV, NON, NON, NON, NON, NON, INV, NON, NON, INV, NON],
        [XRM, INV, INV, XRM, XRM, INV, XRM, XRM, XRM, XRM, XRM, INV, XRM, XRM, XNO, XRM],
        [ERM, INV, INV, ERM, ERM, INV, ERM, ERM, ERM, ERM, ERM, INV, ERM, ERM, ENO, ERM],
    ],
    // aa = 2: accumulator A, plus CPX/BSR/JSR/LDS/STS
    [
        [I8R, I8R, I8R, INV, I8R, I8R, I8R, INV, I8R, I8R, I8R, I8R, I16, I8N, I16, INV],
        [DRD, DRD, DRD, INV, DRD, DRD, DRD, DWR, DRD, DRD, DRD, DRD, DRD, INV, DRD, DWR],
        [XRD, XRD, XRD, INV, XRD, XRD, XRD, XWR, XRD, XRD, XRD, XRD, XRD, XNO, XRD, XWR],
        [ERD, ERD, ERD, INV, ERD, ERD, ERD, EWR, ERD, ERD, ERD, ERD, ERD, ENO, ERD, EWR],
    ],
    // aa = 3: accumulator B, plus LDX/STX
    [
        [I8R, I8R, I8R, INV, I8R, I8R, I8R, INV, I8R, I8R, I8R, I8R, INV, INV, I16, INV],
        [DRD, DRD, DRD, INV, DRD, DRD, DRD, DWR, DRD, DRD, DRD, DRD, INV, INV, DRD, DWR],
        [XRD, XRD, XRD, INV, XRD, XRD, XRD, XWR, XRD, XRD, XRD, XRD, INV, INV, XRD, XWR],
        [ERD, ERD, ERD, INV, ERD, ERD, ERD, EWR, ERD, ERD, ERD, ERD, INV, INV, ERD, EWR],
    ],
];

/// Split an opcode into `(aa, bb, cccc)`.
#[must_use]
pub const fn fields(opcode: u8) -> (usize, usize, usize) {
    (
        (opcode >> 6) as usize & 0x3,
        (opcode >> 4) as usize & 0x3,
        opcode as usize & 0xF,
    )
}

/// Addressing mode and access kind for an opcode.
#[must_use]
pub const fn mode(opcode: u8) -> (AddressingMode, Access) {
    let (aa, bb, cccc) = fields(opcode);
    MODES[aa][bb][cccc]
}

/// What an opcode does, independent of how it addresses memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Inherent(Inherent),
    /// Unary op on an accumulator.
    Unary(UnaryOp, Acc),
    /// Unary op on memory.
    UnaryMem(UnaryOp),
    Jmp,
    Branch(Cond),
    Bsr,
    Jsr,
    Binary(BinaryOp, Acc),
    Store(Acc),
    Word(WordOp),
    StoreWord(Reg16),
    Psh(Acc),
    Pul(Acc),
    Rts,
    Rti,
    Wai,
    Swi,
    Illegal,
}

const BRANCHES: [Option<Cond>; 16] = [
    Some(Cond::Always),
    None,
    Some(Cond::Hi),
    Some(Cond::Ls),
    Some(Cond::Cc),
    Some(Cond::Cs),
    Some(Cond::Ne),
    Some(Cond::Eq),
    Some(Cond::Vc),
    Some(Cond::Vs),
    Some(Cond::Pl),
    Some(Cond::Mi),
    Some(Cond::Ge),
    Some(Cond::Lt),
    Some(Cond::Gt),
    Some(Cond::Le),
];

const fn unary_op(cccc: usize) -> Option<UnaryOp> {
    Some(match cccc {
        0x0 => UnaryOp::Neg,
        0x3 => UnaryOp::Com,
        0x4 => UnaryOp::Lsr,
        0x6 => UnaryOp::Ror,
        0x7 => UnaryOp::Asr,
        0x8 => UnaryOp::Asl,
        0x9 => UnaryOp::Rol,
        0xA => UnaryOp::Dec,
        0xC => UnaryOp::Inc,
        0xD => UnaryOp::Tst,
        0xF => UnaryOp::Clr,
        _ => return None,
    })
}

const fn binary_op(cccc: usize) -> Option<BinaryOp> {
    Some(match cccc {
        0x0 => BinaryOp::Sub,
        0x1 => BinaryOp::Cmp,
        0x2 => BinaryOp::Sbc,
        0x4 => BinaryOp::And,
        0x5 => BinaryOp::Bit,
        0x6 => BinaryOp::Lda,
        0x8 => BinaryOp::Eor,
        0x9 => BinaryOp::Adc,
        0xA => BinaryOp::Ora,
        0xB => BinaryOp::Add,
        _ => return None,
    })
}

/// Decode the operation from the opcode fields.
#[must_use]
pub fn operation(opcode: u8) -> Operation {
    if mode(opcode).0 == AddressingMode::Invalid {
        return Operation::Illegal;
    }
    let (aa, bb, cccc) = fields(opcode);
    let op = match (aa, bb) {
        (0, 0 | 1) => inherent(opcode).map(Operation::Inherent),
        (0, 2) => BRANCHES[cccc].map(Operation::Branch),
        (0, 3) => stack_op(opcode),
        (1, _) => match (bb, cccc) {
            (0, _) => unary_op(cccc).map(|op| Operation::Unary(op, Acc::A)),
            (1, _) => unary_op(cccc).map(|op| Operation::Unary(op, Acc::B)),
            (_, 0xE) => Some(Operation::Jmp),
            _ => unary_op(cccc).map(Operation::UnaryMem),
        },
        _ => {
            let acc = if aa == 2 { Acc::A } else { Acc::B };
            match cccc {
                0x7 => Some(Operation::Store(acc)),
                0xC => Some(Operation::Word(WordOp::Cpx)),
                0xD if bb == 0 => Some(Operation::Bsr),
                0xD => Some(Operation::Jsr),
                0xE if aa == 2 => Some(Operation::Word(WordOp::Lds)),
                0xE => Some(Operation::Word(WordOp::Ldx)),
                0xF if aa == 2 => Some(Operation::StoreWord(Reg16::Sp)),
                0xF => Some(Operation::StoreWord(Reg16::Ix)),
                _ => binary_op(cccc).map(|op| Operation::Binary(op, acc)),
            }
        }
    };
    op.unwrap_or(Operation::Illegal)
}

fn inherent(opcode: u8) -> Option<Inherent> {
    Some(match opcode {
        0x01 => Inherent::Nop,
        0x06 => Inherent::Tap,
        0x07 => Inherent::Tpa,
        0x08 => Inherent::Inx,
        0x09 => Inherent::Dex,
        0x0A => Inherent::Clv,
        0x0B => Inherent::Sev,
        0x0C => Inherent::Clc,
        0x0D => Inherent::Sec,
        0x0E => Inherent::Cli,
        0x0F => Inherent::Sei,
        0x10 => Inherent::Sba,
        0x11 => Inherent::Cba,
        0x16 => Inherent::Tab,
        0x17 => Inherent::Tba,
        0x19 => Inherent::Daa,
        0x1B => Inherent::Aba,
        0x30 => Inherent::Tsx,
        0x31 => Inherent::Ins,
        0x34 => Inherent::Des,
        0x35 => Inherent::Txs,
        _ => return None,
    })
}

fn stack_op(opcode: u8) -> Option<Operation> {
    Some(match opcode {
        0x32 => Operation::Pul(Acc::A),
        0x33 => Operation::Pul(Acc::B),
        0x36 => Operation::Psh(Acc::A),
        0x37 => Operation::Psh(Acc::B),
        0x39 => Operation::Rts,
        0x3B => Operation::Rti,
        0x3E => Operation::Wai,
        0x3F => Operation::Swi,
        _ => return inherent(opcode).map(Operation::Inherent),
    })
}

impl Operation {
    /// Assembler mnemonic.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Operation::Inherent(op) => match op {
                Inherent::Nop => "NOP",
                Inherent::Tap => "TAP",
                Inherent::Tpa => "TPA",
                Inherent::Inx => "INX",
                Inherent::Dex => "DEX",
                Inherent::Clv => "CLV",
                Inherent::Sev => "SEV",
                Inherent::Clc => "CLC",
                Inherent::Sec => "SEC",
                Inherent::Cli => "CLI",
                Inherent::Sei => "SEI",
                Inherent::Sba => "SBA",
                Inherent::Cba => "CBA",
                Inherent::Tab => "TAB",
                Inherent::Tba => "TBA",
                Inherent::Daa => "DAA",
                Inherent::Aba => "ABA",
                Inherent::Tsx => "TSX",
                Inherent::Ins => "INS",
                Inherent::Des => "DES",
                Inherent::Txs => "TXS",
            },
            Operation::Unary(op, acc) => {
                let names = unary_names(op);
                match acc {
                    Acc::A => names[0],
                    Acc::B => names[1],
                }
            }
            Operation::UnaryMem(op) => unary_names(op)[2],
            Operation::Jmp => "JMP",
            Operation::Branch(cond) => match cond {
                Cond::Always => "BRA",
                Cond::Hi => "BHI",
                Cond::Ls => "BLS",
                Cond::Cc => "BCC",
                Cond::Cs => "BCS",
                Cond::Ne => "BNE",
                Cond::Eq => "BEQ",
                Cond::Vc => "BVC",
                Cond::Vs => "BVS",
                Cond::Pl => "BPL",
                Cond::Mi => "BMI",
                Cond::Ge => "BGE",
                Cond::Lt => "BLT",
                Cond::Gt => "BGT",
                Cond::Le => "BLE",
            },
            Operation::Bsr => "BSR",
            Operation::Jsr => "JSR",
            Operation::Binary(op, acc) => {
                let names = binary_names(op);
                match acc {
                    Acc::A => names[0],
                    Acc::B => names[1],
                }
            }
            Operation::Store(Acc::A) => "STAA",
            Operation::Store(Acc::B) => "STAB",
            Operation::Word(WordOp::Cpx) => "CPX",
            Operation::Word(WordOp::Lds) => "LDS",
            Operation::Word(WordOp::Ldx) => "LDX",
            Operation::StoreWord(Reg16::Sp) => "STS",
            Operation::StoreWord(Reg16::Ix) => "STX",
            Operation::Psh(Acc::A) => "PSHA",
            Operation::Psh(Acc::B) => "PSHB",
            Operation::Pul(Acc::A) => "PULA",
            Operation::Pul(Acc::B) => "PULB",
            Operation::Rts => "RTS",
            Operation::Rti => "RTI",
            Operation::Wai => "WAI",
            Operation::Swi => "SWI",
            Operation::Illegal => "???",
        }
    }
}

/// `[accumulator A, accumulator B, memory]`
const fn unary_names(op: UnaryOp) -> [&'static str; 3] {
    match op {
        UnaryOp::Neg => ["NEGA", "NEGB", "NEG"],
        UnaryOp::Com => ["COMA", "COMB", "COM"],
        UnaryOp::Lsr => ["LSRA", "LSRB", "LSR"],
        UnaryOp::Ror => ["RORA", "RORB", "ROR"],
        UnaryOp::Asr => ["ASRA", "ASRB", "ASR"],
        UnaryOp::Asl => ["ASLA", "ASLB", "ASL"],
        UnaryOp::Rol => ["ROLA", "ROLB", "ROL"],
        UnaryOp::Dec => ["DECA", "DECB", "DEC"],
        UnaryOp::Inc => ["INCA", "INCB", "INC"],
        UnaryOp::Tst => ["TSTA", "TSTB", "TST"],
        UnaryOp::Clr => ["CLRA", "CLRB", "CLR"],
    }
}

const fn binary_names(op: BinaryOp) -> [&'static str; 2] {
    match op {
        BinaryOp::Sub => ["SUBA", "SUBB"],
        BinaryOp::Cmp => ["CMPA", "CMPB"],
        BinaryOp::Sbc => ["SBCA", "SBCB"],
        BinaryOp::And => ["ANDA", "ANDB"],
        BinaryOp::Bit => ["BITA", "BITB"],
        BinaryOp::Lda => ["LDAA", "LDAB"],
        BinaryOp::Eor => ["EORA", "EORB"],
        BinaryOp::Adc => ["ADCA", "ADCB"],
        BinaryOp::Ora => ["ORAA", "ORAB"],
        BinaryOp::Add => ["ADDA", "ADDB"],
    }
}

/// Everything known about one opcode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    pub opcode: u8,
    pub mnemonic: &'static str,
    pub operation: Operation,
    pub mode: AddressingMode,
    pub access: Access,
    /// Bus cycles, counting the opcode fetch.
    pub cycles: u8,
    pub micro_ops: Vec<MicroOp>,
}

impl Descriptor {
    /// True for opcodes the MC6800 does not define.
    #[must_use]
    pub fn is_illegal(&self) -> bool {
        self.operation == Operation::Illegal
    }

    /// Instruction length in bytes, opcode included.
    #[must_use]
    pub fn length(&self) -> u8 {
        1 + self.mode.operand_len()
    }
}

/// Build the micro-op sequence for an opcode.
fn build(opcode: u8) -> Descriptor {
    let (mode, access) = mode(opcode);
    let operation = operation(opcode);
    let mut seq = Seq::new();
    addressing::operand(&mut seq, mode, access);

    let mut trailer = match access {
        Access::Read => Trailer::Overlap,
        _ => Trailer::Dedicated,
    };

    match operation {
        Operation::Inherent(op) => {
            seq.exec(Exec::Inherent(op));
            if op.is_long() {
                seq.internal(Addr::Pc);
                seq.internal(Addr::Pc);
                seq.internal(Addr::Pc);
            }
        }
        Operation::Unary(op, acc) => seq.exec(Exec::Unary(op, acc)),
        Operation::UnaryMem(op) => {
            seq.exec(Exec::UnaryMem(op));
            seq.internal(Addr::Ad);
            if op == UnaryOp::Tst {
                seq.internal(Addr::Ad);
            } else {
                seq.write(Addr::Ad, Source::Result);
            }
        }
        Operation::Jmp => {
            seq.exec(Exec::Jump);
            trailer = Trailer::Overlap;
        }
        Operation::Branch(cond) => {
            seq.latch(Latch::Relative);
            seq.internal(Addr::Pc);
            seq.internal(Addr::Pc);
            seq.exec(Exec::Branch(cond));
        }
        Operation::Bsr => {
            seq.latch(Latch::Relative);
            stack::call(&mut seq, true);
        }
        Operation::Jsr => stack::call(&mut seq, mode == AddressingMode::Extended),
        Operation::Binary(op, acc) => seq.exec(Exec::Binary(op, acc)),
        Operation::Store(acc) => {
            seq.exec(Exec::Store(acc));
            seq.write(Addr::Ad, acc.source());
        }
        Operation::Word(op) => {
            seq.exec(Exec::WordHigh);
            addressing::second_byte(&mut seq, mode);
            seq.exec(Exec::Word(op));
        }
        Operation::StoreWord(reg) => {
            let (hi, lo) = reg.sources();
            seq.exec(Exec::StoreWord(reg));
            seq.write(Addr::Ad, hi);
            seq.write(Addr::AdNext, lo);
        }
        Operation::Psh(acc) => stack::psh(&mut seq, acc.source()),
        Operation::Pul(acc) => stack::pul(&mut seq, acc.dest()),
        Operation::Rts => stack::rts(&mut seq),
        Operation::Rti => stack::rti(&mut seq),
        Operation::Swi => stack::swi(&mut seq),
        Operation::Wai => {
            stack::wai(&mut seq);
            trailer = Trailer::Idle;
        }
        Operation::Illegal => {
            seq.exec(Exec::Trap);
            seq.internal(Addr::Pc);
        }
    }

    let micro_ops = seq.finish(trailer);
    Descriptor {
        opcode,
        mnemonic: operation.mnemonic(),
        operation,
        mode,
        access,
        cycles: cycle_count(&micro_ops),
        micro_ops,
    }
}

static TABLE: LazyLock<[Descriptor; 256]> =
    LazyLock::new(|| std::array::from_fn(|i| build(i as u8)));

/// The full opcode table, built on first use.
#[must_use]
pub fn opcode_table() -> &'static [Descriptor; 256] {
    &TABLE
}

/// The descriptor for one opcode.
#[must_use]
pub fn descriptor(opcode: u8) -> &'static Descriptor {
    &TABLE[usize::from(opcode)]
}
