//! MC6800 CPU implementation.
//!
//! Cycle-accurate emulation where each tick is exactly one bus cycle. The
//! opcode table supplies a micro-op sequence per instruction; the scheduler
//! walks it one step per tick. The last step of every sequence fetches the
//! next opcode, which is decoded at the start of the following tick.

use std::fmt;

use emu_core::{Bus, Cpu, Observable, Ticks, Value};
use log::{debug, trace, warn};

use crate::alu;
use crate::decode::descriptor;
use crate::flags::{C, H, I, N, V, Z};
use crate::microcode::{
    Acc, Addr, BusOp, Dest, Exec, Inherent, Latch, MicroOp, Reg16, Source, WordOp,
};
use crate::pins::Pins;
use crate::stack::sequences;
use crate::{Registers, Status};

/// What to do when an undefined opcode is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IllegalOpcodePolicy {
    /// Record the fault and stop until reset.
    #[default]
    Halt,
    /// Record the fault and carry on as a 2-cycle no-op.
    Nop,
}

/// CPU configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    pub illegal_opcode: IllegalOpcodePolicy,
}

/// Conditions reported by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// An opcode the MC6800 does not define. `address` is where it was
    /// fetched from.
    IllegalOpcode { opcode: u8, address: u16 },
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fault::IllegalOpcode { opcode, address } => {
                write!(f, "illegal opcode ${opcode:02X} at ${address:04X}")
            }
        }
    }
}

impl std::error::Error for Fault {}

/// Internal state tracking instruction execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Walking a micro-op sequence.
    Execute,
    /// An opcode was fetched last cycle and is decoded this cycle.
    Decode,
    /// WAI finished stacking; idle until NMI or an unmasked IRQ.
    Waiting,
    /// HALT was asserted at an instruction boundary; the next fetch is held.
    Paused,
    /// Stopped by an illegal opcode until reset.
    Stopped,
}

/// The Motorola MC6800 CPU.
///
/// Drive it either with [`Mc6800::tick_pins`], servicing the bus yourself
/// between calls, or through [`Cpu::tick`] with an [`emu_core::Bus`].
#[derive(Debug, Clone)]
pub struct Mc6800 {
    /// CPU registers.
    pub regs: Registers,

    config: Config,

    /// Current execution state.
    state: State,

    /// Sequence being executed.
    sequence: &'static [MicroOp],

    /// Index of the next step in `sequence`.
    step: usize,

    /// Current opcode.
    ir: u8,

    /// Effective address.
    ad: u16,

    /// 16-bit operand being assembled.
    word: u16,

    /// Read-modify-write result awaiting write-back.
    result: u8,

    /// Pin state after the last tick (inputs as supplied, outputs as driven).
    pins: Pins,

    /// NMI edge detector.
    nmi_line: bool,
    nmi_pending: bool,

    /// RESET edge detector, for logging.
    reset_line: bool,

    /// IRQ requested through the `Cpu` trait, held until taken.
    irq_request: bool,

    fault: Option<Fault>,

    /// Total cycles executed.
    cycles: Ticks,
}

impl Default for Mc6800 {
    fn default() -> Self {
        Self::new()
    }
}

impl Mc6800 {
    /// Create a CPU that fetches its first opcode at the current PC.
    ///
    /// Set `regs.pc` before the first tick, or call [`Cpu::reset`] to go
    /// through the reset vector instead.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    #[must_use]
    pub fn with_config(config: Config) -> Self {
        Self {
            regs: Registers::new(),
            config,
            state: State::Execute,
            sequence: &sequences().boot,
            step: 0,
            ir: 0,
            ad: 0,
            word: 0,
            result: 0,
            pins: Pins::default(),
            nmi_line: false,
            nmi_pending: false,
            reset_line: false,
            irq_request: false,
            fault: None,
            cycles: Ticks::ZERO,
        }
    }

    #[must_use]
    pub fn config(&self) -> Config {
        self.config
    }

    /// Pin state as of the last tick.
    #[must_use]
    pub fn pins(&self) -> Pins {
        self.pins
    }

    /// Control inputs (IRQ, NMI, HALT, RESET) used by [`Cpu::tick`].
    pub fn pins_mut(&mut self) -> &mut Pins {
        &mut self.pins
    }

    /// The opcode currently executing.
    #[must_use]
    pub fn opcode(&self) -> u8 {
        self.ir
    }

    /// Total cycles since creation.
    #[must_use]
    pub fn cycles(&self) -> Ticks {
        self.cycles
    }

    /// True when the last cycle fetched an opcode.
    #[must_use]
    pub fn is_instruction_complete(&self) -> bool {
        self.state == State::Decode
    }

    /// True while idling after WAI.
    #[must_use]
    pub fn is_waiting(&self) -> bool {
        self.state == State::Waiting
    }

    /// The most recent fault, if any.
    #[must_use]
    pub fn fault(&self) -> Option<Fault> {
        self.fault
    }

    /// Take and clear the recorded fault.
    pub fn take_fault(&mut self) -> Option<Fault> {
        self.fault.take()
    }

    /// Advance one bus cycle.
    ///
    /// `pins.data` must hold the byte read on the previous cycle (if it was a
    /// read); the control inputs are sampled here. The returned pins describe
    /// this cycle's bus access.
    pub fn tick_pins(&mut self, pins: Pins) -> Pins {
        self.cycles = self.cycles.next();
        self.pins = pins;
        let data = pins.data;

        if pins.nmi && !self.nmi_line {
            self.nmi_pending = true;
        }
        self.nmi_line = pins.nmi;

        if pins.reset {
            if !self.reset_line {
                debug!("6800 RESET asserted at ${:04X}", self.regs.pc);
            }
            self.reset_line = true;
            self.begin_reset();
            return self.idle(false);
        }
        self.reset_line = false;

        match self.state {
            State::Execute => {}
            State::Decode => self.decode(data),
            State::Waiting => {
                if !self.wake() {
                    return self.idle(true);
                }
            }
            State::Paused => {
                if pins.halt {
                    return self.idle(true);
                }
                self.state = State::Execute;
                return self.drive(BusOp::Fetch);
            }
            State::Stopped => return self.idle(false),
        }

        let op = match self.sequence.get(self.step) {
            Some(&op) => op,
            None => {
                // Ran off the end without a fetch: resynchronise at PC.
                self.begin(&sequences().boot);
                MicroOp::FETCH
            }
        };
        self.step += 1;
        self.run(op, data)
    }

    /// Decode the opcode fetched last cycle, or divert into an interrupt.
    fn decode(&mut self, opcode: u8) {
        self.ir = opcode;
        if self.nmi_pending {
            self.nmi_pending = false;
            debug!("6800 NMI at ${:04X}", self.regs.pc);
            self.begin(&sequences().nmi);
        } else if self.irq_asserted() && !self.regs.p.is_set(I) {
            self.irq_request = false;
            debug!("6800 IRQ at ${:04X}", self.regs.pc);
            self.begin(&sequences().irq);
        } else {
            self.regs.pc = self.regs.pc.wrapping_add(1);
            self.begin(&descriptor(opcode).micro_ops);
        }
    }

    /// Leave the WAI state if an interrupt is pending. State is already on
    /// the stack, so only the vector is loaded.
    fn wake(&mut self) -> bool {
        if self.nmi_pending {
            self.nmi_pending = false;
            debug!("6800 NMI ends WAI");
            self.begin(&sequences().wake_nmi);
            true
        } else if self.irq_asserted() && !self.regs.p.is_set(I) {
            self.irq_request = false;
            debug!("6800 IRQ ends WAI");
            self.begin(&sequences().wake_irq);
            true
        } else {
            false
        }
    }

    fn irq_asserted(&self) -> bool {
        self.pins.irq || self.irq_request
    }

    fn begin(&mut self, sequence: &'static [MicroOp]) {
        self.sequence = sequence;
        self.step = 0;
        self.state = State::Execute;
    }

    /// Reset keeps A, B, IX and SP; the sequence masks interrupts and loads
    /// PC from the reset vector.
    fn begin_reset(&mut self) {
        self.begin(&sequences().reset);
        self.regs.p.set(I);
        self.fault = None;
        self.nmi_pending = false;
        self.irq_request = false;
    }

    /// Run one step: latch, exec, then bus.
    fn run(&mut self, op: MicroOp, data: u8) -> Pins {
        self.latch(op.latch, data);
        self.execute(op.exec, data);

        if op.is_fetch() && self.pins.halt && self.state == State::Execute {
            trace!("6800 HALT at ${:04X}", self.regs.pc);
            self.state = State::Paused;
            return self.idle(true);
        }
        self.drive(op.bus)
    }

    fn latch(&mut self, latch: Latch, data: u8) {
        match latch {
            Latch::None => {}
            Latch::Direct => self.ad = u16::from(data),
            Latch::High => self.ad = u16::from(data) << 8,
            Latch::Low => self.ad |= u16::from(data),
            Latch::Indexed => self.ad = self.regs.ix.wrapping_add(u16::from(data)),
            Latch::Relative => {
                self.ad = self.regs.pc.wrapping_add(data as i8 as u16);
            }
        }
    }

    fn execute(&mut self, exec: Exec, data: u8) {
        match exec {
            Exec::None => {}
            Exec::Inherent(op) => self.inherent(op),
            Exec::Unary(op, acc) => {
                let value = self.acc(acc);
                let value = alu::unary(&mut self.regs.p, op, value);
                self.set_acc(acc, value);
            }
            Exec::UnaryMem(op) => self.result = alu::unary(&mut self.regs.p, op, data),
            Exec::Binary(op, acc) => {
                let value = self.acc(acc);
                let value = alu::binary(&mut self.regs.p, op, value, data);
                self.set_acc(acc, value);
            }
            Exec::Store(acc) => {
                let value = self.acc(acc);
                alu::logic(&mut self.regs.p, value);
            }
            Exec::StoreWord(reg) => {
                let value = match reg {
                    Reg16::Ix => self.regs.ix,
                    Reg16::Sp => self.regs.sp,
                };
                alu::word(&mut self.regs.p, value);
            }
            Exec::WordHigh => self.word = u16::from(data) << 8,
            Exec::Word(op) => {
                let value = self.word | u16::from(data);
                match op {
                    WordOp::Cpx => alu::cpx(&mut self.regs.p, self.regs.ix, value),
                    WordOp::Lds => self.regs.sp = alu::word(&mut self.regs.p, value),
                    WordOp::Ldx => self.regs.ix = alu::word(&mut self.regs.p, value),
                }
            }
            Exec::Load(dest) => self.load(dest, data),
            Exec::Branch(cond) => {
                if cond.test(self.regs.p) {
                    self.regs.pc = self.ad;
                }
            }
            Exec::Jump => self.regs.pc = self.ad,
            Exec::SetI => self.regs.p.set(I),
            Exec::Wait => self.state = State::Waiting,
            Exec::Trap => self.trap(),
        }
    }

    fn inherent(&mut self, op: Inherent) {
        let regs = &mut self.regs;
        match op {
            Inherent::Nop => {}
            Inherent::Tap => regs.p = Status::from_byte(regs.a),
            Inherent::Tpa => regs.a = regs.p.to_byte(),
            Inherent::Inx => {
                regs.ix = regs.ix.wrapping_add(1);
                regs.p.set_if(Z, regs.ix == 0);
            }
            Inherent::Dex => {
                regs.ix = regs.ix.wrapping_sub(1);
                regs.p.set_if(Z, regs.ix == 0);
            }
            Inherent::Clv => regs.p.clear(V),
            Inherent::Sev => regs.p.set(V),
            Inherent::Clc => regs.p.clear(C),
            Inherent::Sec => regs.p.set(C),
            Inherent::Cli => regs.p.clear(I),
            Inherent::Sei => regs.p.set(I),
            Inherent::Sba => regs.a = alu::sub(&mut regs.p, regs.a, regs.b, false),
            Inherent::Cba => alu::cmp(&mut regs.p, regs.a, regs.b),
            Inherent::Tab => regs.b = alu::logic(&mut regs.p, regs.a),
            Inherent::Tba => regs.a = alu::logic(&mut regs.p, regs.b),
            Inherent::Daa => regs.a = alu::daa(&mut regs.p, regs.a),
            Inherent::Aba => regs.a = alu::add(&mut regs.p, regs.a, regs.b, false),
            Inherent::Tsx => regs.ix = regs.sp.wrapping_add(1),
            Inherent::Ins => regs.sp = regs.sp.wrapping_add(1),
            Inherent::Des => regs.sp = regs.sp.wrapping_sub(1),
            Inherent::Txs => regs.sp = regs.ix.wrapping_sub(1),
        }
    }

    fn trap(&mut self) {
        let fault = Fault::IllegalOpcode {
            opcode: self.ir,
            address: self.regs.pc.wrapping_sub(1),
        };
        warn!("6800 {fault}");
        self.fault = Some(fault);
        if self.config.illegal_opcode == IllegalOpcodePolicy::Halt {
            self.state = State::Stopped;
        }
    }

    fn acc(&self, acc: Acc) -> u8 {
        match acc {
            Acc::A => self.regs.a,
            Acc::B => self.regs.b,
        }
    }

    fn set_acc(&mut self, acc: Acc, value: u8) {
        match acc {
            Acc::A => self.regs.a = value,
            Acc::B => self.regs.b = value,
        }
    }

    fn load(&mut self, dest: Dest, data: u8) {
        let regs = &mut self.regs;
        match dest {
            Dest::A => regs.a = data,
            Dest::B => regs.b = data,
            Dest::P => regs.p = Status::from_byte(data),
            Dest::IxHi => regs.ix = (regs.ix & 0x00FF) | (u16::from(data) << 8),
            Dest::IxLo => regs.ix = (regs.ix & 0xFF00) | u16::from(data),
            Dest::PcHi => regs.pc = (regs.pc & 0x00FF) | (u16::from(data) << 8),
            Dest::PcLo => regs.pc = (regs.pc & 0xFF00) | u16::from(data),
        }
    }

    fn source(&self, source: Source) -> u8 {
        let regs = &self.regs;
        match source {
            Source::A => regs.a,
            Source::B => regs.b,
            Source::P => regs.p.to_byte(),
            Source::PcLo => regs.pc as u8,
            Source::PcHi => (regs.pc >> 8) as u8,
            Source::IxLo => regs.ix as u8,
            Source::IxHi => (regs.ix >> 8) as u8,
            Source::SpLo => regs.sp as u8,
            Source::SpHi => (regs.sp >> 8) as u8,
            Source::Result => self.result,
        }
    }

    /// Resolve a step address, applying PC/SP side effects.
    fn address(&mut self, addr: Addr) -> u16 {
        match addr {
            Addr::Pc => self.regs.pc,
            Addr::PcInc => {
                let pc = self.regs.pc;
                self.regs.pc = pc.wrapping_add(1);
                pc
            }
            Addr::Ad => self.ad,
            Addr::AdNext => self.ad.wrapping_add(1),
            Addr::Sp => self.regs.sp,
            Addr::Push => self.regs.push(),
            Addr::Pull => self.regs.pull(),
            Addr::Vector(vector) => vector,
        }
    }

    /// Put this step's bus cycle on the pins.
    fn drive(&mut self, bus: BusOp) -> Pins {
        self.pins.ba = false;
        match bus {
            BusOp::Read(addr) => {
                let address = self.address(addr);
                self.pins.address = address;
                self.pins.rw = true;
                self.pins.vma = true;
            }
            BusOp::Write(addr, source) => {
                let address = self.address(addr);
                let value = self.source(source);
                self.pins.address = address;
                self.pins.data = value;
                self.pins.rw = false;
                self.pins.vma = true;
            }
            BusOp::Internal(addr) => {
                let address = self.address(addr);
                self.pins.address = address;
                self.pins.rw = true;
                self.pins.vma = false;
            }
            BusOp::Fetch => {
                self.pins.address = self.regs.pc;
                self.pins.rw = true;
                self.pins.vma = true;
                self.state = State::Decode;
            }
        }
        self.pins
    }

    /// A cycle with no memory access. `ba` signals the bus is released.
    fn idle(&mut self, ba: bool) -> Pins {
        self.pins.address = self.regs.pc;
        self.pins.rw = true;
        self.pins.vma = false;
        self.pins.ba = ba;
        self.pins
    }
}

impl Cpu for Mc6800 {
    type Registers = Registers;

    fn tick<B: Bus>(&mut self, bus: &mut B) {
        let mut pins = self.tick_pins(self.pins);
        if pins.vma {
            if pins.rw {
                pins.data = bus.read(pins.address);
            } else {
                bus.write(pins.address, pins.data);
            }
        }
        self.pins = pins;
    }

    fn pc(&self) -> u16 {
        self.regs.pc
    }

    fn registers(&self) -> Self::Registers {
        self.regs
    }

    fn is_halted(&self) -> bool {
        matches!(self.state, State::Stopped | State::Paused)
    }

    fn interrupt(&mut self) -> bool {
        if self.regs.p.is_set(I) {
            false
        } else {
            self.irq_request = true;
            true
        }
    }

    fn nmi(&mut self) {
        self.nmi_pending = true;
    }

    fn reset(&mut self) {
        debug!("6800 reset at ${:04X}", self.regs.pc);
        self.begin_reset();
    }
}

impl Observable for Mc6800 {
    fn query(&self, path: &str) -> Option<Value> {
        let p = self.regs.p;
        match path {
            "pc" => Some(self.regs.pc.into()),
            "a" => Some(self.regs.a.into()),
            "b" => Some(self.regs.b.into()),
            "ix" | "x" => Some(self.regs.ix.into()),
            "sp" | "s" => Some(self.regs.sp.into()),
            "p" | "ccr" => Some(p.to_byte().into()),
            "flags.c" | "c" => Some(p.is_set(C).into()),
            "flags.v" | "v" => Some(p.is_set(V).into()),
            "flags.z" | "z" => Some(p.is_set(Z).into()),
            "flags.n" | "n" => Some(p.is_set(N).into()),
            "flags.i" | "i" => Some(p.is_set(I).into()),
            "flags.h" | "h" => Some(p.is_set(H).into()),
            "opcode" => Some(self.ir.into()),
            "mnemonic" => Some(descriptor(self.ir).mnemonic.into()),
            "step" => Some(Value::U64(self.step as u64)),
            "cycle" => Some(self.cycles.get().into()),
            "halted" => Some(self.is_halted().into()),
            "waiting" => Some(self.is_waiting().into()),
            "fault" => Some(self.fault.map(|f| f.to_string()).into()),
            "pins.address" => Some(self.pins.address.into()),
            "pins.data" => Some(self.pins.data.into()),
            "pins.rw" => Some(self.pins.rw.into()),
            "pins.vma" => Some(self.pins.vma.into()),
            "pins.ba" => Some(self.pins.ba.into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "pc",
            "a",
            "b",
            "ix",
            "sp",
            "p",
            "flags.c",
            "flags.v",
            "flags.z",
            "flags.n",
            "flags.i",
            "flags.h",
            "opcode",
            "mnemonic",
            "step",
            "cycle",
            "halted",
            "waiting",
            "fault",
            "pins.address",
            "pins.data",
            "pins.rw",
            "pins.vma",
            "pins.ba",
        ]
    }
}
