//! Cycle-accurate Motorola MC6800 CPU emulator.
//!
//! Every opcode is decoded once into a fixed sequence of micro-ops, one per
//! bus cycle. Each `tick()` runs exactly one of them, so the address, data,
//! R/W and VMA pins match the real part cycle for cycle, including the
//! overlap of an instruction's last read with the next opcode fetch.

pub mod alu;
mod addressing;
mod cpu;
mod decode;
pub mod flags;
pub mod microcode;
mod pins;
mod registers;
mod stack;

pub use addressing::{Access, AddressingMode};
pub use cpu::{Config, Fault, IllegalOpcodePolicy, Mc6800};
pub use decode::{Descriptor, Operation, descriptor, fields, mode, opcode_table, operation};
pub use flags::Status;
pub use pins::Pins;
pub use registers::Registers;
pub use stack::{IRQ_VECTOR, NMI_VECTOR, RESET_VECTOR, SWI_VECTOR};
