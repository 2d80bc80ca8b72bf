//! CPU core trait.

use crate::Bus;

/// A CPU core driven one bus cycle at a time.
///
/// The bus is passed in rather than owned so other chips clocked by the same
/// driver can share it between CPU ticks.
pub trait Cpu {
    /// The type used for register inspection.
    type Registers;

    /// Advance the CPU by exactly one bus cycle.
    fn tick<B: Bus>(&mut self, bus: &mut B);

    /// Returns the current program counter.
    fn pc(&self) -> u16;

    /// Returns a snapshot of all registers for inspection.
    fn registers(&self) -> Self::Registers;

    /// Returns true if the CPU has stopped executing instructions.
    fn is_halted(&self) -> bool;

    /// Request a maskable interrupt. Returns true if it will be taken.
    fn interrupt(&mut self) -> bool;

    /// Request a non-maskable interrupt.
    fn nmi(&mut self);

    /// Start the reset sequence.
    fn reset(&mut self);
}
