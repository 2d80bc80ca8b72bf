//! MC6800 bus pins.
//!
//! The core exchanges one `Pins` value with the outside world per clock
//! cycle. Outputs describe the bus cycle the CPU wants this tick; inputs are
//! the data byte answered for the previous read cycle plus the control lines.
//!
//! Control inputs are modelled active-high (`true` = asserted) even though
//! the physical IRQ, NMI, HALT and RESET pins are active-low.

/// The pin state for one bus cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pins {
    /// A0-A15.
    pub address: u16,
    /// D0-D7. Driven by the CPU on writes, by memory on reads.
    pub data: u8,
    /// R/W: true for a read cycle, false for a write cycle.
    pub rw: bool,
    /// Valid memory address. Low on internal cycles; memory must ignore the
    /// address when VMA is low.
    pub vma: bool,
    /// Bus available. High while the CPU is halted or waiting for an
    /// interrupt.
    pub ba: bool,
    /// Maskable interrupt request (level).
    pub irq: bool,
    /// Non-maskable interrupt (edge).
    pub nmi: bool,
    /// Stop at the next instruction boundary and release the bus.
    pub halt: bool,
    /// Hold the CPU in reset.
    pub reset: bool,
}

impl Pins {
    /// A valid memory read this cycle.
    #[must_use]
    pub const fn is_read(&self) -> bool {
        self.vma && self.rw
    }

    /// A valid memory write this cycle.
    #[must_use]
    pub const fn is_write(&self) -> bool {
        self.vma && !self.rw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vma_low_is_neither_read_nor_write() {
        let pins = Pins {
            rw: true,
            vma: false,
            ..Pins::default()
        };
        assert!(!pins.is_read());
        assert!(!pins.is_write());
    }

    #[test]
    fn direction_follows_rw() {
        let mut pins = Pins {
            vma: true,
            rw: true,
            ..Pins::default()
        };
        assert!(pins.is_read());
        pins.rw = false;
        assert!(pins.is_write());
    }
}
