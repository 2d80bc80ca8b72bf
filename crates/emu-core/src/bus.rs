//! Memory bus interface.

/// A 16-bit address, 8-bit data memory bus.
///
/// The CPU calls into the bus only for cycles it marks as valid memory
/// accesses. Address decoding and routing to devices is the bus's job.
pub trait Bus {
    /// Read a byte from the given address.
    fn read(&mut self, address: u16) -> u8;

    /// Write a byte to the given address.
    fn write(&mut self, address: u16, value: u8);
}

/// Flat 64 KiB RAM with no devices mapped.
///
/// Enough to run CPU code in tests or in a bare host. Every address is
/// readable and writable.
pub struct SimpleBus {
    ram: Box<[u8; 0x1_0000]>,
}

impl Default for SimpleBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SimpleBus {
    #[must_use]
    pub fn new() -> Self {
        Self {
            ram: Box::new([0; 0x1_0000]),
        }
    }

    /// Copy `data` into RAM starting at `address`, wrapping at $FFFF.
    pub fn load(&mut self, address: u16, data: &[u8]) {
        let mut addr = address;
        for &byte in data {
            self.ram[addr as usize] = byte;
            addr = addr.wrapping_add(1);
        }
    }

    /// Read a byte without it counting as a bus access.
    #[must_use]
    pub fn peek(&self, address: u16) -> u8 {
        self.ram[address as usize]
    }

    /// Read a big-endian word without it counting as a bus access.
    #[must_use]
    pub fn peek16(&self, address: u16) -> u16 {
        u16::from_be_bytes([self.peek(address), self.peek(address.wrapping_add(1))])
    }
}

impl Bus for SimpleBus {
    fn read(&mut self, address: u16) -> u8 {
        self.ram[address as usize]
    }

    fn write(&mut self, address: u16, value: u8) {
        self.ram[address as usize] = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_wraps_at_top_of_memory() {
        let mut bus = SimpleBus::new();
        bus.load(0xFFFF, &[0x12, 0x34]);
        assert_eq!(bus.peek(0xFFFF), 0x12);
        assert_eq!(bus.peek(0x0000), 0x34);
    }

    #[test]
    fn peek16_is_big_endian() {
        let mut bus = SimpleBus::new();
        bus.write(0xFFFE, 0xC0);
        bus.write(0xFFFF, 0x00);
        assert_eq!(bus.peek16(0xFFFE), 0xC000);
    }
}
