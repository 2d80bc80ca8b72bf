//! 6800 condition code register (P).
//!
//! Six flags in the low bits; the top two bits are not implemented in
//! silicon and always read as 1.

/// Carry/borrow out of bit 7.
pub const C: u8 = 0x01;

/// Two's complement overflow.
pub const V: u8 = 0x02;

/// Result was zero.
pub const Z: u8 = 0x04;

/// Result bit 7 (bit 15 for 16-bit results) set.
pub const N: u8 = 0x08;

/// Interrupt mask - when set, IRQ is ignored.
pub const I: u8 = 0x10;

/// Half carry out of bit 3, set by ADD/ADC/ABA and consumed by DAA.
pub const H: u8 = 0x20;

/// The two unimplemented bits, always 1.
pub const FIXED: u8 = 0xC0;

/// Condition code register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Status(pub u8);

impl Default for Status {
    fn default() -> Self {
        Self::new()
    }
}

impl Status {
    /// All flags clear, fixed bits set.
    #[must_use]
    pub const fn new() -> Self {
        Self(FIXED)
    }

    /// Create status from a raw byte, forcing the fixed bits to 1.
    #[must_use]
    pub const fn from_byte(value: u8) -> Self {
        Self(value | FIXED)
    }

    /// Raw value as pushed to the stack or transferred by TPA.
    #[must_use]
    pub const fn to_byte(self) -> u8 {
        self.0 | FIXED
    }

    #[must_use]
    pub const fn is_set(self, flag: u8) -> bool {
        self.0 & flag != 0
    }

    pub fn set(&mut self, flag: u8) {
        self.0 |= flag;
    }

    pub fn clear(&mut self, flag: u8) {
        self.0 &= !flag;
    }

    /// Set or clear a flag based on condition.
    pub fn set_if(&mut self, flag: u8, condition: bool) {
        if condition {
            self.set(flag);
        } else {
            self.clear(flag);
        }
    }

    /// Update N and Z from an 8-bit result.
    pub fn update_nz(&mut self, value: u8) {
        self.set_if(N, value & 0x80 != 0);
        self.set_if(Z, value == 0);
    }

    /// Update N and Z from a 16-bit result.
    pub fn update_nz16(&mut self, value: u16) {
        self.set_if(N, value & 0x8000 != 0);
        self.set_if(Z, value == 0);
    }

    /// N xor V, the signed "less than" condition.
    #[must_use]
    pub const fn lt(self) -> bool {
        self.is_set(N) != self.is_set(V)
    }
}
