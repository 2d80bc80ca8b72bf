//! Arithmetic and flag logic.
//!
//! Every function takes the condition code register and updates only the
//! flags the MC6800 programming reference lists for that instruction.
//! None of them touch the bus.

use std::ops::RangeInclusive;

use crate::Status;
use crate::flags::{C, H, V, Z};

/// Single-operand operations shared by the accumulator and memory forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Com,
    Lsr,
    Ror,
    Asr,
    Asl,
    Rol,
    Dec,
    Inc,
    Tst,
    Clr,
}

/// Two-operand accumulator operations (accumulator op memory).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Sub,
    Cmp,
    Sbc,
    And,
    Bit,
    Lda,
    Eor,
    Adc,
    Ora,
    Add,
}

/// 8-bit add. `carry_in` selects ADC (adds the current C flag).
///
/// Sets H, N, Z, V, C.
pub fn add(p: &mut Status, a: u8, b: u8, carry_in: bool) -> u8 {
    let carry = u16::from(carry_in && p.is_set(C));
    let sum = u16::from(a) + u16::from(b) + carry;
    let result = sum as u8;
    p.set_if(H, (a ^ b ^ result) & 0x10 != 0);
    p.set_if(V, !(a ^ b) & (a ^ result) & 0x80 != 0);
    p.set_if(C, sum > 0xFF);
    p.update_nz(result);
    result
}

/// 8-bit subtract. `carry_in` selects SBC (subtracts the current C flag).
///
/// Sets N, Z, V, C (C is the borrow). H is not affected.
pub fn sub(p: &mut Status, a: u8, b: u8, carry_in: bool) -> u8 {
    let borrow = u16::from(carry_in && p.is_set(C));
    let result = a.wrapping_sub(b).wrapping_sub(borrow as u8);
    p.set_if(V, (a ^ b) & (a ^ result) & 0x80 != 0);
    p.set_if(C, u16::from(b) + borrow > u16::from(a));
    p.update_nz(result);
    result
}

/// Compare: subtract without borrow-in, discarding the result.
pub fn cmp(p: &mut Status, a: u8, b: u8) {
    sub(p, a, b, false);
}

/// Logical result: N and Z from the value, V cleared, C untouched.
pub fn logic(p: &mut Status, value: u8) -> u8 {
    p.update_nz(value);
    p.clear(V);
    value
}

/// Shifts and rotates all define V as N xor C after the operation.
fn shift_flags(p: &mut Status, result: u8, carry: bool) -> u8 {
    p.set_if(C, carry);
    p.update_nz(result);
    p.set_if(V, p.is_set(crate::flags::N) != carry);
    result
}

pub fn lsr(p: &mut Status, v: u8) -> u8 {
    shift_flags(p, v >> 1, v & 0x01 != 0)
}

pub fn asr(p: &mut Status, v: u8) -> u8 {
    shift_flags(p, (v >> 1) | (v & 0x80), v & 0x01 != 0)
}

pub fn asl(p: &mut Status, v: u8) -> u8 {
    shift_flags(p, v << 1, v & 0x80 != 0)
}

pub fn ror(p: &mut Status, v: u8) -> u8 {
    let carry_in = if p.is_set(C) { 0x80 } else { 0 };
    shift_flags(p, (v >> 1) | carry_in, v & 0x01 != 0)
}

pub fn rol(p: &mut Status, v: u8) -> u8 {
    let carry_in = u8::from(p.is_set(C));
    shift_flags(p, (v << 1) | carry_in, v & 0x80 != 0)
}

/// Two's complement negate. V is set only for $80, C for any non-zero result.
pub fn neg(p: &mut Status, v: u8) -> u8 {
    let result = 0u8.wrapping_sub(v);
    p.set_if(V, result == 0x80);
    p.set_if(C, result != 0);
    p.update_nz(result);
    result
}

pub fn com(p: &mut Status, v: u8) -> u8 {
    let result = !v;
    p.clear(V);
    p.set(C);
    p.update_nz(result);
    result
}

/// Increment. V on $7F -> $80, C untouched.
pub fn inc(p: &mut Status, v: u8) -> u8 {
    let result = v.wrapping_add(1);
    p.set_if(V, v == 0x7F);
    p.update_nz(result);
    result
}

/// Decrement. V on $80 -> $7F, C untouched.
pub fn dec(p: &mut Status, v: u8) -> u8 {
    let result = v.wrapping_sub(1);
    p.set_if(V, v == 0x80);
    p.update_nz(result);
    result
}

pub fn tst(p: &mut Status, v: u8) -> u8 {
    p.update_nz(v);
    p.clear(V | C);
    v
}

pub fn clr(p: &mut Status) -> u8 {
    p.update_nz(0);
    p.clear(V | C);
    0
}

/// Apply a single-operand operation.
pub fn unary(p: &mut Status, op: UnaryOp, v: u8) -> u8 {
    match op {
        UnaryOp::Neg => neg(p, v),
        UnaryOp::Com => com(p, v),
        UnaryOp::Lsr => lsr(p, v),
        UnaryOp::Ror => ror(p, v),
        UnaryOp::Asr => asr(p, v),
        UnaryOp::Asl => asl(p, v),
        UnaryOp::Rol => rol(p, v),
        UnaryOp::Dec => dec(p, v),
        UnaryOp::Inc => inc(p, v),
        UnaryOp::Tst => tst(p, v),
        UnaryOp::Clr => clr(p),
    }
}

/// Apply a two-operand operation, returning the new accumulator value.
///
/// CMP and BIT only set flags and return the accumulator unchanged.
pub fn binary(p: &mut Status, op: BinaryOp, acc: u8, operand: u8) -> u8 {
    match op {
        BinaryOp::Sub => sub(p, acc, operand, false),
        BinaryOp::Sbc => sub(p, acc, operand, true),
        BinaryOp::Cmp => {
            cmp(p, acc, operand);
            acc
        }
        BinaryOp::And => logic(p, acc & operand),
        BinaryOp::Bit => {
            logic(p, acc & operand);
            acc
        }
        BinaryOp::Lda => logic(p, operand),
        BinaryOp::Eor => logic(p, acc ^ operand),
        BinaryOp::Ora => logic(p, acc | operand),
        BinaryOp::Add => add(p, acc, operand, false),
        BinaryOp::Adc => add(p, acc, operand, true),
    }
}

/// Load a 16-bit register (LDX/LDS) or report a 16-bit store (STX/STS).
pub fn word(p: &mut Status, value: u16) -> u16 {
    p.update_nz16(value);
    p.clear(V);
    value
}

/// CPX: compare IX with a 16-bit operand.
///
/// Z reflects the full 16-bit difference. N and V come from the subtraction
/// of the high bytes alone, as on the MC6800. C is not affected.
pub fn cpx(p: &mut Status, ix: u16, operand: u16) {
    let [ix_hi, _] = ix.to_be_bytes();
    let [m_hi, _] = operand.to_be_bytes();
    let hi = ix_hi.wrapping_sub(m_hi);
    p.set_if(Z, ix == operand);
    p.set_if(crate::flags::N, hi & 0x80 != 0);
    p.set_if(V, (ix_hi ^ m_hi) & (ix_hi ^ hi) & 0x80 != 0);
}

/// One row of the DAA correction matrix.
struct DaaRow {
    carry: bool,
    high: RangeInclusive<u8>,
    half: bool,
    low: RangeInclusive<u8>,
    correction: u8,
    carry_out: bool,
}

/// The MC6800 DAA truth table: carry in, upper nibble, half carry, lower
/// nibble -> correction added to A and resulting carry.
const DAA_TABLE: [DaaRow; 9] = [
    DaaRow { carry: false, high: 0x0..=0x9, half: false, low: 0x0..=0x9, correction: 0x00, carry_out: false },
    DaaRow { carry: false, high: 0x0..=0x8, half: false, low: 0xA..=0xF, correction: 0x06, carry_out: false },
    DaaRow { carry: false, high: 0x0..=0x9, half: true, low: 0x0..=0x3, correction: 0x06, carry_out: false },
    DaaRow { carry: false, high: 0xA..=0xF, half: false, low: 0x0..=0x9, correction: 0x60, carry_out: true },
    DaaRow { carry: false, high: 0x9..=0xF, half: false, low: 0xA..=0xF, correction: 0x66, carry_out: true },
    DaaRow { carry: false, high: 0xA..=0xF, half: true, low: 0x0..=0x3, correction: 0x66, carry_out: true },
    DaaRow { carry: true, high: 0x0..=0x2, half: false, low: 0x0..=0x9, correction: 0x60, carry_out: true },
    DaaRow { carry: true, high: 0x0..=0x2, half: false, low: 0xA..=0xF, correction: 0x66, carry_out: true },
    DaaRow { carry: true, high: 0x0..=0x3, half: true, low: 0x0..=0x3, correction: 0x66, carry_out: true },
];

/// Decimal adjust A after a BCD addition.
///
/// Inputs that cannot follow the addition of two valid BCD bytes are not
/// covered by the matrix; for those each nibble is corrected independently
/// (low nibble on H or > 9, high nibble on C or > 9).
/// V is cleared, C is set by the correction and never cleared.
pub fn daa(p: &mut Status, a: u8) -> u8 {
    let carry = p.is_set(C);
    let half = p.is_set(H);
    let (high, low) = (a >> 4, a & 0x0F);

    let row = DAA_TABLE.iter().find(|row| {
        row.carry == carry && row.half == half && row.high.contains(&high) && row.low.contains(&low)
    });
    let (correction, carry_out) = match row {
        Some(row) => (row.correction, row.carry_out),
        None => {
            let mut correction = 0;
            if half || low > 9 {
                correction |= 0x06;
            }
            let high_fix = carry || high > 9 || (high > 8 && low > 9);
            if high_fix {
                correction |= 0x60;
            }
            (correction, high_fix)
        }
    };

    let result = a.wrapping_add(correction);
    p.set_if(C, carry || carry_out);
    p.clear(V);
    p.update_nz(result);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::N;

    fn flags(p: Status) -> (bool, bool, bool, bool) {
        (p.is_set(N), p.is_set(Z), p.is_set(V), p.is_set(C))
    }

    #[test]
    fn add_signed_overflow() {
        let mut p = Status::new();
        let r = add(&mut p, 0x7F, 0x01, false);
        assert_eq!(r, 0x80);
        assert_eq!(flags(p), (true, false, true, false));
        assert!(p.is_set(H), "carry out of bit 3");
    }

    #[test]
    fn add_carry_out_and_zero() {
        let mut p = Status::new();
        let r = add(&mut p, 0xFF, 0x01, false);
        assert_eq!(r, 0x00);
        assert_eq!(flags(p), (false, true, false, true));
    }

    #[test]
    fn adc_uses_carry_only_when_asked() {
        let mut p = Status::from_byte(C);
        assert_eq!(add(&mut p, 0x10, 0x20, true), 0x31);
        let mut p = Status::from_byte(C);
        assert_eq!(add(&mut p, 0x10, 0x20, false), 0x30);
    }

    #[test]
    fn sub_borrow() {
        let mut p = Status::new();
        let r = sub(&mut p, 0x00, 0x01, false);
        assert_eq!(r, 0xFF);
        assert_eq!(flags(p), (true, false, false, true));
    }

    #[test]
    fn sub_signed_overflow() {
        let mut p = Status::new();
        let r = sub(&mut p, 0x80, 0x01, false);
        assert_eq!(r, 0x7F);
        assert_eq!(flags(p), (false, false, true, false));
    }

    #[test]
    fn sbc_borrows_from_carry() {
        let mut p = Status::from_byte(C);
        let r = sub(&mut p, 0x10, 0x10, true);
        assert_eq!(r, 0xFF);
        assert!(p.is_set(C));
    }

    #[test]
    fn sub_leaves_half_carry_alone() {
        let mut p = Status::from_byte(H);
        sub(&mut p, 0x10, 0x01, false);
        assert!(p.is_set(H));
    }

    #[test]
    fn cmp_equal_sets_zero_only() {
        let mut p = Status::new();
        cmp(&mut p, 0x42, 0x42);
        assert_eq!(flags(p), (false, true, false, false));
    }

    #[test]
    fn neg_of_0x80() {
        let mut p = Status::new();
        let r = neg(&mut p, 0x80);
        assert_eq!(r, 0x80);
        assert!(p.is_set(V));
        assert!(p.is_set(C));
        assert!(p.is_set(N));
    }

    #[test]
    fn neg_of_zero_clears_carry() {
        let mut p = Status::from_byte(C);
        assert_eq!(neg(&mut p, 0), 0);
        assert_eq!(flags(p), (false, true, false, false));
    }

    #[test]
    fn inc_and_dec_overflow_edges() {
        let mut p = Status::from_byte(C);
        assert_eq!(inc(&mut p, 0x7F), 0x80);
        assert!(p.is_set(V));
        assert!(p.is_set(C), "INC leaves C alone");

        let mut p = Status::new();
        assert_eq!(dec(&mut p, 0x80), 0x7F);
        assert!(p.is_set(V));
        assert_eq!(dec(&mut p, 0x01), 0x00);
        assert!(p.is_set(Z));
        assert!(!p.is_set(V));
    }

    #[test]
    fn com_sets_carry_clears_overflow() {
        let mut p = Status::from_byte(V);
        assert_eq!(com(&mut p, 0x0F), 0xF0);
        assert_eq!(flags(p), (true, false, false, true));
    }

    #[test]
    fn asl_overflow_is_sign_change() {
        let mut p = Status::new();
        assert_eq!(asl(&mut p, 0x40), 0x80);
        assert_eq!(flags(p), (true, false, true, false));

        let mut p = Status::new();
        assert_eq!(asl(&mut p, 0xC0), 0x80);
        assert_eq!(flags(p), (true, false, false, true));
    }

    #[test]
    fn rol_and_ror_rotate_through_carry() {
        let mut p = Status::from_byte(C);
        assert_eq!(rol(&mut p, 0x80), 0x01);
        assert!(p.is_set(C));
        assert!(p.is_set(V), "N=0, C=1");

        let mut p = Status::from_byte(C);
        assert_eq!(ror(&mut p, 0x01), 0x80);
        assert!(p.is_set(C));
        assert!(!p.is_set(V), "N=1, C=1");
    }

    #[test]
    fn lsr_clears_negative() {
        let mut p = Status::new();
        assert_eq!(lsr(&mut p, 0x01), 0x00);
        assert_eq!(flags(p), (false, true, true, true));
    }

    #[test]
    fn asr_keeps_sign() {
        let mut p = Status::new();
        assert_eq!(asr(&mut p, 0x81), 0xC0);
        assert_eq!(flags(p), (true, false, false, true));
    }

    #[test]
    fn logic_preserves_carry() {
        let mut p = Status::from_byte(C | V);
        assert_eq!(binary(&mut p, BinaryOp::And, 0xF0, 0x0F), 0x00);
        assert_eq!(flags(p), (false, true, false, true));
    }

    #[test]
    fn bit_and_cmp_leave_accumulator() {
        let mut p = Status::new();
        assert_eq!(binary(&mut p, BinaryOp::Bit, 0x80, 0x80), 0x80);
        assert!(p.is_set(N));
        assert_eq!(binary(&mut p, BinaryOp::Cmp, 0x10, 0x20), 0x10);
        assert!(p.is_set(C));
    }

    #[test]
    fn tst_and_clr_clear_carry_and_overflow() {
        let mut p = Status::from_byte(C | V);
        tst(&mut p, 0x80);
        assert_eq!(flags(p), (true, false, false, false));
        let mut p = Status::from_byte(C | V | N);
        assert_eq!(clr(&mut p), 0);
        assert_eq!(flags(p), (false, true, false, false));
    }

    #[test]
    fn daa_after_bcd_additions() {
        // (augend, addend, adjusted, carry)
        let cases = [
            (0x15, 0x27, 0x42, false),
            (0x09, 0x09, 0x18, false),
            (0x99, 0x01, 0x00, true),
            (0x50, 0x50, 0x00, true),
            (0x38, 0x45, 0x83, false),
            (0x99, 0x99, 0x98, true),
            (0x12, 0x34, 0x46, false),
        ];
        for (x, y, expected, carry) in cases {
            let mut p = Status::new();
            let sum = add(&mut p, x, y, false);
            let r = daa(&mut p, sum);
            assert_eq!(r, expected, "{x:02X} + {y:02X}");
            assert_eq!(p.is_set(C), carry, "{x:02X} + {y:02X} carry");
        }
    }

    #[test]
    fn daa_keeps_incoming_carry() {
        let mut p = Status::from_byte(C);
        assert_eq!(daa(&mut p, 0x00), 0x60);
        assert!(p.is_set(C));
    }

    #[test]
    fn cpx_flags_from_high_byte() {
        let mut p = Status::from_byte(C);
        cpx(&mut p, 0x1234, 0x1234);
        assert!(p.is_set(Z));
        assert!(p.is_set(C), "CPX leaves C alone");

        let mut p = Status::new();
        cpx(&mut p, 0x8000, 0x0100);
        assert!(!p.is_set(Z));
        assert!(!p.is_set(N));
        assert!(p.is_set(V), "$80 - $01 overflows");

        let mut p = Status::new();
        cpx(&mut p, 0x1200, 0x12FF);
        assert!(!p.is_set(Z));
        assert!(!p.is_set(N), "high bytes equal");
    }

    #[test]
    fn word_sets_nz16_and_clears_v() {
        let mut p = Status::from_byte(V);
        assert_eq!(word(&mut p, 0x8000), 0x8000);
        assert!(p.is_set(N));
        assert!(!p.is_set(V));
    }
}
