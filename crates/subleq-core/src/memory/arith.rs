//! 24-bit two's-complement arithmetic.

/// Mask selecting the 24 architectural bits of a cell.
pub const WORD_MASK: i32 = 0x00FF_FFFF;

/// Sign bit of a 24-bit word.
pub const SIGN_BIT: i32 = 0x0080_0000;

/// Modulus of 24-bit arithmetic (`2^24`).
pub const WORD_MODULUS: i32 = 0x0100_0000;

/// Smallest representable 24-bit value.
pub const MIN_WORD: i32 = -SIGN_BIT;

/// Largest representable 24-bit value.
pub const MAX_WORD: i32 = SIGN_BIT - 1;

/// Reinterprets the low 24 bits of `value` as a signed two's-complement word.
#[must_use]
pub const fn to_signed24(value: i32) -> i32 {
    let word = value & WORD_MASK;
    if word & SIGN_BIT == 0 {
        word
    } else {
        word - WORD_MODULUS
    }
}

/// Computes `(x - y) mod 2^24` as a signed 24-bit value.
///
/// This is the only arithmetic the machine performs. Both boundaries wrap:
/// `0 - 1` yields `-1`, and `0x800000 - 0` yields `-0x800000`.
#[must_use]
pub const fn sub_wrapped(x: i32, y: i32) -> i32 {
    to_signed24(x.wrapping_sub(y))
}
