//! The rotate-and-add accumulator.
//!
//! # Algorithm
//!
//! The accumulator holds one `u32`, initially zero. Every writer call is
//! one *block*; blocks never share bytes with each other.
//!
//! 1. The block is consumed four bytes at a time as little-endian words.
//! 2. Each word is byte-swapped to big-endian and folded:
//!    `carry = state >> 31; state = (state << 1) + swapped + carry`,
//!    all wrapping.
//! 3. A trailing group of 1..=3 bytes is assembled little-endian into a
//!    word, byte-swapped once, and then folded through step 2, which swaps
//!    it a second time. Tail bytes therefore reach the accumulator in
//!    their original order while full words arrive reversed.
//! 4. [`crc()`](CrcAccumulator::crc) swaps the accumulator once more.
//!
//! The double swap in step 3 is what the reference peers do. Folding the
//! tail without the pre-swap produces a self-consistent checksum that
//! never matches theirs.

use crate::error::CrcError;

/// Order-sensitive checksum over primitive values.
///
/// # Examples
///
/// ```
/// use tandem_crc::CrcAccumulator;
///
/// let mut crc = CrcAccumulator::new();
/// crc.write_u32(0x0102_0304);
/// assert_eq!(crc.crc(), 0x0102_0304);
///
/// crc.add_unsigned_byte(0xFF).unwrap();
/// assert_eq!(crc.crc(), 0x0105_0608);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CrcAccumulator {
    state: u32,
}

impl CrcAccumulator {
    /// Create an accumulator in its initial (zero) state.
    pub fn new() -> Self {
        Self { state: 0 }
    }

    /// The published checksum: the accumulator, byte-swapped.
    pub fn crc(&self) -> u32 {
        self.state.swap_bytes()
    }

    /// The internal accumulator before the final swap.
    pub fn raw_state(&self) -> u32 {
        self.state
    }

    /// Return to the initial state.
    pub fn reset(&mut self) {
        self.state = 0;
    }

    #[inline]
    fn fold(&mut self, word: u32) {
        let swapped = word.swap_bytes();
        let carry = self.state >> 31;
        self.state = (self.state << 1).wrapping_add(swapped).wrapping_add(carry);
    }

    /// Fold one block of raw bytes.
    pub fn add_bytes(&mut self, data: &[u8]) {
        let mut words = data.chunks_exact(4);
        for w in &mut words {
            self.fold(u32::from_le_bytes([w[0], w[1], w[2], w[3]]));
        }

        let tail = words.remainder();
        if !tail.is_empty() {
            let mut word = 0u32;
            for (i, &b) in tail.iter().enumerate() {
                word |= u32::from(b) << (8 * i);
            }
            // Pre-swap; fold() swaps back.
            self.fold(word.swap_bytes());
        }
    }

    /// Fold one byte.
    pub fn write_u8(&mut self, v: u8) {
        self.add_bytes(&[v]);
    }

    /// Fold a 16-bit value as two little-endian bytes.
    pub fn write_u16(&mut self, v: u16) {
        self.add_bytes(&v.to_le_bytes());
    }

    /// Fold a 32-bit value as four little-endian bytes.
    pub fn write_u32(&mut self, v: u32) {
        self.add_bytes(&v.to_le_bytes());
    }

    /// Checked byte writer. Fails with [`CrcError::OutOfRange`] outside `0..=255`.
    pub fn add_unsigned_byte(&mut self, value: i64) -> Result<(), CrcError> {
        let v = u8::try_from(value).map_err(|_| CrcError::OutOfRange {
            width_bits: 8,
            value,
        })?;
        self.write_u8(v);
        Ok(())
    }

    /// Checked 16-bit writer. Fails with [`CrcError::OutOfRange`] outside `0..=65535`.
    pub fn add_unsigned_short(&mut self, value: i64) -> Result<(), CrcError> {
        let v = u16::try_from(value).map_err(|_| CrcError::OutOfRange {
            width_bits: 16,
            value,
        })?;
        self.write_u16(v);
        Ok(())
    }

    /// Checked 32-bit writer. Fails with [`CrcError::OutOfRange`] outside `0..=u32::MAX`.
    pub fn add_unsigned_int(&mut self, value: i64) -> Result<(), CrcError> {
        let v = u32::try_from(value).map_err(|_| CrcError::OutOfRange {
            width_bits: 32,
            value,
        })?;
        self.write_u32(v);
        Ok(())
    }

    /// Fold a boolean as a single byte (`0` or `1`).
    pub fn add_bool(&mut self, v: bool) {
        self.write_u8(u8::from(v));
    }

    /// Fold a signed integer as four little-endian bytes.
    ///
    /// Fails with [`CrcError::InvalidCrcInput`] unless `value` is an exact
    /// 32-bit signed integer.
    pub fn add_int(&mut self, value: i64) -> Result<(), CrcError> {
        let v = i32::try_from(value).map_err(|_| CrcError::InvalidCrcInput {
            detail: format!("{value} is not a 32-bit signed integer"),
        })?;
        self.add_bytes(&v.to_le_bytes());
        Ok(())
    }

    /// Fold a real as the bit pattern of its 32-bit float representation.
    ///
    /// Fails with [`CrcError::InvalidCrcInput`] for NaN, infinities, and
    /// values that overflow `f32`.
    pub fn add_real(&mut self, value: f64) -> Result<(), CrcError> {
        let narrowed = value as f32;
        if !value.is_finite() || !narrowed.is_finite() {
            return Err(CrcError::InvalidCrcInput {
                detail: format!("{value} is not a finite 32-bit real"),
            });
        }
        self.write_u32(narrowed.to_bits());
        Ok(())
    }

    /// Fold a length-prefixed string, one byte per character.
    ///
    /// The prefix is a 16-bit character count written as its own block,
    /// followed by the characters as a second block. Each character is
    /// truncated to its low eight bits; this matches the legacy peers and
    /// is not an encoding choice.
    pub fn add_ascii_string(&mut self, s: &str) -> Result<(), CrcError> {
        let bytes: Vec<u8> = s.chars().map(|c| (u32::from(c) & 0xFF) as u8).collect();
        let len = u16::try_from(bytes.len()).map_err(|_| CrcError::LengthOverflow {
            length: bytes.len(),
        })?;
        self.write_u16(len);
        self.add_bytes(&bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_accumulator_is_zero() {
        let crc = CrcAccumulator::new();
        assert_eq!(crc.crc(), 0);
        assert_eq!(crc.raw_state(), 0);
    }

    #[test]
    fn full_word_is_swapped_then_unswapped_on_publish() {
        let mut crc = CrcAccumulator::new();
        crc.write_u32(0x0102_0304);
        assert_eq!(crc.raw_state(), 0x0403_0201);
        assert_eq!(crc.crc(), 0x0102_0304);
    }

    #[test]
    fn tail_bytes_reach_state_in_source_order() {
        let mut crc = CrcAccumulator::new();
        crc.add_bytes(&[1, 2, 3]);
        assert_eq!(crc.raw_state(), 0x0003_0201);
        assert_eq!(crc.crc(), 0x0102_0300);
    }

    #[test]
    fn high_bit_carries_into_low_bit() {
        let mut crc = CrcAccumulator::new();
        crc.write_u32(0x0000_0080);
        assert_eq!(crc.raw_state(), 0x8000_0000);
        crc.write_u32(0);
        assert_eq!(crc.raw_state(), 1);
    }

    #[test]
    fn checked_writers_reject_out_of_range() {
        let mut crc = CrcAccumulator::new();
        assert_eq!(
            crc.add_unsigned_byte(256),
            Err(CrcError::OutOfRange {
                width_bits: 8,
                value: 256
            })
        );
        assert!(crc.add_unsigned_byte(-1).is_err());
        assert!(crc.add_unsigned_short(65_536).is_err());
        assert!(crc.add_unsigned_int(1 << 32).is_err());
        assert!(crc.add_unsigned_int(-5).is_err());
        // Rejected writes leave the state untouched.
        assert_eq!(crc.raw_state(), 0);
    }

    #[test]
    fn add_int_rejects_values_outside_i32() {
        let mut crc = CrcAccumulator::new();
        assert!(crc.add_int(i64::from(i32::MAX) + 1).is_err());
        assert!(crc.add_int(i64::from(i32::MIN) - 1).is_err());
        crc.add_int(-1).unwrap();
        assert_eq!(crc.raw_state(), 0xFFFF_FFFF);
    }

    #[test]
    fn add_real_rejects_non_finite() {
        let mut crc = CrcAccumulator::new();
        assert!(matches!(
            crc.add_real(f64::NAN),
            Err(CrcError::InvalidCrcInput { .. })
        ));
        assert!(crc.add_real(f64::INFINITY).is_err());
        assert!(crc.add_real(1e300).is_err());
        crc.add_real(1.0).unwrap();
        assert_eq!(crc.crc(), 1.0f32.to_bits());
    }

    #[test]
    fn ascii_string_truncates_wide_characters() {
        let mut crc = CrcAccumulator::new();
        // U+0100 truncates to 0x00.
        crc.add_ascii_string("\u{0100}").unwrap();
        assert_eq!(crc.raw_state(), 2);
    }

    #[test]
    fn ascii_string_length_overflow() {
        let mut crc = CrcAccumulator::new();
        let long = "a".repeat(65_536);
        assert_eq!(
            crc.add_ascii_string(&long),
            Err(CrcError::LengthOverflow { length: 65_536 })
        );
        let max = "a".repeat(65_535);
        assert!(crc.add_ascii_string(&max).is_ok());
    }

    #[test]
    fn reset_returns_to_zero() {
        let mut crc = CrcAccumulator::new();
        crc.write_u32(77);
        crc.reset();
        assert_eq!(crc, CrcAccumulator::new());
    }
}
