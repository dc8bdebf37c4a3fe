//! Error types for checksum accumulation.

/// Errors raised by [`CrcAccumulator`](crate::CrcAccumulator) writers.
///
/// These are programming errors: a correctly wired simulation layer never
/// feeds out-of-range values. They are reported rather than truncated
/// because silent truncation would itself cause cross-peer divergence.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CrcError {
    /// A value does not fit the writer's declared unsigned width.
    #[error("value {value} does not fit in an unsigned {width_bits}-bit field")]
    OutOfRange {
        /// Declared width of the writer, in bits.
        width_bits: u8,
        /// The rejected value.
        value: i64,
    },
    /// A string is longer than the 16-bit length prefix can describe.
    #[error("string of {length} bytes exceeds the 65535-byte length prefix")]
    LengthOverflow {
        /// Byte length of the rejected string.
        length: usize,
    },
    /// A numeric input is not an exact 32-bit signed integer or a finite real.
    #[error("invalid crc input: {detail}")]
    InvalidCrcInput {
        /// Description of the rejected value.
        detail: String,
    },
}
