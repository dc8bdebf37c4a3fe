//! Error types for chunk production and the resend plan codec.
//!
//! Parsing a received fragment never errors; see [`crate::chunk`].

/// Errors producing wrapper chunks or configuring reassembly.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ChunkError {
    /// The message does not fit the u32 length fields.
    #[error("message of {length} bytes exceeds the u32 length field")]
    MessageTooLarge {
        /// Offending length.
        length: usize,
    },
    /// A zero chunk size can never make progress.
    #[error("max_chunk_len must be at least 1")]
    ZeroChunkLength,
    /// A reassembler that may hold no messages can never complete one.
    #[error("max_pending_messages must be at least 1")]
    NoPendingCapacity,
}

/// Errors decoding an encoded resend plan.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PlanCodecError {
    /// The version byte is not one this build understands.
    #[error("unsupported plan format version {found}")]
    UnsupportedVersion {
        /// Version found in the buffer.
        found: u8,
    },
    /// The buffer ended inside a field.
    #[error("plan truncated while reading {field}")]
    Truncated {
        /// Field being read.
        field: &'static str,
    },
    /// A dedupe key is not valid UTF-8.
    #[error("dedupe key is not valid UTF-8")]
    InvalidDedupeKey,
    /// A presence flag held something other than 0 or 1.
    #[error("invalid presence flag {flag}")]
    InvalidFlag {
        /// Byte found.
        flag: u8,
    },
    /// Bytes remained after the last command.
    #[error("{count} trailing bytes after plan")]
    TrailingBytes {
        /// Number of unread bytes.
        count: usize,
    },
    /// A field does not fit its u32 length prefix.
    #[error("{field} of {length} bytes exceeds the u32 length field")]
    TooLarge {
        /// Field being written.
        field: &'static str,
        /// Offending length.
        length: usize,
    },
}
