//! Error types for the state kernel.

use tandem_crc::CrcError;

use crate::hashing::CrcSection;

/// Programming errors raised by [`StateKernel`](crate::StateKernel).
///
/// None of these describe divergence between peers; mismatches are
/// delivered through listeners. A correctly wired simulation never sees
/// these at runtime.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum KernelError {
    /// Every id in `[MIN_OBJECT_ID, MAX_OBJECT_ID]` has been handed out.
    #[error("object id space exhausted (next id {next})")]
    IdSpaceExhausted {
        /// The id the allocator would have returned.
        next: u32,
    },
    /// An optional CRC section was requested but no writer is installed.
    #[error("no section writer installed for {section}")]
    MissingSectionWriter {
        /// The section that could not be written.
        section: CrcSection,
    },
    /// A section writer rejected its input.
    #[error("section {section} failed: {source}")]
    SectionFailed {
        /// The section being written.
        section: CrcSection,
        /// The accumulator error.
        #[source]
        source: CrcError,
    },
}
