//! Tandem: the determinism and recovery core of a lockstep peer.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Tandem sub-crates. For most users, adding `tandem` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use tandem::prelude::*;
//!
//! let mut kernel = StateKernel::default();
//! let mut archive = FrameResendArchive::default();
//!
//! kernel.enqueue_command(DeterministicCommand::new(1, 0, 0));
//! for cmd in kernel.drain_commands() {
//!     archive.record_synchronized_command(cmd.player_id, kernel.frame(), cmd);
//! }
//! archive.set_frame_command_count(0, kernel.frame(), 1);
//!
//! // Peer 2 missed frame 0: rebuild it, frame it, and send it.
//! let plan = archive.build_resend_plan(2, 0, 1, &[0]);
//! let bytes = encode_resend_plan(&plan).unwrap();
//! let chunks = split_into_chunks(1, &bytes, 512).unwrap();
//!
//! let mut reassembler = ChunkReassembler::default();
//! let mut received = None;
//! for chunk in &chunks {
//!     let parsed = parse_wrapper_chunk(&encode_wrapper_chunk(chunk)).unwrap();
//!     received = reassembler.accept(0, parsed);
//! }
//! assert_eq!(decode_resend_plan(&received.unwrap()).unwrap(), plan);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `tandem-core` | Ids, commands, snapshots |
//! | [`crc`] | `tandem-crc` | Legacy order-sensitive checksum accumulator |
//! | [`kernel`] | `tandem-kernel` | State kernel, hashing, consensus, mismatch events |
//! | [`resend`] | `tandem-resend` | Frame archive and resend planning |
//! | [`wire`] | `tandem-wire` | Wrapper chunks, reassembly, plan codec |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Identifiers, commands, and frame snapshots (`tandem-core`).
pub use tandem_core as types;

/// Checksum accumulator (`tandem-crc`).
///
/// [`crc::CrcAccumulator`] is what GameLogic CRC section writers fold
/// simulation state into.
pub use tandem_crc as crc;

/// Deterministic state kernel (`tandem-kernel`).
///
/// [`kernel::StateKernel`] owns the frame counter, object ids, and the
/// command queue, and detects divergence between peers.
pub use tandem_kernel as kernel;

/// Frame archive and resend planning (`tandem-resend`).
pub use tandem_resend as resend;

/// Wrapper chunk framing and the resend plan codec (`tandem-wire`).
pub use tandem_wire as wire;

/// Common imports for typical Tandem usage.
///
/// ```rust
/// use tandem::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use tandem_core::{DeterministicCommand, FrameNumber, FrameSnapshot, ObjectId, PlayerId};

    // Checksums
    pub use tandem_crc::{CrcAccumulator, CrcError};

    // Kernel
    pub use tandem_kernel::{
        mismatch_channel, ConsensusResult, ConsensusStatus, FrameHashMismatch,
        GameLogicCrcMismatch, GameLogicCrcOptions, GameLogicCrcSectionWriters, KernelConfig,
        KernelError, ResetOptions, StateKernel,
    };

    // Resend
    pub use tandem_resend::{ArchiveConfig, FrameResendArchive, ResendPlan};

    // Wire
    pub use tandem_wire::{
        decode_resend_plan, encode_resend_plan, encode_wrapper_chunk, parse_wrapper_chunk,
        parse_wrapper_chunk_value, split_into_chunks, ChunkReassembler, WrapperChunk,
    };
}
