//! Deterministic state kernel for Tandem lockstep peers.
//!
//! [`StateKernel`] owns everything that must evolve identically on every
//! peer: the frame counter, the object-id allocator, and the pending
//! command queue. Each frame it builds a [`FrameSnapshot`], runs the
//! simulation layer's hash provider and CRC section writers over it, and
//! compares the local result against checksums reported by remote peers.
//!
//! # Frame sequence
//!
//! ```text
//! advance_frame → enqueue_command* → create_snapshot → compute/record local
//!                                   ↘ record_remote (any time between ticks)
//! ```
//!
//! Divergence is a reported condition, never an error: mismatches are
//! delivered to listeners registered with
//! [`on_frame_hash_mismatch`](StateKernel::on_frame_hash_mismatch) and
//! [`on_game_logic_crc_mismatch`](StateKernel::on_game_logic_crc_mismatch).
//!
//! [`FrameSnapshot`]: tandem_core::FrameSnapshot

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod consensus;
pub mod error;
pub mod events;
pub mod hashing;
pub mod kernel;
mod ledger;
pub mod metrics;
pub mod queue;

pub use config::{ConfigError, GameLogicCrcOptions, KernelConfig, ResetOptions};
pub use consensus::{ConsensusResult, ConsensusStatus, PlayerIds};
pub use error::KernelError;
pub use events::{mismatch_channel, FrameHashMismatch, GameLogicCrcMismatch, ListenerId};
pub use hashing::{CrcSection, CrcSectionWriter, FrameHashProvider, GameLogicCrcSectionWriters};
pub use kernel::StateKernel;
pub use metrics::KernelMetrics;
pub use queue::CommandQueue;
