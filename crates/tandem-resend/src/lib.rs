//! Frame-indexed command archive and resend planning.
//!
//! Every synchronized command a peer executes is mirrored into a
//! [`FrameResendArchive`]. When another peer reports a gap, the archive
//! builds a [`ResendPlan`] covering the requested frames, narrowed to
//! what the retention window still holds.
//!
//! The archive never evicts on its own: the host calls
//! [`prune_history`](FrameResendArchive::prune_history) as frames age out.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod archive;
pub mod config;
pub mod plan;

pub use archive::FrameResendArchive;
pub use config::{ArchiveConfig, ArchiveError, MAX_FRAMES_AHEAD, SOURCE_FRAMES_TO_KEEP};
pub use plan::{FrameInfo, ResendCommand, ResendPlan};
