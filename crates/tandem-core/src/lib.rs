//! Core types for the Tandem lockstep determinism core.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the values every other Tandem crate agrees on: frame and player
//! identifiers, the object-id space, [`DeterministicCommand`] with its
//! canonical ordering key, and the immutable [`FrameSnapshot`] handed to
//! hash providers and resend planning.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod command;
pub mod id;
pub mod snapshot;

pub use command::{CommandKey, DeterministicCommand};
pub use id::{FrameNumber, ObjectId, PlayerId, MAX_OBJECT_ID, MIN_OBJECT_ID};
pub use snapshot::FrameSnapshot;
