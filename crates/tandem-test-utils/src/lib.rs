//! Test fixtures and seeded command streams for Tandem development.
//!
//! Provides command builders, snapshot-driven CRC section writers that
//! let two independent kernels agree on checksums, a [`SectionLog`] for
//! asserting section write order, and [`CommandStream`] for reproducible
//! pseudo-random command traffic.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;
pub mod stream;

pub use fixtures::{
    cmd, deduped, snapshot_frame_hash, snapshot_section_writers, SectionLog,
};
pub use stream::CommandStream;
