//! Legacy order-sensitive checksum accumulator.
//!
//! Peers running the same command stream fold their simulation state
//! through a [`CrcAccumulator`] every frame and exchange the results.
//! The algorithm is a bit-exact reproduction of a legacy rotate-and-add
//! checksum with mixed byte order; it is **not** CRC-32 and must not be
//! replaced by one. See [`accumulator`] for the exact folding rules.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod accumulator;
pub mod error;

pub use accumulator::CrcAccumulator;
pub use error::CrcError;
