//! Wire framing for Tandem peers.
//!
//! Messages larger than one packet are split into wrapper chunks, each a
//! fixed 22-byte little-endian header followed by a slice of the payload.
//! Chunks may also arrive already decoded as JSON objects.
//!
//! # Format
//!
//! ```text
//! [wrapped_command_id u16] [chunk_number u32] [num_chunks u32]
//! [total_data_length u32] [data_length u32] [data_offset u32] [data ...]
//! ```
//!
//! Malformed fragments are expected on a lossy network. Every parser here
//! returns `None` for them instead of an error so the transport can drop
//! the fragment and wait for retransmission.
//!
//! - [`parse_wrapper_chunk`] / [`parse_wrapper_chunk_value`] validate one fragment
//! - [`split_into_chunks`] / [`encode_wrapper_chunk`] produce fragments
//! - [`ChunkReassembler`] rebuilds whole messages per sender
//! - [`encode_resend_plan`] / [`decode_resend_plan`] serialize resend plans

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod chunk;
pub mod error;
pub mod plan_codec;
pub mod reassembly;
pub mod value;

pub use chunk::{encode_wrapper_chunk, parse_wrapper_chunk, split_into_chunks, WrapperChunk, HEADER_LEN};
pub use error::{ChunkError, PlanCodecError};
pub use plan_codec::{decode_resend_plan, encode_resend_plan, PLAN_FORMAT_VERSION};
pub use reassembly::{ChunkReassembler, ReassemblyConfig};
pub use value::{coerce_network_payload_to_bytes, parse_wrapper_chunk_value};
