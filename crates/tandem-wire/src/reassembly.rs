//! Per-sender reassembly of chunked messages.
//!
//! Fragments may arrive duplicated or out of order. A message is keyed by
//! `(sender, wrapped_command_id)` and completes once every chunk number
//! has been seen and the fragments tile the declared total exactly. Two
//! fragments that write the same bytes discard the message.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use tandem_core::PlayerId;

use crate::chunk::WrapperChunk;
use crate::error::ChunkError;

/// Bounds for a [`ChunkReassembler`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReassemblyConfig {
    /// Largest message accepted, in bytes. Default: 1 MiB.
    pub max_total_data_length: u32,
    /// Messages held in progress at once; the oldest is evicted beyond
    /// this. Default: 64.
    pub max_pending_messages: usize,
}

impl Default for ReassemblyConfig {
    fn default() -> Self {
        Self {
            max_total_data_length: 1 << 20,
            max_pending_messages: 64,
        }
    }
}

impl ReassemblyConfig {
    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ChunkError> {
        if self.max_pending_messages == 0 {
            return Err(ChunkError::NoPendingCapacity);
        }
        Ok(())
    }
}

#[derive(Debug)]
struct PendingMessage {
    num_chunks: u32,
    total_data_length: u32,
    buffer: Vec<u8>,
    received: Vec<bool>,
    // start -> end of every non-empty fragment written so far.
    spans: BTreeMap<u32, u32>,
    chunks_received: u32,
    bytes_received: u64,
}

impl PendingMessage {
    fn new(chunk: &WrapperChunk) -> Self {
        Self {
            num_chunks: chunk.num_chunks,
            total_data_length: chunk.total_data_length,
            buffer: vec![0; chunk.total_data_length as usize],
            received: vec![false; chunk.num_chunks as usize],
            spans: BTreeMap::new(),
            chunks_received: 0,
            bytes_received: 0,
        }
    }

    fn agrees_with(&self, chunk: &WrapperChunk) -> bool {
        self.num_chunks == chunk.num_chunks && self.total_data_length == chunk.total_data_length
    }

    /// Whether `[start, end)` intersects a fragment already written.
    fn overlaps(&self, start: u32, end: u32) -> bool {
        if start == end {
            return false;
        }
        let before = self
            .spans
            .range(..=start)
            .next_back()
            .is_some_and(|(_, &prev_end)| prev_end > start);
        let after = self
            .spans
            .range(start..)
            .next()
            .is_some_and(|(&next_start, _)| next_start < end);
        before || after
    }
}

/// A message cannot have more fragments than bytes, except the single
/// fragment of a zero-length payload.
fn chunk_count_is_plausible(chunk: &WrapperChunk) -> bool {
    chunk.num_chunks <= chunk.total_data_length.max(1)
}

/// Rebuilds whole messages from validated [`WrapperChunk`]s.
///
/// ```
/// use tandem_wire::{split_into_chunks, ChunkReassembler};
///
/// let mut reassembler = ChunkReassembler::default();
/// let chunks = split_into_chunks(4, b"hello world", 3).unwrap();
///
/// let mut done = None;
/// for chunk in chunks.into_iter().rev() {
///     done = reassembler.accept(1, chunk);
/// }
/// assert_eq!(done.as_deref(), Some(&b"hello world"[..]));
/// ```
#[derive(Debug, Default)]
pub struct ChunkReassembler {
    config: ReassemblyConfig,
    pending: IndexMap<(PlayerId, u16), PendingMessage>,
}

impl ChunkReassembler {
    /// Create a reassembler with validated bounds.
    pub fn new(config: ReassemblyConfig) -> Result<Self, ChunkError> {
        config.validate()?;
        Ok(Self {
            config,
            pending: IndexMap::new(),
        })
    }

    /// Feed one fragment from `sender`.
    ///
    /// Returns the complete message the first time every fragment is
    /// present. Duplicates are ignored. A fragment that disagrees with the
    /// in-progress message on `num_chunks` or `total_data_length` discards
    /// that message and starts a new one from this fragment. A fragment
    /// overlapping bytes another fragment already wrote discards the
    /// message. Fragments claiming more chunks than bytes are dropped.
    pub fn accept(&mut self, sender: PlayerId, chunk: WrapperChunk) -> Option<Vec<u8>> {
        let key = (sender, chunk.wrapped_command_id);

        if chunk.is_empty_message() {
            self.pending.shift_remove(&key);
            return Some(Vec::new());
        }

        if chunk.total_data_length > self.config.max_total_data_length {
            tracing::debug!(
                sender,
                wrapped_command_id = chunk.wrapped_command_id,
                total_data_length = chunk.total_data_length,
                "dropping oversized wrapped message"
            );
            self.pending.shift_remove(&key);
            return None;
        }

        if !chunk_count_is_plausible(&chunk) {
            tracing::debug!(
                sender,
                wrapped_command_id = chunk.wrapped_command_id,
                num_chunks = chunk.num_chunks,
                total_data_length = chunk.total_data_length,
                "dropping chunk with more fragments than bytes"
            );
            return None;
        }

        if self.pending.get(&key).is_some_and(|p| !p.agrees_with(&chunk)) {
            tracing::debug!(
                sender,
                wrapped_command_id = chunk.wrapped_command_id,
                "inconsistent chunk header, restarting message"
            );
            self.pending.shift_remove(&key);
        }

        if !self.pending.contains_key(&key) {
            while self.pending.len() >= self.config.max_pending_messages {
                if let Some(((old_sender, old_id), _)) = self.pending.shift_remove_index(0) {
                    tracing::debug!(
                        sender = old_sender,
                        wrapped_command_id = old_id,
                        "evicting oldest pending message"
                    );
                }
            }
            self.pending.insert(key, PendingMessage::new(&chunk));
        }

        let message = self.pending.get_mut(&key)?;
        let index = chunk.chunk_number as usize;
        if *message.received.get(index)? {
            tracing::trace!(sender, chunk_number = chunk.chunk_number, "duplicate chunk");
            return None;
        }

        let start = chunk.data_offset;
        let end = start.checked_add(chunk.data_length())?;
        if message.overlaps(start, end) {
            tracing::debug!(
                sender,
                wrapped_command_id = chunk.wrapped_command_id,
                chunk_number = chunk.chunk_number,
                data_offset = start,
                "overlapping chunk, discarding message"
            );
            self.pending.shift_remove(&key);
            return None;
        }
        message
            .buffer
            .get_mut(start as usize..end as usize)?
            .copy_from_slice(&chunk.data);
        if start != end {
            message.spans.insert(start, end);
        }
        if let Some(slot) = message.received.get_mut(index) {
            *slot = true;
        }
        message.chunks_received += 1;
        message.bytes_received += chunk.data.len() as u64;

        if message.chunks_received < message.num_chunks {
            return None;
        }

        let message = self.pending.shift_remove(&key)?;
        if message.bytes_received != u64::from(message.total_data_length) {
            tracing::debug!(
                sender,
                wrapped_command_id = chunk.wrapped_command_id,
                bytes_received = message.bytes_received,
                total_data_length = message.total_data_length,
                "chunks do not cover message, discarding"
            );
            return None;
        }
        Some(message.buffer)
    }

    /// Messages currently in progress.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Drop every in-progress message from `sender`, e.g. on disconnect.
    pub fn discard_sender(&mut self, sender: PlayerId) {
        self.pending.retain(|(s, _), _| *s != sender);
    }

    /// Drop everything in progress.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
