//! Binary wrapper chunk header: validation, encoding, and splitting.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::ChunkError;

/// Size of the fixed little-endian header preceding each fragment.
pub const HEADER_LEN: usize = 22;

/// One validated fragment of a wrapped message.
///
/// The payload length is `data.len()`; it is not stored separately.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WrapperChunk {
    /// Identifies the message this fragment belongs to.
    pub wrapped_command_id: u16,
    /// Index of this fragment, `0..num_chunks`.
    pub chunk_number: u32,
    /// Total fragments in the message; 0 marks an empty message.
    pub num_chunks: u32,
    /// Length of the reassembled message.
    pub total_data_length: u32,
    /// Where `data` starts inside the reassembled message.
    pub data_offset: u32,
    /// Fragment payload.
    pub data: Bytes,
}

impl WrapperChunk {
    /// Payload length as carried in the header.
    pub fn data_length(&self) -> u32 {
        // Construction paths reject payloads longer than u32::MAX.
        u32::try_from(self.data.len()).unwrap_or(u32::MAX)
    }

    /// Whether this is the sentinel chunk of an empty message.
    pub fn is_empty_message(&self) -> bool {
        self.num_chunks == 0
    }
}

/// Structural checks shared by the binary and structured parsers.
pub(crate) fn header_is_consistent(
    chunk_number: u32,
    num_chunks: u32,
    total_data_length: u32,
    data_offset: u32,
    data_length: u32,
) -> bool {
    if num_chunks == 0 {
        return chunk_number == 0 && data_offset == 0 && total_data_length == 0 && data_length == 0;
    }
    chunk_number < num_chunks
        && data_offset <= total_data_length
        && u64::from(data_offset) + u64::from(data_length) <= u64::from(total_data_length)
}

fn le_u16(buf: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([buf[at], buf[at + 1]])
}

fn le_u32(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

/// Parse one binary fragment.
///
/// Returns `None` for a short buffer, an inconsistent header, or a payload
/// whose length differs from the declared `data_length`.
///
/// ```
/// use tandem_wire::{encode_wrapper_chunk, parse_wrapper_chunk, WrapperChunk};
///
/// let chunk = WrapperChunk {
///     wrapped_command_id: 3,
///     chunk_number: 1,
///     num_chunks: 2,
///     total_data_length: 6,
///     data_offset: 4,
///     data: vec![9u8, 9].into(),
/// };
/// let wire = encode_wrapper_chunk(&chunk);
/// assert_eq!(parse_wrapper_chunk(&wire), Some(chunk));
/// assert_eq!(parse_wrapper_chunk(&wire[..wire.len() - 1]), None);
/// ```
pub fn parse_wrapper_chunk(buf: &[u8]) -> Option<WrapperChunk> {
    if buf.len() < HEADER_LEN {
        tracing::trace!(len = buf.len(), "wrapper chunk shorter than header");
        return None;
    }

    let wrapped_command_id = le_u16(buf, 0);
    let chunk_number = le_u32(buf, 2);
    let num_chunks = le_u32(buf, 6);
    let total_data_length = le_u32(buf, 10);
    let data_length = le_u32(buf, 14);
    let data_offset = le_u32(buf, 18);
    let payload = &buf[HEADER_LEN..];

    if payload.len() as u64 != u64::from(data_length)
        || !header_is_consistent(
            chunk_number,
            num_chunks,
            total_data_length,
            data_offset,
            data_length,
        )
    {
        tracing::trace!(
            wrapped_command_id,
            chunk_number,
            num_chunks,
            total_data_length,
            data_length,
            data_offset,
            available = payload.len(),
            "rejected wrapper chunk"
        );
        return None;
    }

    Some(WrapperChunk {
        wrapped_command_id,
        chunk_number,
        num_chunks,
        total_data_length,
        data_offset,
        data: Bytes::copy_from_slice(payload),
    })
}

/// Serialize a fragment as header plus payload.
pub fn encode_wrapper_chunk(chunk: &WrapperChunk) -> Bytes {
    let mut buf = BytesMut::with_capacity(HEADER_LEN + chunk.data.len());
    buf.put_u16_le(chunk.wrapped_command_id);
    buf.put_u32_le(chunk.chunk_number);
    buf.put_u32_le(chunk.num_chunks);
    buf.put_u32_le(chunk.total_data_length);
    buf.put_u32_le(chunk.data_length());
    buf.put_u32_le(chunk.data_offset);
    buf.put_slice(&chunk.data);
    buf.freeze()
}

/// Split `data` into fragments of at most `max_chunk_len` payload bytes.
///
/// Empty data yields the single `num_chunks == 0` sentinel chunk.
pub fn split_into_chunks(
    wrapped_command_id: u16,
    data: &[u8],
    max_chunk_len: usize,
) -> Result<Vec<WrapperChunk>, ChunkError> {
    if max_chunk_len == 0 {
        return Err(ChunkError::ZeroChunkLength);
    }
    let total_data_length =
        u32::try_from(data.len()).map_err(|_| ChunkError::MessageTooLarge { length: data.len() })?;

    if data.is_empty() {
        return Ok(vec![WrapperChunk {
            wrapped_command_id,
            chunk_number: 0,
            num_chunks: 0,
            total_data_length: 0,
            data_offset: 0,
            data: Bytes::new(),
        }]);
    }

    // A step wider than the message yields a single chunk either way.
    let step = u32::try_from(max_chunk_len).unwrap_or(u32::MAX);
    let num_chunks = total_data_length.div_ceil(step);
    let shared = Bytes::copy_from_slice(data);
    let chunks = (0..num_chunks)
        .map(|chunk_number| {
            // Bounded by total_data_length for every chunk_number < num_chunks.
            let data_offset = chunk_number * step;
            let end = data_offset.saturating_add(step).min(total_data_length);
            WrapperChunk {
                wrapped_command_id,
                chunk_number,
                num_chunks,
                total_data_length,
                data_offset,
                data: shared.slice(data_offset as usize..end as usize),
            }
        })
        .collect();
    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_header(fields: [u32; 6]) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_LEN);
        buf.extend_from_slice(&(fields[0] as u16).to_le_bytes());
        for v in &fields[1..] {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        buf
    }

    #[test]
    fn header_layout_is_little_endian() {
        let chunk = WrapperChunk {
            wrapped_command_id: 0x0102,
            chunk_number: 0,
            num_chunks: 1,
            total_data_length: 1,
            data_offset: 0,
            data: vec![0xEE].into(),
        };
        let wire = encode_wrapper_chunk(&chunk);
        assert_eq!(wire.len(), HEADER_LEN + 1);
        assert_eq!(&wire[..2], &[0x02, 0x01]);
        assert_eq!(&wire[14..18], &[1, 0, 0, 0]);
        assert_eq!(wire[HEADER_LEN], 0xEE);
    }

    #[test]
    fn empty_message_sentinel_parses() {
        let buf = raw_header([5, 0, 0, 0, 0, 0]);
        let chunk = parse_wrapper_chunk(&buf).unwrap();
        assert!(chunk.is_empty_message());
        assert!(chunk.data.is_empty());
    }

    #[test]
    fn sentinel_with_nonzero_chunk_number_rejected() {
        assert_eq!(parse_wrapper_chunk(&raw_header([5, 1, 0, 0, 0, 0])), None);
    }

    #[test]
    fn sentinel_with_offset_or_length_rejected() {
        assert_eq!(parse_wrapper_chunk(&raw_header([5, 0, 0, 0, 0, 1])), None);
        assert_eq!(parse_wrapper_chunk(&raw_header([5, 0, 0, 4, 0, 0])), None);
    }

    #[test]
    fn chunk_number_must_be_below_count() {
        assert_eq!(parse_wrapper_chunk(&raw_header([1, 2, 2, 0, 0, 0])), None);
        assert!(parse_wrapper_chunk(&raw_header([1, 1, 2, 0, 0, 0])).is_some());
    }

    #[test]
    fn payload_must_fit_total() {
        let mut buf = raw_header([1, 0, 1, 4, 2, 3]);
        buf.extend_from_slice(&[1, 2]);
        assert_eq!(parse_wrapper_chunk(&buf), None);
    }

    #[test]
    fn offset_overflow_rejected() {
        let mut buf = raw_header([1, 0, 1, u32::MAX, 2, u32::MAX]);
        buf.extend_from_slice(&[1, 2]);
        assert_eq!(parse_wrapper_chunk(&buf), None);
    }

    #[test]
    fn declared_length_must_match_payload() {
        let mut buf = raw_header([1, 0, 1, 8, 4, 0]);
        buf.extend_from_slice(&[1, 2, 3]);
        assert_eq!(parse_wrapper_chunk(&buf), None);
        buf.extend_from_slice(&[4, 5]);
        assert_eq!(parse_wrapper_chunk(&buf), None);
    }

    #[test]
    fn short_buffer_rejected() {
        assert_eq!(parse_wrapper_chunk(&[0u8; HEADER_LEN - 1]), None);
    }

    #[test]
    fn split_covers_data_exactly() {
        let data: Vec<u8> = (0..10).collect();
        let chunks = split_into_chunks(7, &data, 4).unwrap();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].data_offset, 8);
        assert_eq!(chunks[2].data.as_ref(), &[8, 9]);
        for c in &chunks {
            assert_eq!(c.num_chunks, 3);
            assert_eq!(c.total_data_length, 10);
            assert_eq!(parse_wrapper_chunk(&encode_wrapper_chunk(c)).as_ref(), Some(c));
        }
    }

    #[test]
    fn split_with_oversized_step_yields_one_chunk() {
        let chunks = split_into_chunks(7, b"abc", usize::MAX).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].data_offset, 0);
        assert_eq!(chunks[0].data.as_ref(), b"abc");
    }

    #[test]
    fn split_empty_yields_sentinel() {
        let chunks = split_into_chunks(7, &[], 4).unwrap();
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].is_empty_message());
    }

    #[test]
    fn split_rejects_zero_chunk_len() {
        assert_eq!(split_into_chunks(7, &[1], 0), Err(ChunkError::ZeroChunkLength));
    }
}
