//! Integration test: archived commands travel as a chunked resend plan and
//! arrive intact despite duplicated and reordered fragments.

use proptest::prelude::*;
use tandem_resend::{ArchiveConfig, FrameResendArchive};
use tandem_test_utils::CommandStream;
use tandem_wire::{
    decode_resend_plan, encode_resend_plan, encode_wrapper_chunk, parse_wrapper_chunk,
    split_into_chunks, ChunkReassembler, WrapperChunk, HEADER_LEN,
};

#[test]
fn header_fields_survive_encoding() {
    let chunk = WrapperChunk {
        wrapped_command_id: 0xBEEF,
        chunk_number: 3,
        num_chunks: 5,
        total_data_length: 1000,
        data_offset: 600,
        data: vec![0xAB; 200].into(),
    };
    let wire = encode_wrapper_chunk(&chunk);
    assert_eq!(wire.len(), HEADER_LEN + 200);
    assert_eq!(parse_wrapper_chunk(&wire), Some(chunk));
}

#[test]
fn empty_message_with_nonzero_chunk_number_fails() {
    let chunk = WrapperChunk {
        wrapped_command_id: 1,
        chunk_number: 1,
        num_chunks: 0,
        total_data_length: 0,
        data_offset: 0,
        data: Default::default(),
    };
    assert_eq!(parse_wrapper_chunk(&encode_wrapper_chunk(&chunk)), None);
}

#[test]
fn resend_plan_round_trips_through_chunks() {
    let mut archive = FrameResendArchive::new(ArchiveConfig { frames_to_keep: 16 }).unwrap();
    let mut stream = CommandStream::new(3, 2, 5);
    for frame in 0..40 {
        for c in stream.take_commands(4) {
            archive.record_synchronized_command(c.player_id, frame, c);
        }
        for sender in 0..2 {
            let n = u32::try_from(archive.frame_commands(sender, frame).len()).unwrap();
            archive.set_frame_command_count(sender, frame, n);
        }
    }

    let plan = archive.build_resend_plan(7, 10, 40, &[0, 1]);
    assert_eq!(plan.resend_start_frame, 24);
    let encoded = encode_resend_plan(&plan).unwrap();

    let mut wire: Vec<_> = split_into_chunks(42, &encoded, 64)
        .unwrap()
        .iter()
        .map(encode_wrapper_chunk)
        .collect();
    wire.reverse();
    wire.push(wire[0].clone());

    let mut reassembler = ChunkReassembler::default();
    let mut completed = Vec::new();
    for fragment in &wire {
        let chunk = parse_wrapper_chunk(fragment).unwrap();
        if let Some(message) = reassembler.accept(0, chunk) {
            completed.push(message);
        }
    }

    assert_eq!(completed.len(), 1);
    assert_eq!(decode_resend_plan(&completed[0]), Ok(plan));
}

proptest! {
    #[test]
    fn split_then_reassemble_restores_data(
        seed in any::<u64>(),
        len in 0usize..2000,
        max_chunk_len in 1usize..300,
    ) {
        let data = CommandStream::new(seed, 1, 1).bytes(len);
        let chunks = split_into_chunks(9, &data, max_chunk_len).unwrap();

        let mut reassembler = ChunkReassembler::default();
        let mut result = None;
        for chunk in chunks.into_iter().rev() {
            let parsed = parse_wrapper_chunk(&encode_wrapper_chunk(&chunk));
            prop_assert_eq!(parsed.as_ref(), Some(&chunk));
            if let Some(done) = reassembler.accept(1, chunk) {
                prop_assert!(result.is_none());
                result = Some(done);
            }
        }
        prop_assert_eq!(result, Some(data));
    }

    #[test]
    fn arbitrary_bytes_never_panic(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
        let _ = parse_wrapper_chunk(&bytes);
        let _ = decode_resend_plan(&bytes);
    }
}
