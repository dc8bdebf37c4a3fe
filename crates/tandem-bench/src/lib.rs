//! Benchmark profiles for the Tandem lockstep core.
//!
//! - [`wired_kernel`]: a kernel with snapshot-driven hashing installed
//! - [`command_batch`]: a seeded batch of commands for one frame
//! - [`filled_archive`]: an archive holding `frames` frames of traffic

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use tandem_core::{DeterministicCommand, FrameSnapshot};
use tandem_kernel::{KernelConfig, StateKernel};
use tandem_resend::{ArchiveConfig, FrameResendArchive};
use tandem_test_utils::{snapshot_frame_hash, snapshot_section_writers, CommandStream};

/// Kernel with a frame hash provider and all four section writers.
pub fn wired_kernel() -> StateKernel {
    let config = KernelConfig {
        frame_hash_provider: Some(Box::new(|s: &FrameSnapshot| snapshot_frame_hash(s))),
        section_writers: Some(snapshot_section_writers()),
        ..Default::default()
    };
    StateKernel::new(config).unwrap()
}

/// `n` commands from 8 players, deterministic for a given seed.
pub fn command_batch(seed: u64, n: usize) -> Vec<DeterministicCommand> {
    CommandStream::new(seed, 8, 16).take_commands(n)
}

/// Archive with `frames` frames of 16 commands spread over 4 senders.
pub fn filled_archive(frames: u32) -> FrameResendArchive {
    let mut archive = FrameResendArchive::new(ArchiveConfig::default()).unwrap();
    let mut stream = CommandStream::new(1, 4, 8);
    for frame in 0..frames {
        for c in stream.take_commands(16) {
            archive.record_synchronized_command(c.player_id, frame, c);
        }
        for sender in 0..4 {
            let count = u32::try_from(archive.frame_commands(sender, frame).len()).unwrap();
            archive.set_frame_command_count(sender, frame, count);
        }
    }
    archive
}
