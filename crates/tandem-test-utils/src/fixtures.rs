//! Command builders and CRC section writer fixtures.
//!
//! - [`snapshot_frame_hash`]: a frame hash provider over every snapshot field.
//! - [`snapshot_section_writers`]: four section writers that fold only
//!   snapshot content, so equal snapshots give equal CRCs.
//! - [`SectionLog`]: writers that record the order they were called in.

use std::sync::{Arc, Mutex};

use tandem_core::{DeterministicCommand, FrameSnapshot, PlayerId};
use tandem_crc::{CrcAccumulator, CrcError};
use tandem_kernel::{CrcSectionWriter, GameLogicCrcSectionWriters};

/// Shorthand for a command with no payload and no dedupe key.
pub fn cmd(command_type: u32, player_id: PlayerId, sort_number: u32) -> DeterministicCommand {
    DeterministicCommand::new(command_type, player_id, sort_number)
}

/// A command carrying a dedupe key derived from its ordering key.
pub fn deduped(command_type: u32, player_id: PlayerId, sort_number: u32) -> DeterministicCommand {
    cmd(command_type, player_id, sort_number)
        .with_dedupe_key(format!("{command_type}:{player_id}:{sort_number}"))
}

fn fold_commands(crc: &mut CrcAccumulator, snapshot: &FrameSnapshot) {
    for c in &snapshot.commands {
        crc.write_u32(c.command_type);
        crc.write_u32(c.player_id);
        crc.write_u32(c.sort_number);
        crc.add_bytes(&c.payload);
    }
}

/// Frame hash provider folding frame, counters, and commands.
pub fn snapshot_frame_hash(snapshot: &FrameSnapshot) -> u32 {
    let mut crc = CrcAccumulator::new();
    crc.write_u32(snapshot.frame);
    crc.write_u32(snapshot.next_object_id);
    crc.write_u32(snapshot.random_seed_crc);
    fold_commands(&mut crc, snapshot);
    crc.crc()
}

/// Section writers that depend only on the snapshot.
pub fn snapshot_section_writers() -> GameLogicCrcSectionWriters {
    GameLogicCrcSectionWriters::new(
        |crc: &mut CrcAccumulator, s: &FrameSnapshot| -> Result<(), CrcError> {
            crc.write_u32(s.next_object_id);
            fold_commands(crc, s);
            Ok(())
        },
        |crc: &mut CrcAccumulator, s: &FrameSnapshot| -> Result<(), CrcError> {
            crc.write_u32(s.frame);
            Ok(())
        },
        |crc: &mut CrcAccumulator, s: &FrameSnapshot| -> Result<(), CrcError> {
            for c in &s.commands {
                crc.write_u32(c.player_id);
            }
            Ok(())
        },
        |crc: &mut CrcAccumulator, s: &FrameSnapshot| {
            crc.add_unsigned_int(s.commands.len() as i64)
        },
    )
}

/// Shared record of which section writers ran, in call order.
#[derive(Clone, Debug, Default)]
pub struct SectionLog {
    calls: Arc<Mutex<Vec<&'static str>>>,
}

impl SectionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A writer that logs `tag` and folds it into the checksum.
    pub fn writer(&self, tag: &'static str) -> impl CrcSectionWriter + 'static {
        let calls = Arc::clone(&self.calls);
        move |crc: &mut CrcAccumulator, _: &FrameSnapshot| {
            if let Ok(mut calls) = calls.lock() {
                calls.push(tag);
            }
            crc.add_ascii_string(tag)
        }
    }

    /// Four logging writers tagged `objects`, `partition`, `players`, `ai`.
    pub fn section_writers(&self) -> GameLogicCrcSectionWriters {
        GameLogicCrcSectionWriters::new(
            self.writer("objects"),
            self.writer("partition"),
            self.writer("players"),
            self.writer("ai"),
        )
    }

    /// Tags logged so far.
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.clear();
        }
    }
}
