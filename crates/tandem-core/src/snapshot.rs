//! Immutable point-in-time view of the kernel's deterministic state.

use crate::command::DeterministicCommand;
use crate::id::FrameNumber;

/// The state a hash provider or CRC section writer sees for one frame.
///
/// Built by the state kernel from its counters and pending command
/// queue. Commands are already in canonical order. A snapshot is a plain
/// value: it is never updated after construction and is not tied to the
/// kernel that produced it.
///
/// # Examples
///
/// ```
/// use tandem_core::{DeterministicCommand, FrameSnapshot};
///
/// let snap = FrameSnapshot {
///     frame: 12,
///     next_object_id: 5,
///     random_seed_crc: 0xCAFE,
///     commands: vec![DeterministicCommand::new(1, 0, 0)],
/// };
///
/// assert_eq!(snap.command_count(), 1);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameSnapshot {
    /// Frame this snapshot describes.
    pub frame: FrameNumber,
    /// Next id the object allocator would hand out.
    pub next_object_id: u32,
    /// Checksum of the simulation's random generator state.
    pub random_seed_crc: u32,
    /// Pending commands, in canonical order.
    pub commands: Vec<DeterministicCommand>,
}

impl FrameSnapshot {
    /// Number of commands captured.
    pub fn command_count(&self) -> usize {
        self.commands.len()
    }
}
