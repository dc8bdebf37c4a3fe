//! The frame-indexed command archive.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use tandem_core::{DeterministicCommand, FrameNumber, PlayerId};

use crate::config::{ArchiveConfig, ArchiveError};
use crate::plan::{FrameInfo, ResendCommand, ResendPlan};

#[derive(Clone, Debug)]
struct FrameRecord<C> {
    commands: Vec<C>,
    count: Option<u32>,
}

impl<C> Default for FrameRecord<C> {
    fn default() -> Self {
        Self {
            commands: Vec::new(),
            count: None,
        }
    }
}

/// Per-sender, per-frame history of synchronized commands.
///
/// A recorded count is independent of retained commands: `Some(0)`
/// means "the sender issued nothing that frame", `None` means "unknown".
///
/// # Example
///
/// ```
/// use tandem_core::DeterministicCommand;
/// use tandem_resend::FrameResendArchive;
///
/// let mut archive = FrameResendArchive::default();
/// archive.record_synchronized_command(1, 10, DeterministicCommand::new(3, 1, 0));
/// archive.set_frame_command_count(1, 10, 1);
///
/// let plan = archive.build_resend_plan(2, 10, 11, &[1]);
/// assert_eq!(plan.commands.len(), 1);
/// assert_eq!(plan.frame_info[0].command_count, 1);
/// ```
#[derive(Clone, Debug)]
pub struct FrameResendArchive<C = DeterministicCommand> {
    frames_to_keep: u32,
    frames: BTreeMap<FrameNumber, IndexMap<PlayerId, FrameRecord<C>>>,
}

impl<C> Default for FrameResendArchive<C> {
    fn default() -> Self {
        Self {
            frames_to_keep: ArchiveConfig::default().frames_to_keep,
            frames: BTreeMap::new(),
        }
    }
}

impl<C> FrameResendArchive<C> {
    /// Create an archive with a validated retention window.
    pub fn new(config: ArchiveConfig) -> Result<Self, ArchiveError> {
        config.validate()?;
        Ok(Self {
            frames_to_keep: config.frames_to_keep,
            frames: BTreeMap::new(),
        })
    }

    fn record_mut(&mut self, sender: PlayerId, frame: FrameNumber) -> &mut FrameRecord<C> {
        self.frames
            .entry(frame)
            .or_default()
            .entry(sender)
            .or_default()
    }

    fn record(&self, sender: PlayerId, frame: FrameNumber) -> Option<&FrameRecord<C>> {
        self.frames.get(&frame)?.get(&sender)
    }

    /// Append `command` to `sender`'s list for `frame`.
    pub fn record_synchronized_command(&mut self, sender: PlayerId, frame: FrameNumber, command: C) {
        self.record_mut(sender, frame).commands.push(command);
    }

    /// Store the authoritative command count for `sender` on `frame`.
    pub fn set_frame_command_count(&mut self, sender: PlayerId, frame: FrameNumber, count: u32) {
        self.record_mut(sender, frame).count = Some(count);
    }

    /// Commands recorded for `sender` on `frame`, in recording order.
    pub fn frame_commands(&self, sender: PlayerId, frame: FrameNumber) -> &[C] {
        self.record(sender, frame)
            .map(|r| r.commands.as_slice())
            .unwrap_or(&[])
    }

    /// Recorded count for `sender` on `frame`; `None` if never set.
    pub fn frame_command_count(&self, sender: PlayerId, frame: FrameNumber) -> Option<u32> {
        self.record(sender, frame)?.count
    }

    /// Drop every record for frames strictly below `min_frame`.
    pub fn prune_history(&mut self, min_frame: FrameNumber) {
        let before = self.frames.len();
        self.frames = self.frames.split_off(&min_frame);
        tracing::debug!(
            min_frame,
            dropped = before - self.frames.len(),
            retained = self.frames.len(),
            "pruned resend history"
        );
    }

    /// Configured retention window.
    pub fn frames_to_keep(&self) -> u32 {
        self.frames_to_keep
    }

    /// Lowest frame with any record.
    pub fn oldest_frame(&self) -> Option<FrameNumber> {
        self.frames.keys().next().copied()
    }

    /// Highest frame with any record.
    pub fn newest_frame(&self) -> Option<FrameNumber> {
        self.frames.keys().next_back().copied()
    }

    /// Number of frames with any record.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

impl<C: Clone> FrameResendArchive<C> {
    /// Build a replay payload for `requesting_player_id`.
    ///
    /// The start is clamped to `end_frame_exclusive - frames_to_keep`, so
    /// asking further back than the window silently narrows the plan.
    /// Every requested sender gets a [`FrameInfo`] per frame, with unknown
    /// counts reported as 0.
    pub fn build_resend_plan(
        &self,
        requesting_player_id: PlayerId,
        requested_start_frame: FrameNumber,
        end_frame_exclusive: FrameNumber,
        sender_player_ids: &[PlayerId],
    ) -> ResendPlan<C> {
        let window_start = end_frame_exclusive.saturating_sub(self.frames_to_keep);
        let resend_start_frame = requested_start_frame.max(window_start);

        let mut plan = ResendPlan {
            requesting_player_id,
            resend_start_frame,
            end_frame_exclusive,
            frame_info: Vec::new(),
            commands: Vec::new(),
        };

        for frame in resend_start_frame..end_frame_exclusive {
            let senders = self.frames.get(&frame);
            for &sender in sender_player_ids {
                let record = senders.and_then(|s| s.get(&sender));
                plan.frame_info.push(FrameInfo {
                    sender_player_id: sender,
                    frame,
                    command_count: record.and_then(|r| r.count).unwrap_or(0),
                });
                if let Some(record) = record {
                    plan.commands
                        .extend(record.commands.iter().map(|command| ResendCommand {
                            sender_player_id: sender,
                            frame,
                            command: command.clone(),
                        }));
                }
            }
        }

        tracing::debug!(
            requesting_player_id,
            requested_start_frame,
            resend_start_frame,
            end_frame_exclusive,
            commands = plan.commands.len(),
            "built resend plan"
        );
        plan
    }
}
