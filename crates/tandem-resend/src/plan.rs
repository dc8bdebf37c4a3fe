//! Resend plan values.

use tandem_core::{FrameNumber, PlayerId};

/// Authoritative command count for one sender and frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameInfo {
    /// Peer whose commands the count describes.
    pub sender_player_id: PlayerId,
    /// Frame described.
    pub frame: FrameNumber,
    /// Recorded count, or 0 when none was recorded.
    pub command_count: u32,
}

/// One archived command, tagged with its origin.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResendCommand<C> {
    /// Peer that originally sent the command.
    pub sender_player_id: PlayerId,
    /// Frame the command executed on.
    pub frame: FrameNumber,
    /// The command.
    pub command: C,
}

/// Replay payload for a peer that missed broadcasts.
///
/// `frame_info` and `commands` are ordered by ascending frame. Within a
/// frame, `frame_info` follows the requested sender order and `commands`
/// follow sender order, then recording order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResendPlan<C> {
    /// Peer the plan is addressed to.
    pub requesting_player_id: PlayerId,
    /// First frame covered, after clamping to the retention window.
    pub resend_start_frame: FrameNumber,
    /// One past the last frame covered.
    pub end_frame_exclusive: FrameNumber,
    /// Per-sender, per-frame counts.
    pub frame_info: Vec<FrameInfo>,
    /// Archived commands.
    pub commands: Vec<ResendCommand<C>>,
}

impl<C> ResendPlan<C> {
    /// Number of frames covered.
    pub fn frame_span(&self) -> u32 {
        self.end_frame_exclusive
            .saturating_sub(self.resend_start_frame)
    }

    /// Whether the plan carries no frames at all.
    pub fn is_empty(&self) -> bool {
        self.frame_span() == 0
    }
}
