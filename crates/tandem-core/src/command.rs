//! The deterministic command type and its canonical ordering key.

use std::cmp::Ordering;

use bytes::Bytes;

use crate::id::PlayerId;

/// Canonical ordering key: `(command_type, player_id, sort_number)`.
///
/// Every peer executes a frame's commands in ascending key order. Equal
/// keys keep the order in which they were queued.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandKey {
    /// Application-defined command type.
    pub command_type: u32,
    /// Issuing player.
    pub player_id: PlayerId,
    /// Per-player sequencing number.
    pub sort_number: u32,
}

/// A simulation command submitted to the state kernel.
///
/// Commands are ordered by [`CommandKey`]. The payload is opaque to
/// Tandem; only the simulation layer interprets it.
///
/// A `dedupe_key` marks a command that may be delivered more than once
/// over an unreliable channel. Re-submitting an identical
/// `(command_type, player_id, sort_number, dedupe_key)` tuple while the
/// first copy is still queued is ignored.
///
/// # Examples
///
/// ```
/// use tandem_core::DeterministicCommand;
///
/// let cmd = DeterministicCommand::new(7, 2, 0)
///     .with_payload(vec![1u8, 2, 3])
///     .with_dedupe_key("move:2:0");
///
/// assert_eq!(cmd.key().command_type, 7);
/// assert_eq!(cmd.dedupe_key.as_deref(), Some("move:2:0"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DeterministicCommand {
    /// Application-defined command type.
    pub command_type: u32,
    /// Issuing player.
    pub player_id: PlayerId,
    /// Per-player sequencing number.
    pub sort_number: u32,
    /// Opaque command body.
    pub payload: Bytes,
    /// Optional duplicate-suppression key.
    pub dedupe_key: Option<String>,
}

impl DeterministicCommand {
    /// Create a command with an empty payload and no dedupe key.
    pub fn new(command_type: u32, player_id: PlayerId, sort_number: u32) -> Self {
        Self {
            command_type,
            player_id,
            sort_number,
            payload: Bytes::new(),
            dedupe_key: None,
        }
    }

    /// Attach a payload.
    pub fn with_payload(mut self, payload: impl Into<Bytes>) -> Self {
        self.payload = payload.into();
        self
    }

    /// Attach a dedupe key.
    pub fn with_dedupe_key(mut self, key: impl Into<String>) -> Self {
        self.dedupe_key = Some(key.into());
        self
    }

    /// The canonical ordering key.
    pub fn key(&self) -> CommandKey {
        CommandKey {
            command_type: self.command_type,
            player_id: self.player_id,
            sort_number: self.sort_number,
        }
    }

    /// Compare two commands by ordering key only.
    ///
    /// Payload and dedupe key never participate in ordering.
    pub fn cmp_key(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }

    /// Whether `other` is a redelivery of this command.
    ///
    /// Only commands carrying a dedupe key can be duplicates; two
    /// commands without one are always distinct even if every field
    /// matches.
    pub fn is_duplicate_of(&self, other: &Self) -> bool {
        match (&self.dedupe_key, &other.dedupe_key) {
            (Some(a), Some(b)) => a == b && self.key() == other.key(),
            _ => false,
        }
    }
}
