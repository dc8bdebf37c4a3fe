//! Pending command queue with deterministic ordering and redelivery
//! suppression.
//!
//! [`CommandQueue`] buffers commands between submission and execution.
//! It is always kept sorted, so draining never needs a sort pass.
//!
//! # Ordering
//!
//! Commands are ordered by `(command_type, player_id, sort_number)`.
//! Equal keys keep submission order: a new command is inserted after
//! every queued command whose key is less than or equal to its own.
//!
//! Per-frame queues hold a handful of commands, so insertion is a linear
//! scan; stability matters more here than asymptotic cost.

use std::cmp::Ordering;

use tandem_core::DeterministicCommand;

/// Sorted pending-command buffer.
#[derive(Clone, Debug, Default)]
pub struct CommandQueue {
    commands: Vec<DeterministicCommand>,
}

impl CommandQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    /// Insert `cmd` at its sorted position.
    ///
    /// Returns `false` without modifying the queue if `cmd` carries a
    /// dedupe key and an identical `(command_type, player_id,
    /// sort_number, dedupe_key)` tuple is already queued.
    pub fn insert(&mut self, cmd: DeterministicCommand) -> bool {
        if cmd.dedupe_key.is_some() && self.commands.iter().any(|q| q.is_duplicate_of(&cmd)) {
            return false;
        }

        let pos = self
            .commands
            .iter()
            .position(|q| q.cmp_key(&cmd) == Ordering::Greater)
            .unwrap_or(self.commands.len());
        self.commands.insert(pos, cmd);
        true
    }

    /// Remove and return every queued command, in order.
    pub fn drain(&mut self) -> Vec<DeterministicCommand> {
        std::mem::take(&mut self.commands)
    }

    /// The queued commands, in order.
    pub fn peek(&self) -> &[DeterministicCommand] {
        &self.commands
    }

    /// Number of commands currently buffered.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Discard all pending commands.
    pub fn clear(&mut self) {
        self.commands.clear();
    }
}
