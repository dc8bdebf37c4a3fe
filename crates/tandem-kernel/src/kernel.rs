//! The deterministic state kernel.
//!
//! [`StateKernel`] is the single owner of lockstep state for one session.
//! All mutating methods take `&mut self`; there is no interior mutability
//! and no internal locking. A multi-threaded host wraps the kernel in one
//! `Mutex`.

use std::collections::BTreeMap;
use std::fmt;

use tandem_core::{
    DeterministicCommand, FrameNumber, FrameSnapshot, ObjectId, PlayerId, MAX_OBJECT_ID,
    MIN_OBJECT_ID,
};

use crate::config::{ConfigError, GameLogicCrcOptions, InitialCounters, KernelConfig, ResetOptions};
use crate::consensus::{self, ConsensusResult};
use crate::error::KernelError;
use crate::events::{FrameHashMismatch, GameLogicCrcMismatch, ListenerId, Listeners};
use crate::hashing::{FrameHashProvider, GameLogicCrcSectionWriters};
use crate::ledger::{Divergence, HashLedger};
use crate::metrics::KernelMetrics;
use crate::queue::CommandQueue;

// Fails to compile if any field stops being Send.
const _: () = {
    #[allow(dead_code)]
    fn assert_send<T: Send>() {}
    #[allow(dead_code)]
    fn check() {
        assert_send::<StateKernel>();
    }
};

// ── StateKernel ────────────────────────────────────────────────────

/// Frame counter, object-id allocator, command queue, and checksum
/// ledgers for one lockstep session.
///
/// # Example
///
/// ```
/// use tandem_core::{DeterministicCommand, FrameSnapshot};
/// use tandem_kernel::{KernelConfig, StateKernel};
///
/// let mut kernel = StateKernel::new(KernelConfig {
///     frame_hash_provider: Some(Box::new(|snap: &FrameSnapshot| snap.frame ^ snap.next_object_id)),
///     ..Default::default()
/// })
/// .unwrap();
///
/// kernel.enqueue_command(DeterministicCommand::new(1, 0, 0));
/// let hash = kernel.record_local_frame_hash(None, None);
/// assert_eq!(hash, Some(1));
///
/// kernel.advance_frame();
/// assert_eq!(kernel.frame(), 1);
/// ```
pub struct StateKernel {
    initial: InitialCounters,
    frame: FrameNumber,
    next_object_id: u32,
    random_seed_crc: u32,
    queue: CommandQueue,
    frame_hashes: HashLedger,
    game_logic_crcs: HashLedger,
    frame_hash_provider: Option<FrameHashProvider>,
    section_writers: Option<GameLogicCrcSectionWriters>,
    frame_hash_listeners: Listeners<FrameHashMismatch>,
    game_logic_crc_listeners: Listeners<GameLogicCrcMismatch>,
    metrics: KernelMetrics,
}

impl StateKernel {
    /// Create a kernel from a validated [`KernelConfig`].
    pub fn new(config: KernelConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let initial = InitialCounters {
            frame: config.initial_frame,
            next_object_id: config.initial_next_object_id,
            random_seed_crc: config.initial_random_seed_crc,
        };
        Ok(Self::from_parts(
            initial,
            config.frame_hash_provider,
            config.section_writers,
        ))
    }

    fn from_parts(
        initial: InitialCounters,
        frame_hash_provider: Option<FrameHashProvider>,
        section_writers: Option<GameLogicCrcSectionWriters>,
    ) -> Self {
        Self {
            initial,
            frame: initial.frame,
            next_object_id: initial.next_object_id,
            random_seed_crc: initial.random_seed_crc,
            queue: CommandQueue::new(),
            frame_hashes: HashLedger::default(),
            game_logic_crcs: HashLedger::default(),
            frame_hash_provider,
            section_writers,
            frame_hash_listeners: Listeners::default(),
            game_logic_crc_listeners: Listeners::default(),
            metrics: KernelMetrics::default(),
        }
    }

    // ── Counters ───────────────────────────────────────────────────

    /// Move to the next frame.
    pub fn advance_frame(&mut self) -> FrameNumber {
        self.frame = self.frame.wrapping_add(1);
        self.metrics.frames_advanced += 1;
        self.frame
    }

    /// Hand out the next object id.
    ///
    /// # Errors
    ///
    /// [`KernelError::IdSpaceExhausted`] once `MAX_OBJECT_ID` has been
    /// handed out. The counter is left unchanged.
    pub fn allocate_object_id(&mut self) -> Result<ObjectId, KernelError> {
        let id = self.next_object_id;
        if id > MAX_OBJECT_ID {
            return Err(KernelError::IdSpaceExhausted { next: id });
        }
        self.next_object_id = id + 1;
        self.metrics.objects_allocated += 1;
        Ok(ObjectId(id))
    }

    /// Current frame.
    pub fn frame(&self) -> FrameNumber {
        self.frame
    }

    /// Id the next `allocate_object_id()` call will return.
    pub fn next_object_id(&self) -> u32 {
        self.next_object_id
    }

    /// Random generator checksum captured in snapshots.
    pub fn random_seed_crc(&self) -> u32 {
        self.random_seed_crc
    }

    /// Update the random generator checksum, typically once per frame.
    pub fn set_random_seed_crc(&mut self, crc: u32) {
        self.random_seed_crc = crc;
    }

    // ── Command queue ──────────────────────────────────────────────

    /// Queue a command at its canonical position.
    ///
    /// Returns `false` if a command with the same dedupe tuple is already
    /// queued; the queue is not modified in that case.
    pub fn enqueue_command(&mut self, cmd: DeterministicCommand) -> bool {
        let key = cmd.key();
        if self.queue.insert(cmd) {
            self.metrics.commands_enqueued += 1;
            tracing::trace!(
                frame = self.frame,
                command_type = key.command_type,
                player_id = key.player_id,
                sort_number = key.sort_number,
                "command enqueued"
            );
            true
        } else {
            self.metrics.duplicate_commands_ignored += 1;
            tracing::trace!(
                frame = self.frame,
                command_type = key.command_type,
                player_id = key.player_id,
                "duplicate command ignored"
            );
            false
        }
    }

    /// Remove and return every queued command in canonical order.
    pub fn drain_commands(&mut self) -> Vec<DeterministicCommand> {
        let drained = self.queue.drain();
        self.metrics.commands_drained += drained.len() as u64;
        drained
    }

    /// Queued commands in canonical order, without removing them.
    pub fn peek_commands(&self) -> &[DeterministicCommand] {
        self.queue.peek()
    }

    /// Number of queued commands.
    pub fn queued_len(&self) -> usize {
        self.queue.len()
    }

    // ── Snapshots and hashing ──────────────────────────────────────

    /// Capture the current counters and queue. `frame` overrides the
    /// frame number recorded in the snapshot.
    pub fn create_snapshot(&self, frame: Option<FrameNumber>) -> FrameSnapshot {
        FrameSnapshot {
            frame: frame.unwrap_or(self.frame),
            next_object_id: self.next_object_id,
            random_seed_crc: self.random_seed_crc,
            commands: self.queue.peek().to_vec(),
        }
    }

    /// Run the frame hash provider. `None` if no provider is installed.
    pub fn compute_frame_hash(&self, frame: Option<FrameNumber>) -> Option<u32> {
        let provider = self.frame_hash_provider.as_ref()?;
        Some(provider(&self.create_snapshot(frame)))
    }

    /// Run the GameLogic CRC section writers.
    ///
    /// `Ok(None)` means no writers are installed, which is normal during
    /// startup wiring.
    pub fn compute_game_logic_crc(
        &self,
        frame: Option<FrameNumber>,
        opts: GameLogicCrcOptions,
    ) -> Result<Option<u32>, KernelError> {
        let Some(writers) = self.section_writers.as_ref() else {
            return Ok(None);
        };
        writers.compute(&self.create_snapshot(frame), opts).map(Some)
    }

    /// Install or replace the frame hash provider.
    pub fn set_frame_hash_provider(&mut self, provider: Option<FrameHashProvider>) {
        self.frame_hash_provider = provider;
    }

    /// Install or replace the GameLogic CRC section writers.
    pub fn set_game_logic_crc_section_writers(
        &mut self,
        writers: Option<GameLogicCrcSectionWriters>,
    ) {
        self.section_writers = writers;
    }

    // ── Frame hash ledger ──────────────────────────────────────────

    /// Store the local frame hash and compare it with remote reports.
    ///
    /// With `hash = None` the provider computes it. Returns the stored
    /// value, or `None` when nothing was supplied and no provider is
    /// installed (nothing is recorded then).
    pub fn record_local_frame_hash(
        &mut self,
        frame: Option<FrameNumber>,
        hash: Option<u32>,
    ) -> Option<u32> {
        let frame = frame.unwrap_or(self.frame);
        let hash = match hash {
            Some(hash) => hash,
            None => self.compute_frame_hash(Some(frame))?,
        };
        tracing::trace!(frame, hash, "local frame hash recorded");
        let flagged = self.frame_hashes.record_local(frame, hash);
        for divergence in flagged {
            self.report_frame_hash_mismatch(divergence);
        }
        Some(hash)
    }

    /// Store a peer's frame hash. Returns `true` if this report newly
    /// flagged a mismatch.
    pub fn record_remote_frame_hash(
        &mut self,
        frame: FrameNumber,
        player_id: PlayerId,
        hash: u32,
    ) -> bool {
        match self.frame_hashes.record_remote(frame, player_id, hash) {
            Some(divergence) => {
                self.report_frame_hash_mismatch(divergence);
                true
            }
            None => false,
        }
    }

    /// Locally recorded frame hash for `frame`.
    pub fn local_frame_hash(&self, frame: FrameNumber) -> Option<u32> {
        self.frame_hashes.local(frame)
    }

    /// Remote frame hashes for `frame`, keyed by player.
    pub fn remote_frame_hashes(&self, frame: FrameNumber) -> Option<&BTreeMap<PlayerId, u32>> {
        self.frame_hashes.remote(frame)
    }

    /// Frames with at least one flagged frame hash mismatch, ascending.
    pub fn frame_hash_mismatch_frames(&self) -> Vec<FrameNumber> {
        self.frame_hashes.mismatched_frames()
    }

    fn report_frame_hash_mismatch(&mut self, d: Divergence) {
        self.metrics.frame_hash_mismatches += 1;
        tracing::warn!(
            frame = d.frame,
            player_id = d.player_id,
            local = format_args!("{:#010x}", d.local),
            remote = format_args!("{:#010x}", d.remote),
            "frame hash mismatch"
        );
        self.frame_hash_listeners.emit(&FrameHashMismatch {
            frame: d.frame,
            player_id: d.player_id,
            local_hash: d.local,
            remote_hash: d.remote,
        });
    }

    // ── GameLogic CRC ledger ───────────────────────────────────────

    /// Store the local GameLogic CRC and compare it with remote reports.
    ///
    /// With `crc = None` the section writers compute it. `Ok(None)` means
    /// nothing was supplied and no writers are installed.
    pub fn record_local_game_logic_crc(
        &mut self,
        frame: Option<FrameNumber>,
        crc: Option<u32>,
        opts: GameLogicCrcOptions,
    ) -> Result<Option<u32>, KernelError> {
        let frame = frame.unwrap_or(self.frame);
        let crc = match crc {
            Some(crc) => crc,
            None => match self.compute_game_logic_crc(Some(frame), opts)? {
                Some(crc) => crc,
                None => return Ok(None),
            },
        };
        tracing::trace!(frame, crc, "local game logic crc recorded");
        let flagged = self.game_logic_crcs.record_local(frame, crc);
        for divergence in flagged {
            self.report_game_logic_crc_mismatch(divergence);
        }
        Ok(Some(crc))
    }

    /// Store a peer's GameLogic CRC. Returns `true` if this report newly
    /// flagged a mismatch.
    pub fn record_remote_game_logic_crc(
        &mut self,
        frame: FrameNumber,
        player_id: PlayerId,
        crc: u32,
    ) -> bool {
        match self.game_logic_crcs.record_remote(frame, player_id, crc) {
            Some(divergence) => {
                self.report_game_logic_crc_mismatch(divergence);
                true
            }
            None => false,
        }
    }

    /// Locally recorded GameLogic CRC for `frame`.
    pub fn local_game_logic_crc(&self, frame: FrameNumber) -> Option<u32> {
        self.game_logic_crcs.local(frame)
    }

    /// Remote GameLogic CRCs for `frame`, keyed by player.
    pub fn remote_game_logic_crcs(
        &self,
        frame: FrameNumber,
    ) -> Option<&BTreeMap<PlayerId, u32>> {
        self.game_logic_crcs.remote(frame)
    }

    /// Frames with at least one flagged GameLogic CRC mismatch, ascending.
    pub fn game_logic_crc_mismatch_frames(&self) -> Vec<FrameNumber> {
        self.game_logic_crcs.mismatched_frames()
    }

    /// Evaluate agreement on `frame` across `expected_player_ids`.
    ///
    /// The slot for `local_player_id` uses the locally recorded CRC; every
    /// other slot uses the remote table. See [`ConsensusResult`].
    pub fn evaluate_game_logic_crc_consensus(
        &self,
        frame: FrameNumber,
        expected_player_ids: &[PlayerId],
        local_player_id: Option<PlayerId>,
    ) -> ConsensusResult {
        consensus::evaluate(
            frame,
            expected_player_ids,
            local_player_id,
            self.game_logic_crcs.local(frame),
            self.game_logic_crcs.remote(frame),
        )
    }

    fn report_game_logic_crc_mismatch(&mut self, d: Divergence) {
        self.metrics.game_logic_crc_mismatches += 1;
        tracing::warn!(
            frame = d.frame,
            player_id = d.player_id,
            local = format_args!("{:#010x}", d.local),
            remote = format_args!("{:#010x}", d.remote),
            "game logic crc mismatch"
        );
        self.game_logic_crc_listeners.emit(&GameLogicCrcMismatch {
            frame: d.frame,
            player_id: d.player_id,
            local_crc: d.local,
            remote_crc: d.remote,
        });
    }

    // ── Pruning ────────────────────────────────────────────────────

    /// Drop frame hash records for frames strictly below `min_frame`.
    pub fn prune_frame_hashes_before(&mut self, min_frame: FrameNumber) {
        self.frame_hashes.prune_before(min_frame);
        tracing::debug!(
            min_frame,
            frames_tracked = self.frame_hashes.frames_tracked(),
            "pruned frame hashes"
        );
    }

    /// Drop GameLogic CRC records for frames strictly below `min_frame`.
    pub fn prune_game_logic_crc_before(&mut self, min_frame: FrameNumber) {
        self.game_logic_crcs.prune_before(min_frame);
        tracing::debug!(
            min_frame,
            frames_tracked = self.game_logic_crcs.frames_tracked(),
            "pruned game logic crcs"
        );
    }

    /// Prune both ledgers.
    pub fn prune_validation_before(&mut self, min_frame: FrameNumber) {
        self.prune_frame_hashes_before(min_frame);
        self.prune_game_logic_crc_before(min_frame);
    }

    // ── Listeners ──────────────────────────────────────────────────

    /// Register a frame hash mismatch listener.
    pub fn on_frame_hash_mismatch(
        &mut self,
        listener: impl FnMut(&FrameHashMismatch) + Send + 'static,
    ) -> ListenerId {
        self.frame_hash_listeners.subscribe(listener)
    }

    /// Remove a frame hash mismatch listener. Returns `false` if unknown.
    pub fn off_frame_hash_mismatch(&mut self, id: ListenerId) -> bool {
        self.frame_hash_listeners.unsubscribe(id)
    }

    /// Register a GameLogic CRC mismatch listener.
    pub fn on_game_logic_crc_mismatch(
        &mut self,
        listener: impl FnMut(&GameLogicCrcMismatch) + Send + 'static,
    ) -> ListenerId {
        self.game_logic_crc_listeners.subscribe(listener)
    }

    /// Remove a GameLogic CRC mismatch listener. Returns `false` if unknown.
    pub fn off_game_logic_crc_mismatch(&mut self, id: ListenerId) -> bool {
        self.game_logic_crc_listeners.unsubscribe(id)
    }

    // ── Lifecycle ──────────────────────────────────────────────────

    /// Restart the session without rebuilding the kernel.
    ///
    /// Counters take the supplied values or the ones the kernel was
    /// constructed with. The queue, both ledgers, and metrics are cleared.
    /// Listeners, the hash provider, and section writers are kept.
    ///
    /// # Errors
    ///
    /// [`ConfigError::ObjectIdOutOfRange`] if the resolved next object id
    /// is invalid. The kernel is not modified in that case.
    pub fn reset(&mut self, opts: ResetOptions) -> Result<(), ConfigError> {
        let counters = self.initial.resolve(opts)?;
        self.frame = counters.frame;
        self.next_object_id = counters.next_object_id;
        self.random_seed_crc = counters.random_seed_crc;
        self.queue.clear();
        self.frame_hashes.clear();
        self.game_logic_crcs.clear();
        self.metrics = KernelMetrics::default();
        tracing::debug!(
            frame = self.frame,
            next_object_id = self.next_object_id,
            "kernel reset"
        );
        Ok(())
    }

    /// Counters accumulated since construction or the last reset.
    pub fn metrics(&self) -> &KernelMetrics {
        &self.metrics
    }
}

impl Default for StateKernel {
    fn default() -> Self {
        let initial = InitialCounters {
            frame: 0,
            next_object_id: MIN_OBJECT_ID,
            random_seed_crc: 0,
        };
        Self::from_parts(initial, None, None)
    }
}

impl fmt::Debug for StateKernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateKernel")
            .field("frame", &self.frame)
            .field("next_object_id", &self.next_object_id)
            .field("random_seed_crc", &self.random_seed_crc)
            .field("queued", &self.queue.len())
            .field("frame_hash_provider", &self.frame_hash_provider.is_some())
            .field("section_writers", &self.section_writers)
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocation_is_monotonic_from_initial_value() {
        let mut kernel = StateKernel::default();
        assert_eq!(kernel.allocate_object_id(), Ok(ObjectId(1)));
        assert_eq!(kernel.allocate_object_id(), Ok(ObjectId(2)));
        assert_eq!(kernel.next_object_id(), 3);
        assert_eq!(kernel.metrics().objects_allocated, 2);
    }

    #[test]
    fn last_id_is_handed_out_then_exhausted() {
        let mut kernel = StateKernel::new(KernelConfig {
            initial_next_object_id: MAX_OBJECT_ID,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(kernel.allocate_object_id(), Ok(ObjectId(MAX_OBJECT_ID)));
        assert_eq!(
            kernel.allocate_object_id(),
            Err(KernelError::IdSpaceExhausted {
                next: MAX_OBJECT_ID + 1
            })
        );
        assert_eq!(kernel.next_object_id(), MAX_OBJECT_ID + 1);
    }

    #[test]
    fn invalid_config_rejected() {
        let err = StateKernel::new(KernelConfig {
            initial_next_object_id: 0,
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(err, ConfigError::ObjectIdOutOfRange { value: 0 });
    }

    #[test]
    fn unwired_hashing_is_none() {
        let mut kernel = StateKernel::default();
        assert_eq!(kernel.compute_frame_hash(None), None);
        assert_eq!(
            kernel.compute_game_logic_crc(None, GameLogicCrcOptions::default()),
            Ok(None)
        );
        assert_eq!(kernel.record_local_frame_hash(Some(3), None), None);
        assert_eq!(kernel.local_frame_hash(3), None);
    }

    #[test]
    fn snapshot_frame_override() {
        let mut kernel = StateKernel::default();
        kernel.advance_frame();
        kernel.set_random_seed_crc(0x55);
        kernel.enqueue_command(DeterministicCommand::new(1, 0, 0));

        let snap = kernel.create_snapshot(None);
        assert_eq!(snap.frame, 1);
        assert_eq!(snap.random_seed_crc, 0x55);
        assert_eq!(snap.commands.len(), 1);
        assert_eq!(kernel.create_snapshot(Some(9)).frame, 9);
        assert_eq!(kernel.queued_len(), 1);
    }

    #[test]
    fn reset_clears_state_and_restores_counters() {
        let mut kernel = StateKernel::new(KernelConfig {
            initial_frame: 10,
            initial_next_object_id: 100,
            initial_random_seed_crc: 7,
            ..Default::default()
        })
        .unwrap();
        kernel.advance_frame();
        kernel.allocate_object_id().unwrap();
        kernel.enqueue_command(DeterministicCommand::new(1, 0, 0));
        kernel.record_local_frame_hash(None, Some(1));
        kernel.record_remote_frame_hash(11, 2, 2);

        kernel.reset(ResetOptions::default()).unwrap();

        assert_eq!(kernel.frame(), 10);
        assert_eq!(kernel.next_object_id(), 100);
        assert_eq!(kernel.random_seed_crc(), 7);
        assert_eq!(kernel.queued_len(), 0);
        assert_eq!(kernel.local_frame_hash(11), None);
        assert!(kernel.frame_hash_mismatch_frames().is_empty());
        assert_eq!(kernel.metrics(), &KernelMetrics::default());
    }

    #[test]
    fn failed_reset_leaves_kernel_untouched() {
        let mut kernel = StateKernel::default();
        kernel.advance_frame();
        let err = kernel
            .reset(ResetOptions {
                next_object_id: Some(0),
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(err, ConfigError::ObjectIdOutOfRange { value: 0 });
        assert_eq!(kernel.frame(), 1);
    }
}
