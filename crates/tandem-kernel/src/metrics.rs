//! Cumulative counters for the state kernel.
//!
//! [`KernelMetrics`] is updated in place by every mutating kernel call
//! and zeroed by `reset()`. Hosts read it for telemetry or to decide
//! when to request a resync.

/// Counters accumulated since construction or the last reset.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KernelMetrics {
    /// Number of `advance_frame()` calls.
    pub frames_advanced: u64,
    /// Object ids handed out.
    pub objects_allocated: u64,
    /// Commands accepted into the queue.
    pub commands_enqueued: u64,
    /// Commands rejected as redeliveries of a queued dedupe tuple.
    pub duplicate_commands_ignored: u64,
    /// Commands removed by `drain_commands()`.
    pub commands_drained: u64,
    /// Newly flagged frame hash mismatches.
    pub frame_hash_mismatches: u64,
    /// Newly flagged GameLogic CRC mismatches.
    pub game_logic_crc_mismatches: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metrics_are_zero() {
        let m = KernelMetrics::default();
        assert_eq!(m.frames_advanced, 0);
        assert_eq!(m.objects_allocated, 0);
        assert_eq!(m.commands_enqueued, 0);
        assert_eq!(m.duplicate_commands_ignored, 0);
        assert_eq!(m.commands_drained, 0);
        assert_eq!(m.frame_hash_mismatches, 0);
        assert_eq!(m.game_logic_crc_mismatches, 0);
    }

    #[test]
    fn metrics_clone_is_independent() {
        let mut m = KernelMetrics {
            commands_enqueued: 3,
            ..Default::default()
        };
        let snapshot = m.clone();
        m.commands_enqueued += 1;
        assert_eq!(snapshot.commands_enqueued, 3);
        assert_ne!(snapshot, m);
    }
}
