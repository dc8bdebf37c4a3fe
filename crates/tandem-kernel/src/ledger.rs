//! Local/remote checksum tables with mismatch bookkeeping.
//!
//! The kernel keeps two independent ledgers, one for frame hashes and
//! one for GameLogic CRCs. A `(frame, player)` pair is flagged at most
//! once, so listeners never see the same divergence twice.

use std::collections::{BTreeMap, BTreeSet};

use tandem_core::{FrameNumber, PlayerId};

/// A newly flagged disagreement between the local value and one peer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Divergence {
    pub frame: FrameNumber,
    pub player_id: PlayerId,
    pub local: u32,
    pub remote: u32,
}

#[derive(Debug, Default)]
pub(crate) struct HashLedger {
    local: BTreeMap<FrameNumber, u32>,
    remote: BTreeMap<FrameNumber, BTreeMap<PlayerId, u32>>,
    mismatched: BTreeMap<FrameNumber, BTreeSet<PlayerId>>,
}

impl HashLedger {
    /// Store the local value and compare it against every remote report
    /// already received for `frame`, in ascending player order.
    pub fn record_local(&mut self, frame: FrameNumber, value: u32) -> Vec<Divergence> {
        self.local.insert(frame, value);

        let Some(reports) = self.remote.get(&frame) else {
            return Vec::new();
        };

        let flags = self.mismatched.entry(frame).or_default();
        let mut newly = Vec::new();
        for (&player_id, &remote) in reports {
            if remote != value && flags.insert(player_id) {
                newly.push(Divergence {
                    frame,
                    player_id,
                    local: value,
                    remote,
                });
            }
        }
        newly
    }

    /// Store a peer's value; compare immediately if the local value exists.
    pub fn record_remote(
        &mut self,
        frame: FrameNumber,
        player_id: PlayerId,
        value: u32,
    ) -> Option<Divergence> {
        self.remote.entry(frame).or_default().insert(player_id, value);

        let local = *self.local.get(&frame)?;
        if local != value && self.flag(frame, player_id) {
            Some(Divergence {
                frame,
                player_id,
                local,
                remote: value,
            })
        } else {
            None
        }
    }

    /// Returns `true` if the pair was not flagged before.
    fn flag(&mut self, frame: FrameNumber, player_id: PlayerId) -> bool {
        self.mismatched.entry(frame).or_default().insert(player_id)
    }

    pub fn local(&self, frame: FrameNumber) -> Option<u32> {
        self.local.get(&frame).copied()
    }

    pub fn remote(&self, frame: FrameNumber) -> Option<&BTreeMap<PlayerId, u32>> {
        self.remote.get(&frame)
    }

    pub fn mismatched_frames(&self) -> Vec<FrameNumber> {
        self.mismatched
            .iter()
            .filter(|(_, players)| !players.is_empty())
            .map(|(&frame, _)| frame)
            .collect()
    }

    #[cfg(test)]
    pub fn is_mismatched(&self, frame: FrameNumber, player_id: PlayerId) -> bool {
        self.mismatched
            .get(&frame)
            .is_some_and(|players| players.contains(&player_id))
    }

    /// Drop every record for frames strictly below `min_frame`.
    pub fn prune_before(&mut self, min_frame: FrameNumber) {
        self.local = self.local.split_off(&min_frame);
        self.remote = self.remote.split_off(&min_frame);
        self.mismatched = self.mismatched.split_off(&min_frame);
    }

    pub fn clear(&mut self) {
        self.local.clear();
        self.remote.clear();
        self.mismatched.clear();
    }

    pub fn frames_tracked(&self) -> usize {
        let mut frames: BTreeSet<FrameNumber> = self.local.keys().copied().collect();
        frames.extend(self.remote.keys().copied());
        frames.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_values_never_flag() {
        let mut ledger = HashLedger::default();
        assert!(ledger.record_local(5, 0xAA).is_empty());
        assert_eq!(ledger.record_remote(5, 1, 0xAA), None);
        assert!(ledger.mismatched_frames().is_empty());
    }

    #[test]
    fn remote_before_local_is_compared_on_local_record() {
        let mut ledger = HashLedger::default();
        assert_eq!(ledger.record_remote(5, 1, 0xBB), None);
        assert_eq!(ledger.record_remote(5, 2, 0xAA), None);

        let flagged = ledger.record_local(5, 0xAA);
        assert_eq!(
            flagged,
            vec![Divergence {
                frame: 5,
                player_id: 1,
                local: 0xAA,
                remote: 0xBB
            }]
        );
        assert!(ledger.is_mismatched(5, 1));
        assert!(!ledger.is_mismatched(5, 2));
    }

    #[test]
    fn a_pair_is_flagged_once() {
        let mut ledger = HashLedger::default();
        ledger.record_local(5, 0xAA);
        assert!(ledger.record_remote(5, 1, 0xBB).is_some());
        assert!(ledger.record_remote(5, 1, 0xBB).is_none());
        assert!(ledger.record_remote(5, 1, 0xCC).is_none());
        assert!(ledger.record_local(5, 0xAA).is_empty());
    }

    #[test]
    fn prune_is_strictly_below() {
        let mut ledger = HashLedger::default();
        for frame in 0..6 {
            ledger.record_local(frame, frame);
            ledger.record_remote(frame, 1, frame + 100);
        }
        ledger.prune_before(3);

        assert_eq!(ledger.local(2), None);
        assert!(ledger.remote(2).is_none());
        assert_eq!(ledger.local(3), Some(3));
        assert!(ledger.remote(3).is_some());
        assert_eq!(ledger.mismatched_frames(), vec![3, 4, 5]);
        assert_eq!(ledger.frames_tracked(), 3);
    }
}
