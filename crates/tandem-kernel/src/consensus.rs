//! Multi-peer GameLogic CRC agreement for a single frame.

use std::collections::BTreeMap;

use smallvec::SmallVec;
use tandem_core::{FrameNumber, PlayerId};

/// Player id list sized for typical lobby counts without allocating.
pub type PlayerIds = SmallVec<[PlayerId; 8]>;

/// Outcome of a consensus evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConsensusStatus {
    /// At least one expected player has not reported yet.
    Pending,
    /// Every expected player agrees with the validator.
    Match,
    /// At least one expected player disagrees with the validator.
    Mismatch,
}

/// Per-frame agreement report across the expected players.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsensusResult {
    /// Frame evaluated.
    pub frame: FrameNumber,
    /// Players the caller expects to report, in caller order.
    pub expected_player_ids: PlayerIds,
    /// Expected players with an observed value, in caller order.
    pub observed_player_ids: PlayerIds,
    /// Expected players with no observed value, in caller order.
    pub missing_player_ids: PlayerIds,
    /// Observed players whose value differs from the validator's.
    pub mismatched_player_ids: PlayerIds,
    /// Value of the first observed expected player. `None` while pending.
    pub validator_crc: Option<u32>,
    /// Overall status.
    pub status: ConsensusStatus,
}

/// Compare every expected player's value against the first observed one.
///
/// The local player's slot is filled from `local` rather than from the
/// remote table. An empty expected list is always `Pending`: there is
/// nothing to agree on yet.
pub(crate) fn evaluate(
    frame: FrameNumber,
    expected_player_ids: &[PlayerId],
    local_player_id: Option<PlayerId>,
    local: Option<u32>,
    remote: Option<&BTreeMap<PlayerId, u32>>,
) -> ConsensusResult {
    let observed_value = |player_id: PlayerId| -> Option<u32> {
        if Some(player_id) == local_player_id {
            local
        } else {
            remote.and_then(|table| table.get(&player_id).copied())
        }
    };

    let mut observed = Vec::with_capacity(expected_player_ids.len());
    let mut result = ConsensusResult {
        frame,
        expected_player_ids: expected_player_ids.iter().copied().collect(),
        observed_player_ids: PlayerIds::new(),
        missing_player_ids: PlayerIds::new(),
        mismatched_player_ids: PlayerIds::new(),
        validator_crc: None,
        status: ConsensusStatus::Pending,
    };

    for &player_id in expected_player_ids {
        match observed_value(player_id) {
            Some(value) => {
                result.observed_player_ids.push(player_id);
                observed.push((player_id, value));
            }
            None => result.missing_player_ids.push(player_id),
        }
    }

    if expected_player_ids.is_empty() || !result.missing_player_ids.is_empty() {
        return result;
    }

    let Some(&(_, validator)) = observed.first() else {
        return result;
    };
    result.validator_crc = Some(validator);
    result.mismatched_player_ids = observed
        .iter()
        .filter(|(_, value)| *value != validator)
        .map(|(player_id, _)| *player_id)
        .collect();
    result.status = if result.mismatched_player_ids.is_empty() {
        ConsensusStatus::Match
    } else {
        ConsensusStatus::Mismatch
    };
    result
}
