//! Reproducible pseudo-random command traffic.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tandem_core::{DeterministicCommand, PlayerId};

/// Seeded generator of [`DeterministicCommand`]s.
///
/// The same seed always yields the same sequence, so two kernels fed
/// from two streams with equal seeds must stay in agreement.
pub struct CommandStream {
    rng: ChaCha8Rng,
    players: u32,
    command_types: u32,
    next_sort: Vec<u32>,
}

impl CommandStream {
    /// `players` and `command_types` must be non-zero.
    pub fn new(seed: u64, players: u32, command_types: u32) -> Self {
        let players = players.max(1);
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            players,
            command_types: command_types.max(1),
            next_sort: vec![0; players as usize],
        }
    }

    /// Next command. Sort numbers increase per player; payloads are 0..16
    /// random bytes.
    pub fn next_command(&mut self) -> DeterministicCommand {
        let player_id: PlayerId = self.rng.gen_range(0..self.players);
        let command_type = self.rng.gen_range(0..self.command_types);
        let slot = &mut self.next_sort[player_id as usize];
        let sort_number = *slot;
        *slot += 1;

        let len = self.rng.gen_range(0..16usize);
        let payload: Vec<u8> = (0..len).map(|_| self.rng.gen()).collect();
        DeterministicCommand::new(command_type, player_id, sort_number).with_payload(payload)
    }

    /// The next `n` commands.
    pub fn take_commands(&mut self, n: usize) -> Vec<DeterministicCommand> {
        (0..n).map(|_| self.next_command()).collect()
    }

    /// `len` random bytes, for chunking tests.
    pub fn bytes(&mut self, len: usize) -> Vec<u8> {
        (0..len).map(|_| self.rng.gen()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_seeds_equal_streams() {
        let a = CommandStream::new(7, 3, 4).take_commands(50);
        let b = CommandStream::new(7, 3, 4).take_commands(50);
        assert_eq!(a, b);
    }

    #[test]
    fn sort_numbers_increase_per_player() {
        let cmds = CommandStream::new(1, 2, 2).take_commands(40);
        for player in 0..2 {
            let sorts: Vec<u32> = cmds
                .iter()
                .filter(|c| c.player_id == player)
                .map(|c| c.sort_number)
                .collect();
            assert!(sorts.windows(2).all(|w| w[0] + 1 == w[1]));
        }
    }
}
