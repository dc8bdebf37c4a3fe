//! Hash providers, CRC section writers, and the canonical section order.
//!
//! The simulation layer plugs two things into the kernel:
//!
//! - a [`FrameHashProvider`], a cheap partial-state hash computed every
//!   frame;
//! - a [`GameLogicCrcSectionWriters`] set, which serializes full state into
//!   a [`CrcAccumulator`] one section at a time.
//!
//! Section order is part of the protocol. The accumulator is order
//! sensitive, so a peer that writes sections in any other order produces
//! a checksum that is self-consistent but never matches the others.

use std::fmt;

use tandem_core::FrameSnapshot;
use tandem_crc::{CrcAccumulator, CrcError};

use crate::config::GameLogicCrcOptions;
use crate::error::KernelError;

/// Cheap per-frame hash over a snapshot.
pub type FrameHashProvider = Box<dyn Fn(&FrameSnapshot) -> u32 + Send>;

/// One slice of the GameLogic CRC, in canonical write order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CrcSection {
    /// Every live simulation object.
    Objects,
    /// The random generator checksum, written by the kernel itself.
    RandomSeed,
    /// Spatial partition state.
    PartitionManager,
    /// Module factory state. Only written when explicitly requested.
    ModuleFactory,
    /// Player list state.
    PlayerList,
    /// AI state.
    Ai,
}

impl CrcSection {
    /// The order every peer writes sections in.
    pub const CANONICAL_ORDER: [CrcSection; 6] = [
        CrcSection::Objects,
        CrcSection::RandomSeed,
        CrcSection::PartitionManager,
        CrcSection::ModuleFactory,
        CrcSection::PlayerList,
        CrcSection::Ai,
    ];

    /// Stable display name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Objects => "Objects",
            Self::RandomSeed => "RandomSeed",
            Self::PartitionManager => "PartitionManager",
            Self::ModuleFactory => "ModuleFactory",
            Self::PlayerList => "PlayerList",
            Self::Ai => "AI",
        }
    }
}

impl fmt::Display for CrcSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Serializes one logical slice of simulation state into the checksum.
///
/// Writers must be pure with respect to the snapshot and the simulation
/// state they read: calling one twice for the same frame must fold the
/// same bytes. Closures with the matching signature implement this trait.
pub trait CrcSectionWriter: Send {
    /// Fold this section's bytes into `crc`.
    fn write_section(
        &self,
        crc: &mut CrcAccumulator,
        snapshot: &FrameSnapshot,
    ) -> Result<(), CrcError>;
}

impl<F> CrcSectionWriter for F
where
    F: Fn(&mut CrcAccumulator, &FrameSnapshot) -> Result<(), CrcError> + Send,
{
    fn write_section(
        &self,
        crc: &mut CrcAccumulator,
        snapshot: &FrameSnapshot,
    ) -> Result<(), CrcError> {
        self(crc, snapshot)
    }
}

/// The simulation layer's GameLogic CRC section writers.
///
/// The RandomSeed section has no writer: the kernel folds
/// [`FrameSnapshot::random_seed_crc`] itself.
pub struct GameLogicCrcSectionWriters {
    /// Writes [`CrcSection::Objects`].
    pub objects: Box<dyn CrcSectionWriter>,
    /// Writes [`CrcSection::PartitionManager`].
    pub partition_manager: Box<dyn CrcSectionWriter>,
    /// Writes [`CrcSection::PlayerList`].
    pub player_list: Box<dyn CrcSectionWriter>,
    /// Writes [`CrcSection::Ai`].
    pub ai: Box<dyn CrcSectionWriter>,
    /// Writes [`CrcSection::ModuleFactory`] when opted in.
    pub module_factory: Option<Box<dyn CrcSectionWriter>>,
}

impl GameLogicCrcSectionWriters {
    /// Bundle the four mandatory writers.
    pub fn new(
        objects: impl CrcSectionWriter + 'static,
        partition_manager: impl CrcSectionWriter + 'static,
        player_list: impl CrcSectionWriter + 'static,
        ai: impl CrcSectionWriter + 'static,
    ) -> Self {
        Self {
            objects: Box::new(objects),
            partition_manager: Box::new(partition_manager),
            player_list: Box::new(player_list),
            ai: Box::new(ai),
            module_factory: None,
        }
    }

    /// Install the optional module-factory writer.
    pub fn with_module_factory(mut self, writer: impl CrcSectionWriter + 'static) -> Self {
        self.module_factory = Some(Box::new(writer));
        self
    }

    /// Fold every section for `snapshot` in canonical order.
    ///
    /// The module-factory section is written only when
    /// `opts.include_module_factory` is set; requesting it without a
    /// writer installed fails with [`KernelError::MissingSectionWriter`].
    pub fn compute(
        &self,
        snapshot: &FrameSnapshot,
        opts: GameLogicCrcOptions,
    ) -> Result<u32, KernelError> {
        let mut crc = CrcAccumulator::new();

        for section in CrcSection::CANONICAL_ORDER {
            let writer: &dyn CrcSectionWriter = match section {
                CrcSection::Objects => self.objects.as_ref(),
                CrcSection::RandomSeed => {
                    crc.write_u32(snapshot.random_seed_crc);
                    continue;
                }
                CrcSection::PartitionManager => self.partition_manager.as_ref(),
                CrcSection::ModuleFactory => {
                    if !opts.include_module_factory {
                        continue;
                    }
                    self.module_factory
                        .as_deref()
                        .ok_or(KernelError::MissingSectionWriter { section })?
                }
                CrcSection::PlayerList => self.player_list.as_ref(),
                CrcSection::Ai => self.ai.as_ref(),
            };

            writer
                .write_section(&mut crc, snapshot)
                .map_err(|source| KernelError::SectionFailed { section, source })?;
        }

        Ok(crc.crc())
    }
}

impl fmt::Debug for GameLogicCrcSectionWriters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameLogicCrcSectionWriters")
            .field("module_factory", &self.module_factory.is_some())
            .finish_non_exhaustive()
    }
}
