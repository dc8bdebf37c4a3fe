//! Kernel configuration, reset options, and configuration errors.
//!
//! [`KernelConfig`] is the single place the simulation layer wires its
//! hash provider and CRC section writers into the kernel. There are no
//! process-wide registries: everything the kernel calls back into is
//! owned by the kernel instance.

use std::fmt;

use tandem_core::{FrameNumber, MAX_OBJECT_ID, MIN_OBJECT_ID};

use crate::hashing::{FrameHashProvider, GameLogicCrcSectionWriters};

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected by [`KernelConfig::validate()`] and
/// [`StateKernel::reset()`](crate::StateKernel::reset).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The starting object id lies outside `[MIN_OBJECT_ID, MAX_OBJECT_ID]`.
    #[error("next object id {value} outside [1, 0x07FFFFFF]")]
    ObjectIdOutOfRange {
        /// The rejected value.
        value: u32,
    },
}

fn check_object_id(value: u32) -> Result<(), ConfigError> {
    if (MIN_OBJECT_ID..=MAX_OBJECT_ID).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::ObjectIdOutOfRange { value })
    }
}

// ── KernelConfig ───────────────────────────────────────────────────

/// Construction input for [`StateKernel`](crate::StateKernel).
///
/// Hashing is optional: a kernel without a provider or section writers
/// is valid and simply reports "not wired" from its compute methods.
pub struct KernelConfig {
    /// Frame the kernel starts at. Default: 0.
    pub initial_frame: FrameNumber,
    /// First object id handed out. Default: 1.
    pub initial_next_object_id: u32,
    /// Initial random generator checksum. Default: 0.
    pub initial_random_seed_crc: u32,
    /// Lightweight per-frame hash.
    pub frame_hash_provider: Option<FrameHashProvider>,
    /// Full-state GameLogic CRC writers.
    pub section_writers: Option<GameLogicCrcSectionWriters>,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            initial_frame: 0,
            initial_next_object_id: MIN_OBJECT_ID,
            initial_random_seed_crc: 0,
            frame_hash_provider: None,
            section_writers: None,
        }
    }
}

impl KernelConfig {
    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_object_id(self.initial_next_object_id)
    }
}

impl fmt::Debug for KernelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KernelConfig")
            .field("initial_frame", &self.initial_frame)
            .field("initial_next_object_id", &self.initial_next_object_id)
            .field("initial_random_seed_crc", &self.initial_random_seed_crc)
            .field("frame_hash_provider", &self.frame_hash_provider.is_some())
            .field("section_writers", &self.section_writers)
            .finish()
    }
}

// ── ResetOptions ───────────────────────────────────────────────────

/// Values to restore on [`StateKernel::reset()`](crate::StateKernel::reset).
///
/// Each `None` falls back to the value the kernel was constructed with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResetOptions {
    /// Frame to restart at.
    pub frame: Option<FrameNumber>,
    /// Next object id to hand out.
    pub next_object_id: Option<u32>,
    /// Random generator checksum.
    pub random_seed_crc: Option<u32>,
}

/// Starting counters, kept so `reset()` can restore them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct InitialCounters {
    pub frame: FrameNumber,
    pub next_object_id: u32,
    pub random_seed_crc: u32,
}

impl InitialCounters {
    pub(crate) fn resolve(&self, opts: ResetOptions) -> Result<Self, ConfigError> {
        let resolved = Self {
            frame: opts.frame.unwrap_or(self.frame),
            next_object_id: opts.next_object_id.unwrap_or(self.next_object_id),
            random_seed_crc: opts.random_seed_crc.unwrap_or(self.random_seed_crc),
        };
        check_object_id(resolved.next_object_id)?;
        Ok(resolved)
    }
}

// ── GameLogicCrcOptions ────────────────────────────────────────────

/// Per-call options for GameLogic CRC computation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GameLogicCrcOptions {
    /// Write the module-factory section between PartitionManager and
    /// PlayerList. Every peer must agree on this flag.
    pub include_module_factory: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = KernelConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.initial_next_object_id, 1);
    }

    #[test]
    fn zero_object_id_rejected() {
        let config = KernelConfig {
            initial_next_object_id: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::ObjectIdOutOfRange { value: 0 })
        );
    }

    #[test]
    fn object_id_above_bound_rejected() {
        let config = KernelConfig {
            initial_next_object_id: MAX_OBJECT_ID + 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn reset_options_fall_back_to_initial_values() {
        let initial = InitialCounters {
            frame: 5,
            next_object_id: 9,
            random_seed_crc: 7,
        };
        let resolved = initial
            .resolve(ResetOptions {
                frame: Some(0),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(resolved.frame, 0);
        assert_eq!(resolved.next_object_id, 9);
        assert_eq!(resolved.random_seed_crc, 7);
    }
}
