//! Archive retention configuration.

use serde::Deserialize;

/// Furthest a peer may run ahead of the slowest confirmed frame.
pub const MAX_FRAMES_AHEAD: u32 = 128;

/// Default retention window: half the lead window plus the current frame.
pub const SOURCE_FRAMES_TO_KEEP: u32 = MAX_FRAMES_AHEAD / 2 + 1;

/// Errors detected by [`ArchiveConfig::validate()`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ArchiveError {
    /// A zero-length window could never serve a resend.
    #[error("frames_to_keep must be at least 1")]
    EmptyWindow,
}

/// Retention settings for a [`FrameResendArchive`](crate::FrameResendArchive).
///
/// Deserializable so hosts can load it alongside their own settings;
/// missing fields take their defaults.
///
/// ```
/// use tandem_resend::ArchiveConfig;
///
/// let config = ArchiveConfig::default();
/// assert_eq!(config.frames_to_keep, 65);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// How many trailing frames a resend plan may reach back.
    pub frames_to_keep: u32,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            frames_to_keep: SOURCE_FRAMES_TO_KEEP,
        }
    }
}

impl ArchiveConfig {
    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ArchiveError> {
        if self.frames_to_keep == 0 {
            return Err(ArchiveError::EmptyWindow);
        }
        Ok(())
    }
}
