//! Identifiers shared by the kernel, the resend archive, and the wire codec.

use std::fmt;

/// A discrete simulation step. Frames increase monotonically for the
/// lifetime of a session; wraparound is not handled.
pub type FrameNumber = u32;

/// Per-session participant identifier.
///
/// Used only as a stable ordering and lookup key. Nothing in Tandem
/// assumes player ids are contiguous or zero-based.
pub type PlayerId = u32;

/// Smallest object id the allocator hands out. Zero means "no object".
pub const MIN_OBJECT_ID: u32 = 1;

/// Largest object id the allocator hands out. The upper bits are reserved
/// by the simulation layer, so the id space is 27 bits wide.
pub const MAX_OBJECT_ID: u32 = 0x07FF_FFFF;

/// Identifies a simulation entity.
///
/// Allocated monotonically by the state kernel from
/// `[MIN_OBJECT_ID, MAX_OBJECT_ID]` and never reused while the kernel is
/// alive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u32);

impl ObjectId {
    /// Whether this id lies inside the allocatable range.
    pub fn is_valid(self) -> bool {
        (MIN_OBJECT_ID..=MAX_OBJECT_ID).contains(&self.0)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ObjectId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}
