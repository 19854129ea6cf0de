//! Unique identifiers for waypoint entities.

use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unique identifier for a Target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetId(Ulid);

impl TargetId {
    /// Generate a new TargetId
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for TargetId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TargetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for TargetId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Unique identifier for a ChangelogEntry
///
/// ULIDs sort lexicographically by creation time, which gives changelog
/// entries a stable chronological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChangelogId(Ulid);

impl ChangelogId {
    /// Generate a new ChangelogId
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for ChangelogId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ChangelogId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
