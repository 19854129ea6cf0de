//! Target records - the deployed instances being probed.

use serde::{Deserialize, Serialize};

use crate::id::{ChangelogId, TargetId};
use crate::Time;

/// A registered deployment target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    /// Unique identifier
    pub id: TargetId,

    /// Unique, subdomain-safe name
    pub name: String,

    /// Base URL all probes are scoped to
    pub base_url: String,

    /// Name of the task the target is currently on
    pub current_task: String,

    /// Count of tasks with a persisted pass outcome
    pub score: u32,

    /// Creation timestamp
    pub created_at: Time,

    /// Last status write-back
    pub last_updated: Time,
}

impl Target {
    /// Register a new target starting on the given task.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        current_task: impl Into<String>,
    ) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: TargetId::new(),
            name: name.into(),
            base_url: base_url.into(),
            current_task: current_task.into(),
            score: 0,
            created_at: now,
            last_updated: now,
        }
    }
}

/// Kind of changelog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangelogKind {
    /// A refresh ran against the target
    Deploy,
    /// A task's persisted status became pass for the first time
    TaskDone,
}

/// Append-only activity record for a target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangelogEntry {
    /// Unique identifier
    pub id: ChangelogId,

    /// Entry kind
    pub kind: ChangelogKind,

    /// Human-readable message
    pub message: String,

    /// Creation timestamp
    pub timestamp: Time,
}

impl ChangelogEntry {
    /// Create a new entry stamped with the current time.
    pub fn new(kind: ChangelogKind, message: impl Into<String>) -> Self {
        Self {
            id: ChangelogId::new(),
            kind,
            message: message.into(),
            timestamp: chrono::Utc::now(),
        }
    }
}

/// Check that a name is usable as a subdomain label (and a directory name).
///
/// Lowercase letters, digits, and inner dashes; at most 63 characters.
pub fn is_valid_target_name(name: &str) -> bool {
    regex::Regex::new(r"^[a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?$")
        .map(|re| re.is_match(name))
        .unwrap_or(false)
}
