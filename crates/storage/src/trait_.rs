//! Storage trait abstraction.

use std::collections::HashMap;

use async_trait::async_trait;
use waypoint_core::{ChangelogEntry, EvaluationOutcome, Target, TaskStatus};

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Target not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// A target with the same name already exists
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Persistence collaborator for targets and their evaluation history.
///
/// Implementations must serialize status write-backs to the same target so
/// overlapping refreshes cannot interleave; writes to different targets are
/// independent.
#[async_trait]
pub trait Storage: Send + Sync {
    // === Target operations ===

    /// Register a new target. Fails if the name is already taken.
    async fn create_target(&mut self, target: &Target) -> Result<()>;

    /// Load a target by name.
    async fn find_target(&self, name: &str) -> Result<Option<Target>>;

    /// List all targets, highest score first.
    async fn list_targets(&self) -> Result<Vec<Target>>;

    // === Status write-back ===

    /// Record the outcome of an evaluation run.
    ///
    /// Upserts per-task statuses by task name, updates the target's
    /// `current_task`, appends changelog entries (a `Deploy` entry for the
    /// refresh itself and a `TaskDone` entry for every task whose persisted
    /// status became pass for the first time), and recomputes the score as
    /// the count of persisted passing tasks. Returns the updated target.
    async fn update_status(&mut self, name: &str, outcome: &EvaluationOutcome) -> Result<Target>;

    // === Queries for rendering ===

    /// Persisted per-task statuses for a target, keyed by task name.
    async fn task_statuses(&self, name: &str) -> Result<HashMap<String, TaskStatus>>;

    /// Changelog entries for a target, newest first.
    async fn changelog(&self, name: &str) -> Result<Vec<ChangelogEntry>>;
}
