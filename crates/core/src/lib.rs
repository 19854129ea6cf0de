//! Waypoint core data models.
//!
//! This crate defines the data structures shared by the task/check engine,
//! the storage layer, and the CLI: status records, target records, changelog
//! entries, and form specifications. It performs no I/O.

#![warn(missing_docs)]

mod form;
mod id;
mod status;
mod target;

// Re-exports
pub use form::{Form, FormError, InputSpec, InputTypes};
pub use id::{ChangelogId, TargetId};
pub use status::{
    CheckState, CheckStatus, EvaluationOutcome, ReportState, StatusReport, TaskReport, TaskState,
    TaskStatus,
};
pub use target::{is_valid_target_name, ChangelogEntry, ChangelogKind, Target};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
