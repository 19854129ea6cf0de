//! Waypoint task/check engine.
//!
//! Parses a declarative task list into executable checks, runs the checks
//! against a live target with fail-fast gating across tasks, and projects
//! the raw results into a renderable status report.

#![warn(missing_docs)]

pub mod check;
pub mod error;
pub mod evaluator;
pub mod loader;
pub mod projection;
pub mod registry;
pub mod session;

#[cfg(test)]
pub(crate) mod testutil;

pub use check::{Check, CheckFailure};
pub use error::{LoadError, RegistryError};
pub use evaluator::Evaluator;
pub use loader::{Task, TaskLoader, TaskSet};
pub use projection::{progress, project};
pub use registry::{deserializing, CheckArgs, CheckFactory, CheckRegistry};
pub use session::{TargetSession, DEFAULT_PROBE_TIMEOUT};
