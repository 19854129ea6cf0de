//! Status records produced by check evaluation.

use serde::{Deserialize, Serialize};

/// Outcome class of a single check run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckState {
    /// The probed condition held
    Pass,
    /// The condition was evaluated correctly and did not hold
    Fail,
    /// The probe itself malfunctioned (network failure, bad response, bug)
    Error,
}

/// Result of running a single check against a target.
///
/// Produced fresh on every run; a run yields exactly one of the three
/// outcome classes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckStatus {
    /// Human-readable label of the check
    pub title: String,

    /// Outcome class
    pub status: CheckState,

    /// Failure or error message; empty on pass
    pub message: String,
}

impl CheckStatus {
    /// Record a passing check.
    pub fn pass(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            status: CheckState::Pass,
            message: String::new(),
        }
    }

    /// Record an assertion failure.
    pub fn fail(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            status: CheckState::Fail,
            message: message.into(),
        }
    }

    /// Record a malfunctioning probe.
    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            status: CheckState::Error,
            message: message.into(),
        }
    }
}

/// Aggregate outcome class of a task.
///
/// An `Error` check makes the task `Fail` at this level; the three-way
/// distinction is preserved per check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    /// Every check passed
    Pass,
    /// At least one check did not pass
    Fail,
}

/// Result of evaluating all checks of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStatus {
    /// Aggregate outcome
    pub status: TaskState,

    /// Per-check outcomes, in declared order
    pub checks: Vec<CheckStatus>,
}

impl TaskStatus {
    /// Roll up per-check outcomes: pass iff every check passed.
    pub fn from_checks(checks: Vec<CheckStatus>) -> Self {
        let status = if checks.iter().all(|c| c.status == CheckState::Pass) {
            TaskState::Pass
        } else {
            TaskState::Fail
        };
        Self { status, checks }
    }

    /// Whether the task passed.
    pub fn passed(&self) -> bool {
        self.status == TaskState::Pass
    }
}

/// Ordered result of evaluating a task sequence against one target.
///
/// Contains an entry for every evaluated task, in declared order. Tasks past
/// the first non-passing task are not evaluated and have no entry here; the
/// status projection reports them as locked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationOutcome {
    /// (task name, status) pairs for the evaluated prefix
    pub tasks: Vec<(String, TaskStatus)>,

    /// Name of the task the target is currently on.
    ///
    /// The first non-passing task, or the last task when everything passes.
    /// `None` only when the task sequence is empty.
    pub current_task: Option<String>,
}

impl EvaluationOutcome {
    /// Look up the outcome for a task by name.
    pub fn get(&self, name: &str) -> Option<&TaskStatus> {
        self.tasks
            .iter()
            .find(|(task, _)| task == name)
            .map(|(_, status)| status)
    }
}

/// Display state of a task in a status report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportState {
    /// Evaluated and passed
    Pass,
    /// Evaluated and did not pass
    Fail,
    /// The task the target is currently working on
    Current,
    /// Never evaluated; gated behind an earlier task
    Locked,
}

/// One task row in a status report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskReport {
    /// Task name
    pub name: String,

    /// Display title
    pub title: String,

    /// Longer description
    pub description: String,

    /// Display state
    pub status: ReportState,

    /// Per-check outcomes from the latest known evaluation; empty when the
    /// task has never been evaluated
    pub checks: Vec<CheckStatus>,
}

/// Renderable status of a target across the whole task sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    /// One row per declared task, in order
    pub tasks: Vec<TaskReport>,

    /// Name of the task the target is currently on
    pub current_task: Option<String>,

    /// Percentage of tasks passed, 0-100
    pub progress: u32,
}
