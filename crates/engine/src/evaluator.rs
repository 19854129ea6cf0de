//! Task evaluation with fail-fast gating.

use tracing::{debug, info};
use waypoint_core::{CheckStatus, EvaluationOutcome, TaskStatus};

use crate::check::CheckFailure;
use crate::loader::Task;
use crate::session::TargetSession;

/// Runs a target's checks and applies the cross-task gating policy.
///
/// The evaluator is the failure boundary for checks: no error from an
/// individual check escapes [`Evaluator::evaluate_task`].
pub struct Evaluator;

impl Evaluator {
    /// Create an evaluator.
    pub fn new() -> Self {
        Self
    }

    /// Run every check of a task against a target.
    ///
    /// Checks run sequentially in declared order. A check that fails or
    /// malfunctions never prevents its siblings from running; every declared
    /// check contributes exactly one status.
    pub async fn evaluate_task(&self, task: &Task, session: &TargetSession) -> TaskStatus {
        info!("[{}] evaluating task {}", session.base_url(), task.name);

        let mut checks = Vec::with_capacity(task.checks.len());
        for check in &task.checks {
            let title = check.describe();
            let status = match check.verify(session).await {
                Ok(()) => CheckStatus::pass(title),
                Err(CheckFailure::Assertion(message)) => CheckStatus::fail(title, message),
                Err(CheckFailure::Probe(message)) => CheckStatus::error(title, message),
            };
            debug!(
                "[{}] {}: {:?} {}",
                session.base_url(),
                task.name,
                status.status,
                status.title
            );
            checks.push(status);
        }

        TaskStatus::from_checks(checks)
    }

    /// Evaluate tasks in declared order, stopping at the first task that
    /// does not pass.
    ///
    /// Later tasks presuppose earlier ones, so there is no value in probing
    /// past the gate; this also bounds evaluation cost to the first failing
    /// task. Tasks past the stopping point get no outcome entry and are
    /// reported as locked downstream. `current_task` is the first
    /// non-passing task's name, or the last task's name when everything
    /// passes; `None` only for an empty sequence.
    pub async fn evaluate_sequence(
        &self,
        tasks: &[Task],
        session: &TargetSession,
    ) -> EvaluationOutcome {
        let mut outcomes = Vec::new();
        let mut current_task = None;

        for task in tasks {
            let status = self.evaluate_task(task, session).await;
            let passed = status.passed();
            current_task = Some(task.name.clone());
            outcomes.push((task.name.clone(), status));
            if !passed {
                break;
            }
        }

        EvaluationOutcome {
            tasks: outcomes,
            current_task,
        }
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}
