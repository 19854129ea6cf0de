//! Status projection - raw evaluation output to a renderable report.

use std::collections::HashMap;

use waypoint_core::{
    EvaluationOutcome, ReportState, StatusReport, TaskReport, TaskState, TaskStatus,
};

use crate::loader::Task;

/// Project an evaluation outcome and previously persisted statuses onto the
/// full task sequence.
///
/// For each task in declared order: the task the target is currently on is
/// reported as `current`; otherwise a fresh outcome entry, then a persisted
/// status, decides pass or fail; a task with neither has never been
/// evaluated and is `locked`. Progress counts passing tasks against the full
/// sequence, so a passing task that happens to be current still counts.
pub fn project(
    tasks: &[Task],
    outcome: &EvaluationOutcome,
    persisted: &HashMap<String, TaskStatus>,
) -> StatusReport {
    let mut reports = Vec::with_capacity(tasks.len());
    let mut passed = 0usize;

    for task in tasks {
        let status = outcome.get(&task.name).or_else(|| persisted.get(&task.name));
        let state = status.map(|s| s.status);
        if state == Some(TaskState::Pass) {
            passed += 1;
        }

        let display = if outcome.current_task.as_deref() == Some(task.name.as_str()) {
            ReportState::Current
        } else {
            match state {
                Some(TaskState::Pass) => ReportState::Pass,
                Some(TaskState::Fail) => ReportState::Fail,
                None => ReportState::Locked,
            }
        };

        reports.push(TaskReport {
            name: task.name.clone(),
            title: task.title.clone(),
            description: task.description.clone(),
            status: display,
            checks: status.map(|s| s.checks.clone()).unwrap_or_default(),
        });
    }

    StatusReport {
        current_task: outcome.current_task.clone(),
        progress: progress(passed, tasks.len()),
        tasks: reports,
    }
}

/// Percentage of passing tasks, rounded to the nearest integer.
///
/// An empty task sequence has progress 0, not a division by zero.
pub fn progress(passed: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((passed as f64 * 100.0) / total as f64).round() as u32
}
