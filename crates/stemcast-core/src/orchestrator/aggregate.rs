//! Aggregation rule: job status from the current set of stem task stages.

use crate::model::{JobStatus, Stage};

/// Compute a job's status from its stem task stages.
///
/// Terminal only once every task is terminal: all `Done` → `Succeeded`,
/// all `Failed` → `Failed`, mixed → `PartiallyFailed`. Before that the job
/// is `Running`, or `Pending` while no task has started. Pure recomputation
/// from current state: invoking it repeatedly, out of order, or with
/// duplicate notifications always yields the same answer for the same set.
pub fn evaluate(stages: &[Stage]) -> JobStatus {
    if stages.iter().all(|s| *s == Stage::Queued) {
        return JobStatus::Pending;
    }
    if !stages.iter().all(|s| s.is_terminal()) {
        return JobStatus::Running;
    }
    let failed = stages.iter().filter(|s| **s == Stage::Failed).count();
    if failed == 0 {
        JobStatus::Succeeded
    } else if failed == stages.len() {
        JobStatus::Failed
    } else {
        JobStatus::PartiallyFailed
    }
}
