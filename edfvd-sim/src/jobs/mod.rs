/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Job instantiation: expanding each task into its concrete release
//! instances over one hyperperiod.
//!
//! The execution-time rows come from the loader as an already-parsed
//! `Vec<Vec<f64>>` in task declaration order — the instantiator never
//! touches a file (the C implementation read the exec-times file a second
//! time here; that double read is gone).

use thiserror::Error;
use tracing::{debug, info};

use crate::task::{Job, Task};

// ── Errors ────────────────────────────────────────────────────────────────────

/// Errors raised while expanding tasks into jobs.
///
/// All of these are input-contract violations: the execution-time source must
/// supply exactly one row per task and exactly `job_count` non-negative
/// values per row.  Truncating or padding silently would skew every
/// downstream statistic, so each mismatch is an explicit, run-aborting error.
#[derive(Debug, Error, PartialEq)]
pub enum InstantiationError {
    /// The exec-time input has a different number of rows than there are
    /// tasks.
    #[error("expected {expected} execution-time rows (one per task), got {got}")]
    RowCountMismatch { expected: usize, got: usize },

    /// A task's row does not contain exactly `job_count` values.
    #[error("task '{task}' releases {expected} jobs but {got} execution times were supplied")]
    ExecCountMismatch {
        task: String,
        expected: usize,
        got: usize,
    },

    /// A supplied execution time is negative.
    #[error("task '{task}' job {job} has a negative execution time ({value})")]
    NegativeExecTime { task: String, job: usize, value: f64 },
}

// ── Instantiation ─────────────────────────────────────────────────────────────

/// Expand `tasks` into the full ordered job list for `[0, hyperperiod)`.
///
/// For task `t` and job index `j < t.job_count`:
/// * `arrival = phase + j × period`; instantiation of that task stops at the
///   first arrival `≥ hyperperiod` (release at or beyond the boundary is
///   excluded).
/// * `remaining = exec_times[t][j]` (validated `≥ 0`).
///
/// A job whose supplied execution time is exactly 0 is still instantiated,
/// but marked finished at creation with `start = finish = arrival` — it can
/// never be dispatched, yet it participates in the job and finished counts
/// with zero wait and response time.
///
/// The returned order (task declaration order, then job sequence) is used
/// only for iteration; dispatch priority comes solely from virtual deadlines.
pub fn instantiate_jobs(
    tasks: &[Task],
    hyperperiod: f64,
    exec_times: &[Vec<f64>],
) -> Result<Vec<Job>, InstantiationError> {
    if exec_times.len() != tasks.len() {
        return Err(InstantiationError::RowCountMismatch {
            expected: tasks.len(),
            got: exec_times.len(),
        });
    }

    let mut jobs: Vec<Job> = Vec::new();

    for (task_index, (task, row)) in tasks.iter().zip(exec_times).enumerate() {
        if row.len() != task.job_count {
            return Err(InstantiationError::ExecCountMismatch {
                task: task.name.clone(),
                expected: task.job_count,
                got: row.len(),
            });
        }

        for (job_id, &exec) in row.iter().enumerate() {
            if exec < 0.0 {
                return Err(InstantiationError::NegativeExecTime {
                    task: task.name.clone(),
                    job: job_id,
                    value: exec,
                });
            }

            let arrival = task.phase + job_id as f64 * task.period;
            if arrival >= hyperperiod {
                break;
            }

            let zero_demand = exec == 0.0;
            jobs.push(Job {
                task_index,
                job_id,
                arrival_time: arrival,
                absolute_deadline: arrival + task.deadline,
                virtual_absolute_deadline: arrival + task.virtual_deadline,
                actual_execution_time: exec,
                remaining_time: exec,
                start_time: zero_demand.then_some(arrival),
                finish_time: zero_demand.then_some(arrival),
                finished: zero_demand,
            });

            debug!(
                task = %task.name,
                job = job_id,
                arrival,
                exec,
                "  job instantiated"
            );
        }
    }

    info!(job_count = jobs.len(), "Job table built");
    Ok(jobs)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
