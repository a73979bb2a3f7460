/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Post-run schedule analysis: preemption count, wait and response times.
//!
//! Consumes the engine's trace read-only.  Unfinished jobs (deadline miss or
//! hyperperiod cutoff) are excluded from the averages but surfaced as an
//! explicit count — the C implementation silently dropped them from the
//! report, which hid exactly the infeasibility signal the tool exists to
//! expose.

use tracing::info;

use crate::engine::SimulationTrace;
use crate::task::ScheduleSlice;

// ── Result type ───────────────────────────────────────────────────────────────

/// Summary statistics derived from one simulation run.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleAnalysis {
    /// Number of context switches in the trace: adjacent slice pairs with
    /// differing job identity.
    pub preemptions: usize,

    /// Mean of `start − arrival` over finished jobs (0 when none finished).
    pub avg_wait: f64,

    /// Mean of `finish − arrival` over finished jobs (0 when none finished).
    pub avg_response: f64,

    /// Number of tasks in the simulated set.
    pub task_count: usize,

    /// Number of instantiated jobs.
    pub job_count: usize,

    /// Jobs that completed within the hyperperiod.
    pub finished_count: usize,

    /// Jobs still open at the hyperperiod boundary — a deadline miss or
    /// cutoff indicator.
    pub unfinished_count: usize,

    /// Total processor-busy time: the sum of all slice durations.
    pub busy_time: f64,
}

// ── Analysis ──────────────────────────────────────────────────────────────────

/// Count adjacent slice pairs whose job identity differs.
///
/// By construction the engine never emits two adjacent slices with the same
/// identity, so this equals `slices.len() − 1`; counting identity changes
/// keeps the statistic honest even if that construction ever regresses.
pub fn count_preemptions(slices: &[ScheduleSlice]) -> usize {
    slices
        .windows(2)
        .filter(|pair| pair[0].job_identity() != pair[1].job_identity())
        .count()
}

/// Derive the summary statistics from a finished run.
pub fn analyze(trace: &SimulationTrace, task_count: usize) -> ScheduleAnalysis {
    let preemptions = count_preemptions(&trace.slices);
    let busy_time: f64 = trace.slices.iter().map(|s| s.duration()).sum();

    let mut total_wait = 0.0;
    let mut total_response = 0.0;
    let mut finished_count = 0usize;

    for job in &trace.jobs {
        // Both times are always set on a finished job; guard anyway so a
        // half-updated job surfaces as unfinished instead of skewing sums.
        if let (true, Some(start), Some(finish)) = (job.finished, job.start_time, job.finish_time)
        {
            total_wait += start - job.arrival_time;
            total_response += finish - job.arrival_time;
            finished_count += 1;
        }
    }

    let avg_wait = if finished_count > 0 {
        total_wait / finished_count as f64
    } else {
        0.0
    };
    let avg_response = if finished_count > 0 {
        total_response / finished_count as f64
    } else {
        0.0
    };

    let analysis = ScheduleAnalysis {
        preemptions,
        avg_wait,
        avg_response,
        task_count,
        job_count: trace.jobs.len(),
        finished_count,
        unfinished_count: trace.jobs.len() - finished_count,
        busy_time,
    };

    info!(
        preemptions = analysis.preemptions,
        avg_wait = analysis.avg_wait,
        avg_response = analysis.avg_response,
        unfinished = analysis.unfinished_count,
        "Schedule analysed"
    );

    analysis
}

// ── Tests ─────────────────────────────────────────────────────────────────────
