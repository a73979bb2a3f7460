/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Core data structures for the offline EDF-VD simulator.
//!
//! Three types model the three stages of the simulation pipeline:
//!
//! ```text
//! input  ──(YAML)──►  Task  ──(instantiator)──►  Job  ──(engine)──►  ScheduleSlice
//!                      ↑ static descriptor         ↑ mutable run state   ↑ append-only trace
//! ```
//!
//! # Ownership model
//! `Vec<Task>` is built once by the input loader and then only has its two
//! derived fields (`job_count`, `virtual_deadline`) filled in-place by the
//! hyperperiod analyzer and the criticality scaler.  Jobs hold an *index*
//! into that table, never a copy of task state.  The engine owns the job
//! table for the duration of one run and hands it back, together with the
//! slice trace, for analysis.

// ── Criticality level ─────────────────────────────────────────────────────────

/// Criticality level of a task in a two-level mixed-criticality system.
///
/// Mirrors the `CRIT_LOW` / `CRIT_HIGH` integer constants of the C
/// implementation.  Carrying a typed enum through the pipeline (instead of a
/// raw `int`) makes an invalid level unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Criticality {
    /// Low criticality – the real deadline is also the scheduling deadline.
    #[default]
    Low,
    /// High criticality – the scheduling deadline is tightened by the
    /// EDF-VD scaling factor.
    High,
}

impl Criticality {
    /// Parse from the tag used in task declaration files.
    ///
    /// Accepts the full words `high` / `low` (any case) as well as the
    /// single-letter `H` / `L` forms used by the legacy text format.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "high" | "h" => Some(Criticality::High),
            "low" | "l" => Some(Criticality::Low),
            _ => None,
        }
    }
}

// ── Task (static descriptor) ──────────────────────────────────────────────────

/// One periodic task as declared in the task-set file.
///
/// All timing values are in the (unit-less) time base of the input file.
/// The model assumes `wcet ≤ deadline ≤ period`; violations are a caller
/// error and are not enforced here.
///
/// # Lifecycle
/// Created by the input loader, then mutated exactly twice before the run:
/// the hyperperiod analyzer fills `job_count`, the criticality scaler fills
/// `virtual_deadline`.  Read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct Task {
    // ── Declared parameters ───────────────────────────────────────────────────
    /// Unique task name within the task set.
    pub name: String,

    /// Initial release offset (≥ 0).
    pub phase: f64,

    /// Release period (> 0).
    pub period: f64,

    /// Worst-case execution time (> 0, ≤ period).
    pub wcet: f64,

    /// Relative deadline (> 0).
    pub deadline: f64,

    /// Criticality level.
    pub criticality: Criticality,

    // ── Derived (filled before the run) ───────────────────────────────────────
    /// Relative deadline used for dispatch decisions.
    ///
    /// Equals `deadline` for low-criticality tasks; equals `deadline × x`
    /// for high-criticality tasks, where `x ∈ (0, 1]` is the global EDF-VD
    /// scaling factor.  Defaults to `deadline` until the scaler runs.
    pub virtual_deadline: f64,

    /// Number of job instances released within the hyperperiod.
    /// Zero until the hyperperiod analyzer runs.
    pub job_count: usize,
}

impl Task {
    /// CPU utilization fraction: `wcet / period`.
    ///
    /// Returns `0.0` when `period` is zero to avoid division by zero (the
    /// input loader rejects such tasks before they reach any caller).
    pub fn utilization(&self) -> f64 {
        if self.period <= 0.0 {
            0.0
        } else {
            self.wcet / self.period
        }
    }
}

// ── Job (one release instance) ────────────────────────────────────────────────

/// One release instance of a [`Task`], with the mutable state the engine
/// tracks across preemptions.
///
/// `start_time` / `finish_time` are `Option<f64>` instead of the `-1.0`
/// sentinel of the C implementation.
#[derive(Debug, Clone)]
pub struct Job {
    /// Index of the owning task in the task table (declaration order).
    pub task_index: usize,

    /// Job sequence number within its task (0-based).
    pub job_id: usize,

    /// Release instant: `phase + job_id × period`.
    pub arrival_time: f64,

    /// Real absolute deadline: `arrival_time + task.deadline`.
    pub absolute_deadline: f64,

    /// Scheduling deadline: `arrival_time + task.virtual_deadline`.
    /// This is the EDF-VD dispatch key.
    pub virtual_absolute_deadline: f64,

    /// Actual execution demand supplied by the execution-time input (≥ 0).
    pub actual_execution_time: f64,

    /// Execution time still owed.  Decremented by the engine as the job runs.
    pub remaining_time: f64,

    /// Instant the job first received the processor.  `None` until dispatched.
    pub start_time: Option<f64>,

    /// Instant the job completed.  `None` while unfinished.
    pub finish_time: Option<f64>,

    /// Set once `remaining_time` reaches zero (within the completion epsilon).
    pub finished: bool,
}

impl Job {
    /// A job is eligible for dispatch iff it has arrived, is unfinished,
    /// and still owes execution time.
    pub fn is_active(&self, now: f64) -> bool {
        !self.finished && self.arrival_time <= now && self.remaining_time > 0.0
    }
}

// ── ScheduleSlice (trace record) ──────────────────────────────────────────────

/// One maximal contiguous span of simulated time during which a single job
/// held the processor.
///
/// Produced append-only by the engine; consecutive slices never share
/// `(task_index, job_id)` – the engine extends the previous slice instead of
/// pushing a duplicate.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleSlice {
    pub start: f64,
    pub end: f64,
    pub task_index: usize,
    pub job_id: usize,
}

impl ScheduleSlice {
    /// Identity of the job running during this slice.
    pub fn job_identity(&self) -> (usize, usize) {
        (self.task_index, self.job_id)
    }

    /// Length of the span.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
