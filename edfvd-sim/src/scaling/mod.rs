/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! EDF-VD criticality scaling: the deadline-shrinking factor `x`.
//!
//! # Theory
//! **EDF-VD** (Baruah et al.): in a two-level mixed-criticality system, the
//! deadlines of high-criticality tasks are tightened by a factor `x ∈ (0, 1]`
//! so that, under the optimistic execution-time assumption, the whole set
//! stays schedulable while high tasks retain slack for their pessimistic
//! budgets.  With
//!
//! $$U_{hi} = \sum_{\text{high}} \frac{C_i}{T_i}, \qquad
//!   U_{lo} = \sum_{\text{low}} \frac{C_i}{T_i}$$
//!
//! the standard choice is `x = U_hi / (1 − U_lo)` whenever `U_lo < 1`.
//!
//! # Failure semantics
//! An infeasible configuration (`U_hi > 1`, or a raw `x` above 1) is a
//! **warning, not an error** — the simulation deliberately proceeds with the
//! clamped worst-case `x = 1`, because exposing an infeasible task set
//! through its missed deadlines and unfinished jobs is part of this tool's
//! purpose.

use tracing::{info, warn};

use crate::task::{Criticality, Task};

// ── Parameters record ─────────────────────────────────────────────────────────

/// The global EDF-VD parameters derived from one task set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdfVdParams {
    /// Deadline scaling factor, clamped to `(0, 1]`.
    pub x: f64,

    /// Total utilization of high-criticality tasks.
    pub u_high: f64,

    /// Total utilization of low-criticality tasks.
    pub u_low: f64,
}

// ── Computation ───────────────────────────────────────────────────────────────

/// Compute the utilization sums and the scaling factor for `tasks`.
///
/// `x = u_high / (1 − u_low)` when `u_low < 1`; otherwise there is no
/// feasible scaling and `x = 1` (worst case, no tightening).  A raw value
/// above 1 is likewise clamped to 1.  A set with no high-criticality tasks
/// yields `x = 1` so that the `0 < x` invariant holds vacuously.
pub fn compute_params(tasks: &[Task]) -> EdfVdParams {
    let mut u_high = 0.0;
    let mut u_low = 0.0;
    for task in tasks {
        match task.criticality {
            Criticality::High => u_high += task.utilization(),
            Criticality::Low => u_low += task.utilization(),
        }
    }

    if u_high > 1.0 {
        warn!(
            u_high,
            "high-criticality tasks alone exceed full utilization; \
             the set is unschedulable but the simulation proceeds"
        );
    }

    let raw = if u_low < 1.0 {
        u_high / (1.0 - u_low)
    } else {
        warn!(
            u_low,
            "low-criticality utilization is at or above 1; no feasible scaling exists"
        );
        1.0
    };

    let x = if raw > 1.0 {
        warn!(
            raw_x = raw,
            "scaling factor clamped to 1; no deadline tightening is effectively applied"
        );
        1.0
    } else if raw <= 0.0 {
        // No high tasks (u_high = 0): any x works, pick the identity.
        1.0
    } else {
        raw
    };

    EdfVdParams { x, u_high, u_low }
}

/// Compute the EDF-VD parameters and set each task's `virtual_deadline`
/// in-place: `deadline × x` for high-criticality tasks, `deadline`
/// unchanged for low.
pub fn apply_virtual_deadlines(tasks: &mut [Task]) -> EdfVdParams {
    let params = compute_params(tasks);

    for task in tasks.iter_mut() {
        task.virtual_deadline = match task.criticality {
            Criticality::High => task.deadline * params.x,
            Criticality::Low => task.deadline,
        };
    }

    info!(
        x = params.x,
        u_high = params.u_high,
        u_low = params.u_low,
        "EDF-VD parameters applied"
    );

    params
}

// ── Tests ─────────────────────────────────────────────────────────────────────
