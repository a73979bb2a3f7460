//! Hyperperiod calculation and per-task job counting.
//!
//! The hyperperiod of a set of periodic tasks is the Least Common Multiple
//! (LCM) of all their periods.  It is the smallest time window after which
//! the entire release pattern of the task set repeats, and it bounds the
//! simulated timeline: only jobs released strictly before the hyperperiod
//! are simulated.
//!
//! # Improvements over the C implementation
//!
//! | C issue | Rust fix |
//! |-----------|----------|
//! | `(a / gcd) * b` in `lcmLL` overflows silently | `checked_mul` — overflow is `Err(Overflow)` |
//! | non-integer periods truncated by a `(long long)` cast after a warning | rounded to nearest, still warned, and rejected if they round below 1 |
//! | job counts written into a global `tasks[]` array | filled in-place on the borrowed task slice, result summarised in [`HyperperiodInfo`] |

pub mod math;

use tracing::{debug, info, warn};

use crate::task::Task;
use math::lcm_of_slice;

/// Tolerance used when deciding whether a declared period is integral.
const PERIOD_INTEGRALITY_EPSILON: f64 = 1e-9;

// ── Error type ────────────────────────────────────────────────────────────────

/// Errors that can occur during hyperperiod calculation.
#[derive(Debug, PartialEq, Eq)]
pub enum HyperperiodError {
    /// The task slice was empty.
    NoTasks,

    /// A task's period rounds below 1 — the LCM is undefined for
    /// non-positive periods.
    NonPositivePeriod { task: String },

    /// An LCM operand was zero.  Guarded against upstream by
    /// [`NonPositivePeriod`](Self::NonPositivePeriod); reaching this variant
    /// from [`analyze_task_set`] indicates a bookkeeping bug.
    ZeroOperand,

    /// LCM calculation overflowed `u64`.
    ///
    /// Contains the two operands that caused the overflow so the caller can
    /// log a useful message.
    Overflow { a: u64, b: u64 },
}

impl std::fmt::Display for HyperperiodError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HyperperiodError::NoTasks => {
                write!(f, "cannot compute a hyperperiod for an empty task set")
            }
            HyperperiodError::NonPositivePeriod { task } => {
                write!(f, "task '{task}' has a period that rounds below 1")
            }
            HyperperiodError::ZeroOperand => {
                write!(f, "LCM called with a zero operand")
            }
            HyperperiodError::Overflow { a, b } => {
                write!(f, "LCM overflow computing lcm({a}, {b})")
            }
        }
    }
}

impl std::error::Error for HyperperiodError {}

// ── HyperperiodInfo ───────────────────────────────────────────────────────────

/// Result of analysing a task set's release pattern.
#[derive(Debug, Clone)]
pub struct HyperperiodInfo {
    /// Hyperperiod (LCM of all rounded task periods), as simulation time.
    pub hyperperiod: f64,

    /// Unique rounded periods present in the task set (sorted, deduplicated).
    pub unique_periods: Vec<u64>,

    /// Total number of job instances released in `[0, hyperperiod)`.
    pub total_jobs: usize,
}

// ── Analysis ──────────────────────────────────────────────────────────────────

/// Compute the hyperperiod of `tasks` and fill each task's `job_count`
/// in-place.
///
/// Periods are rounded to the nearest integer before the LCM; a non-integral
/// period is logged as a warning (the LCM is then a best-effort
/// approximation), never silently truncated.
///
/// For each task, `job_count = floor((H − phase) / period)` when
/// `phase < H`, else 0.  Negative intermediate results clamp to 0.
///
/// # Errors
/// * [`HyperperiodError::NoTasks`] – empty slice.
/// * [`HyperperiodError::NonPositivePeriod`] – a period rounds below 1.
/// * [`HyperperiodError::Overflow`] – LCM exceeded `u64`.
pub fn analyze_task_set(tasks: &mut [Task]) -> Result<HyperperiodInfo, HyperperiodError> {
    if tasks.is_empty() {
        return Err(HyperperiodError::NoTasks);
    }

    // Round every period, warning on imprecision and rejecting non-positive
    // results before any LCM arithmetic runs.
    let mut rounded: Vec<u64> = Vec::with_capacity(tasks.len());
    for task in tasks.iter() {
        let r = task.period.round();
        if (task.period - r).abs() > PERIOD_INTEGRALITY_EPSILON {
            warn!(
                task = %task.name,
                period = task.period,
                rounded = r,
                "period is not an integer; the hyperperiod is a best-effort approximation"
            );
        }
        if r < 1.0 {
            return Err(HyperperiodError::NonPositivePeriod {
                task: task.name.clone(),
            });
        }
        rounded.push(r as u64);
    }

    let unique_periods: Vec<u64> = {
        let mut v = rounded.clone();
        v.sort_unstable();
        v.dedup();
        v
    };

    let hyperperiod_int = lcm_of_slice(&unique_periods)?;
    let hyperperiod = hyperperiod_int as f64;

    // Job counts: floor((H − phase) / period), clamped at zero.  A task whose
    // phase falls at or beyond the hyperperiod releases no job at all.
    let mut total_jobs = 0usize;
    for task in tasks.iter_mut() {
        task.job_count = if task.phase < hyperperiod {
            let count = ((hyperperiod - task.phase) / task.period).floor();
            if count < 0.0 {
                0
            } else {
                count as usize
            }
        } else {
            0
        };
        total_jobs += task.job_count;
        debug!(
            task = %task.name,
            job_count = task.job_count,
            "  jobs in hyperperiod"
        );
    }

    info!(
        task_count = tasks.len(),
        unique_count = unique_periods.len(),
        hyperperiod = hyperperiod_int,
        total_jobs,
        "Calculated hyperperiod"
    );

    Ok(HyperperiodInfo {
        hyperperiod,
        unique_periods,
        total_jobs,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
