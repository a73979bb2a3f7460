/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Structured error type for the dispatch engine.
//!
//! Engine errors are **internal invariant violations**, not input problems:
//! given a correctly built job table they cannot occur.  Each variant carries
//! enough state context (`now`, counts) to diagnose the bookkeeping bug that
//! produced it, and none of them is ever silently recovered.

use thiserror::Error;

/// Fatal internal errors raised by the dispatch loop.
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    /// The active set was non-empty, yet no job could be selected.  With a
    /// total tie-break key this is unreachable; hitting it means the active
    /// set and the selection scan disagree about the job table.
    #[error(
        "no dispatchable job at t={now} despite {active_count} active job(s) — \
         engine bookkeeping is inconsistent"
    )]
    NoRunnableJob { now: f64, active_count: usize },
}
