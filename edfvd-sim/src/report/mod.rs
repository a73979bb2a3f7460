/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Report file writing: the slice timeline and the flat analysis summary.
//!
//! Strictly a post-run concern — nothing here is called while the engine is
//! dispatching, and a failed run produces no output files at all.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::analysis::ScheduleAnalysis;
use crate::scaling::EdfVdParams;
use crate::task::{ScheduleSlice, Task};

/// Write the timeline: one line per slice, task resolved to its name.
///
/// Keeps the fixed-width line format of the legacy output so existing
/// tooling that parses `schedule_output.txt` keeps working:
///
/// ```text
/// [  0.00 ->   2.00]: Task=T1 Job=0
/// ```
pub fn write_schedule(path: &Path, slices: &[ScheduleSlice], tasks: &[Task]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("cannot create schedule file: {}", path.display()))?;
    let mut out = BufWriter::new(file);

    writeln!(out, "EDF-VD schedule timeline:")?;
    for slice in slices {
        let name = tasks
            .get(slice.task_index)
            .map(|t| t.name.as_str())
            .unwrap_or("?");
        writeln!(
            out,
            "[{:6.2} -> {:6.2}]: Task={} Job={}",
            slice.start, slice.end, name, slice.job_id
        )?;
    }

    out.flush()?;
    info!(slices = slices.len(), path = %path.display(), "Schedule written");
    Ok(())
}

/// Write the analysis report as flat key/value lines.
pub fn write_analysis(
    path: &Path,
    analysis: &ScheduleAnalysis,
    params: &EdfVdParams,
    hyperperiod: f64,
) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("cannot create analysis file: {}", path.display()))?;
    let mut out = BufWriter::new(file);

    writeln!(out, "EDF-VD Schedule Analysis")?;
    writeln!(out, "========================")?;
    writeln!(out, "Hyperperiod:           {:.2}", hyperperiod)?;
    writeln!(out, "Scaling Factor x:      {:.4}", params.x)?;
    writeln!(out, "Utilization (High):    {:.4}", params.u_high)?;
    writeln!(out, "Utilization (Low):     {:.4}", params.u_low)?;
    writeln!(out, "Task Count:            {}", analysis.task_count)?;
    writeln!(out, "Job Count:             {}", analysis.job_count)?;
    writeln!(out, "Finished Jobs:         {}", analysis.finished_count)?;
    writeln!(out, "Unfinished Jobs:       {}", analysis.unfinished_count)?;
    writeln!(out, "Number of Preemptions: {}", analysis.preemptions)?;
    writeln!(out, "Average Waiting Time:  {:.2}", analysis.avg_wait)?;
    writeln!(out, "Average Response Time: {:.2}", analysis.avg_response)?;
    writeln!(out, "Busy Time:             {:.2}", analysis.busy_time)?;

    out.flush()?;
    info!(path = %path.display(), "Analysis written");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
