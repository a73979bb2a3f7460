/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use edfvd_sim::engine::EdfVdEngine;
use edfvd_sim::{analysis, hyperperiod, input, jobs, report, scaling};

// ── CLI argument definition ───────────────────────────────────────────────────

/// Offline EDF-VD schedule simulator.
///
/// Example:
///   edfvd-sim -t tasks.yaml -e exec_times.yaml \
///             -s schedule_output.txt -a schedule_analysis.txt
#[derive(Debug, Parser)]
#[command(
    name = "edfvd-sim",
    about = "Offline EDF-VD mixed-criticality schedule simulator",
    long_about = None,
)]
struct Cli {
    /// Path to the YAML task declaration file.
    #[arg(short = 't', long = "tasks", default_value = "tasks.yaml")]
    tasks: PathBuf,

    /// Path to the YAML per-job execution-time file.
    #[arg(short = 'e', long = "exec-times", default_value = "exec_times.yaml")]
    exec_times: PathBuf,

    /// Output path for the schedule timeline.
    #[arg(short = 's', long = "schedule-out", default_value = "schedule_output.txt")]
    schedule_out: PathBuf,

    /// Output path for the analysis report.
    #[arg(short = 'a', long = "analysis-out", default_value = "schedule_analysis.txt")]
    analysis_out: PathBuf,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Initialise structured logging.
    // Level is controlled by the RUST_LOG env-var (e.g. RUST_LOG=debug).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    info!(
        tasks        = %cli.tasks.display(),
        exec_times   = %cli.exec_times.display(),
        schedule_out = %cli.schedule_out.display(),
        analysis_out = %cli.analysis_out.display(),
        "edfvd-sim starting"
    );

    if let Err(e) = run(&cli) {
        // Input and engine failures abort before any report file is created.
        error!("simulation failed: {:#}", e);
        process::exit(1);
    }
}

/// The full pipeline: load → analyze → scale → instantiate → dispatch →
/// analyze → report.
fn run(cli: &Cli) -> Result<()> {
    let mut tasks = input::load_task_set(&cli.tasks)?;
    let exec_times = input::load_exec_times(&cli.exec_times)?;

    let hp = hyperperiod::analyze_task_set(&mut tasks)?;
    let params = scaling::apply_virtual_deadlines(&mut tasks);

    let job_table = jobs::instantiate_jobs(&tasks, hp.hyperperiod, &exec_times)?;
    let trace = EdfVdEngine::new(hp.hyperperiod, job_table).run()?;

    let summary = analysis::analyze(&trace, tasks.len());

    report::write_schedule(&cli.schedule_out, &trace.slices, &tasks)?;
    report::write_analysis(&cli.analysis_out, &summary, &params, hp.hyperperiod)?;

    info!(
        preemptions = summary.preemptions,
        avg_wait = summary.avg_wait,
        avg_response = summary.avg_response,
        unfinished = summary.unfinished_count,
        "Done"
    );
    Ok(())
}
