//! Task-set and execution-time input loading.
//!
//! Two YAML files feed one simulation run:
//!
//! ```yaml
//! # tasks.yaml
//! tasks:
//!   - { name: T1, phase: 0, period: 5, wcet: 2, deadline: 5, criticality: high }
//!   - { name: T2, phase: 0, period: 10, wcet: 3, deadline: 10, criticality: low }
//! ```
//!
//! ```yaml
//! # exec_times.yaml — one row per task, declaration order
//! exec_times:
//!   - [2.0, 1.8]
//!   - [3.0]
//! ```
//!
//! The loader produces fully validated structures; the simulation core never
//! performs file I/O itself.  (The C implementation opened the exec-times
//! file twice, once skipping and once reading — both reads collapse into the
//! single [`load_exec_times`] call here.)

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::task::{Criticality, Task};

// ── Private YAML deserialization types ────────────────────────────────────────

/// Top-level wrapper that maps directly onto the task file layout.
///
/// Kept private – callers work with validated [`Task`]s instead.
#[derive(Debug, Deserialize)]
struct TaskSetFile {
    tasks: Vec<TaskEntry>,
}

/// Per-task fields as they appear in the YAML file.
///
/// `phase` is optional (defaults to 0 — the common case); every timing field
/// is validated after parsing, not by serde.
#[derive(Debug, Deserialize)]
struct TaskEntry {
    name: String,
    #[serde(default)]
    phase: f64,
    period: f64,
    wcet: f64,
    deadline: f64,
    criticality: String,
}

/// Top-level wrapper for the execution-time file.
#[derive(Debug, Deserialize)]
struct ExecTimesFile {
    exec_times: Vec<Vec<f64>>,
}

// ── Validation errors ─────────────────────────────────────────────────────────

/// Semantic validation failures in the input files.
///
/// Distinct from I/O and YAML syntax problems (those surface as
/// `anyhow` errors with file context): these mean the file parsed but
/// describes a model the simulator refuses to run.
#[derive(Debug, Error, PartialEq)]
pub enum InputError {
    /// The task list was empty.
    #[error("the task set is empty — nothing to simulate")]
    NoTasks,

    /// A declared timing value is outside its domain.
    #[error("task '{task}': {field} must be {requirement} (got {value})")]
    InvalidTiming {
        task: String,
        field: &'static str,
        requirement: &'static str,
        value: f64,
    },

    /// The criticality tag is not one of `high`/`low` (or `H`/`L`).
    #[error("task '{task}': unknown criticality tag '{tag}' (expected high/low)")]
    InvalidCriticality { task: String, tag: String },

    /// An execution-time value is negative.
    #[error("execution-time row {row}, entry {entry} is negative ({value})")]
    NegativeExecTime {
        row: usize,
        entry: usize,
        value: f64,
    },
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Parse and validate the task declaration file.
///
/// Duplicate task names are tolerated with a warning (the legacy format
/// allowed them); every other validation failure aborts the run.
pub fn load_task_set(path: &Path) -> Result<Vec<Task>> {
    info!("Loading task set from: {}", path.display());

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot open task file: {}", path.display()))?;

    let file: TaskSetFile = serde_yaml::from_str(&content)
        .with_context(|| format!("failed to parse task YAML: {}", path.display()))?;

    let tasks = validate_tasks(file.tasks)?;

    info!("Loaded {} task(s)", tasks.len());
    Ok(tasks)
}

/// Parse and range-check the execution-time file.
///
/// Row/length agreement with the task set is the job instantiator's
/// responsibility (it knows each task's `job_count`); this loader only
/// rejects values that are invalid in isolation.
pub fn load_exec_times(path: &Path) -> Result<Vec<Vec<f64>>> {
    info!("Loading execution times from: {}", path.display());

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot open execution-time file: {}", path.display()))?;

    let file: ExecTimesFile = serde_yaml::from_str(&content)
        .with_context(|| format!("failed to parse execution-time YAML: {}", path.display()))?;

    for (row, values) in file.exec_times.iter().enumerate() {
        for (entry, &value) in values.iter().enumerate() {
            if value < 0.0 {
                return Err(InputError::NegativeExecTime { row, entry, value }.into());
            }
        }
    }

    info!("Loaded {} execution-time row(s)", file.exec_times.len());
    Ok(file.exec_times)
}

/// Turn raw entries into validated [`Task`]s.
fn validate_tasks(entries: Vec<TaskEntry>) -> Result<Vec<Task>, InputError> {
    if entries.is_empty() {
        return Err(InputError::NoTasks);
    }

    let mut seen: HashSet<String> = HashSet::new();
    let mut tasks = Vec::with_capacity(entries.len());

    for entry in entries {
        if !seen.insert(entry.name.clone()) {
            warn!(task = %entry.name, "duplicate task name in task set");
        }

        check_timing(&entry.name, "phase", "non-negative", entry.phase, false)?;
        check_timing(&entry.name, "period", "positive", entry.period, true)?;
        check_timing(&entry.name, "wcet", "positive", entry.wcet, true)?;
        check_timing(&entry.name, "deadline", "positive", entry.deadline, true)?;

        let criticality =
            Criticality::parse(&entry.criticality).ok_or_else(|| InputError::InvalidCriticality {
                task: entry.name.clone(),
                tag: entry.criticality.clone(),
            })?;

        tasks.push(Task {
            name: entry.name,
            phase: entry.phase,
            period: entry.period,
            wcet: entry.wcet,
            deadline: entry.deadline,
            criticality,
            // Defaults until the scaler / analyzer fill them in.
            virtual_deadline: entry.deadline,
            job_count: 0,
        });
    }

    Ok(tasks)
}

fn check_timing(
    task: &str,
    field: &'static str,
    requirement: &'static str,
    value: f64,
    strictly_positive: bool,
) -> Result<(), InputError> {
    let ok = if strictly_positive {
        value > 0.0
    } else {
        value >= 0.0
    };
    if ok && value.is_finite() {
        Ok(())
    } else {
        Err(InputError::InvalidTiming {
            task: task.to_string(),
            field,
            requirement,
            value,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Helper: write a YAML string to a temp file and return it.
    fn yaml_tempfile(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    // ── load_task_set ─────────────────────────────────────────────────────────

    #[test]
    fn load_reference_task_set() {
        let yaml = r#"
tasks:
  - { name: T1, phase: 0, period: 5, wcet: 2, deadline: 5, criticality: high }
  - { name: T2, phase: 0, period: 10, wcet: 3, deadline: 10, criticality: low }
"#;
        let f = yaml_tempfile(yaml);
        let tasks = load_task_set(f.path()).unwrap();

        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].name, "T1");
        assert_eq!(tasks[0].criticality, Criticality::High);
        assert_eq!(tasks[0].period, 5.0);
        assert_eq!(tasks[1].criticality, Criticality::Low);
        // derived fields start at their defaults
        assert_eq!(tasks[0].virtual_deadline, tasks[0].deadline);
        assert_eq!(tasks[0].job_count, 0);
    }

    #[test]
    fn phase_defaults_to_zero_when_absent() {
        let yaml = r#"
tasks:
  - { name: T1, period: 5, wcet: 2, deadline: 5, criticality: low }
"#;
        let f = yaml_tempfile(yaml);
        let tasks = load_task_set(f.path()).unwrap();
        assert_eq!(tasks[0].phase, 0.0);
    }

    #[test]
    fn legacy_single_letter_criticality_is_accepted() {
        let yaml = r#"
tasks:
  - { name: T1, period: 5, wcet: 2, deadline: 5, criticality: H }
"#;
        let f = yaml_tempfile(yaml);
        let tasks = load_task_set(f.path()).unwrap();
        assert_eq!(tasks[0].criticality, Criticality::High);
    }

    #[test]
    fn missing_file_returns_error() {
        let result = load_task_set(Path::new("/nonexistent/tasks.yaml"));
        assert!(result.is_err());
    }

    #[test]
    fn malformed_yaml_returns_error() {
        let f = yaml_tempfile("tasks: [not: valid: yaml:::");
        assert!(load_task_set(f.path()).is_err());
    }

    #[test]
    fn empty_task_list_is_rejected() {
        let f = yaml_tempfile("tasks: []\n");
        let err = load_task_set(f.path()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<InputError>(),
            Some(&InputError::NoTasks)
        );
    }

    #[test]
    fn non_positive_period_is_rejected() {
        let yaml = r#"
tasks:
  - { name: bad, period: 0, wcet: 1, deadline: 5, criticality: low }
"#;
        let f = yaml_tempfile(yaml);
        let err = load_task_set(f.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<InputError>(),
            Some(InputError::InvalidTiming { field: "period", .. })
        ));
    }

    #[test]
    fn negative_phase_is_rejected() {
        let yaml = r#"
tasks:
  - { name: bad, phase: -1, period: 5, wcet: 1, deadline: 5, criticality: low }
"#;
        let f = yaml_tempfile(yaml);
        let err = load_task_set(f.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<InputError>(),
            Some(InputError::InvalidTiming { field: "phase", .. })
        ));
    }

    #[test]
    fn unknown_criticality_tag_is_rejected() {
        let yaml = r#"
tasks:
  - { name: bad, period: 5, wcet: 1, deadline: 5, criticality: medium }
"#;
        let f = yaml_tempfile(yaml);
        let err = load_task_set(f.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<InputError>(),
            Some(InputError::InvalidCriticality { .. })
        ));
    }

    #[test]
    fn duplicate_names_load_with_a_warning() {
        let yaml = r#"
tasks:
  - { name: twin, period: 5, wcet: 1, deadline: 5, criticality: low }
  - { name: twin, period: 10, wcet: 2, deadline: 10, criticality: low }
"#;
        let f = yaml_tempfile(yaml);
        let tasks = load_task_set(f.path()).unwrap();
        assert_eq!(tasks.len(), 2);
    }

    // ── load_exec_times ───────────────────────────────────────────────────────

    #[test]
    fn load_reference_exec_times() {
        let yaml = r#"
exec_times:
  - [2.0, 1.8]
  - [3.0]
"#;
        let f = yaml_tempfile(yaml);
        let rows = load_exec_times(f.path()).unwrap();
        assert_eq!(rows, vec![vec![2.0, 1.8], vec![3.0]]);
    }

    #[test]
    fn empty_rows_are_allowed_at_load_time() {
        // A task with zero jobs in the hyperperiod legitimately has an
        // empty row; the instantiator checks lengths against job counts.
        let f = yaml_tempfile("exec_times:\n  - []\n");
        let rows = load_exec_times(f.path()).unwrap();
        assert_eq!(rows, vec![Vec::<f64>::new()]);
    }

    #[test]
    fn negative_exec_time_is_rejected_at_load() {
        let f = yaml_tempfile("exec_times:\n  - [1.0, -2.5]\n");
        let err = load_exec_times(f.path()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<InputError>(),
            Some(&InputError::NegativeExecTime {
                row: 0,
                entry: 1,
                value: -2.5
            })
        );
    }

    #[test]
    fn zero_exec_time_is_valid_input() {
        let f = yaml_tempfile("exec_times:\n  - [0.0]\n");
        assert!(load_exec_times(f.path()).is_ok());
    }
}
