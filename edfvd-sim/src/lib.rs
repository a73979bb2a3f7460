/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! edfvd-sim – offline EDF-VD mixed-criticality schedule simulator.
//!
//! Module layout (data flows top to bottom):
//!
//! ```text
//! lib.rs
//! ├── input/        – YAML task-set & execution-time loading
//! ├── task.rs       – Task / Job / ScheduleSlice data model
//! ├── hyperperiod/  – LCM / GCD helpers, job counting
//! ├── scaling/      – EDF-VD scaling factor & virtual deadlines
//! ├── jobs/         – job instantiation over one hyperperiod
//! ├── engine/       – the event-driven dispatch loop
//! ├── analysis/     – preemption / wait / response statistics
//! └── report/       – schedule & analysis output files
//! ```

pub mod analysis;
pub mod engine;
pub mod hyperperiod;
pub mod input;
pub mod jobs;
pub mod report;
pub mod scaling;
pub mod task;
