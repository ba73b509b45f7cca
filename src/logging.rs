//! Logging utilities for wrfcf.
//!
//! Every `postprocess` call gets a run id; each stage emits a start and an
//! end event tagged with it. Events go to stderr so the command-line tool
//! can keep stdout for its JSON output.

use std::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::{Result, WrfError};

/// Install the global fmt subscriber; `RUST_LOG` takes precedence over `log_level`
pub fn init_tracing(log_level: &str) {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

pub fn log_stage_start(stage: &str, run_id: &str) {
    debug!(stage, run_id, "Stage started");
}

/// Emit the end event of a stage; failures are raised to `warn`
pub fn log_stage_end(stage: &str, run_id: &str, start_time: Instant, success: bool) {
    let duration_ms = elapsed_ms(start_time);
    if success {
        debug!(stage, run_id, duration_ms, "Stage finished");
    } else {
        warn!(stage, run_id, duration_ms, "Stage failed");
    }
}

/// Run one pipeline stage between its start and end events
pub fn log_stage<T, F>(stage: &str, run_id: &str, f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let start = Instant::now();
    log_stage_start(stage, run_id);
    let result = f();
    log_stage_end(stage, run_id, start, result.is_ok());
    result
}

/// Time a one-off fallible operation such as opening a file.
///
/// Success is reported at `info`; a failure is passed to [`log_error`].
pub fn log_timed_operation<T, F>(operation: &str, f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let start = Instant::now();
    let result = f();
    match &result {
        Ok(_) => info!(operation, duration_ms = elapsed_ms(start), "Operation completed"),
        Err(e) => log_error(e, operation),
    }
    result
}

/// Summarize a freshly loaded WRF file
pub fn log_data_load_stats(file_path: &str, var_names: &[String], dim_details: &str) {
    info!(
        file_path,
        var_count = var_names.len(),
        vars = %var_names.join(", "),
        dims = dim_details,
        "WRF file loaded"
    );
}

pub fn log_error(error: &WrfError, context: &str) {
    error!(error = %error, context, "Operation failed");
}

/// A fresh id tying together the events of one postprocessing run
pub fn generate_run_id() -> String {
    Uuid::new_v4().to_string()
}
