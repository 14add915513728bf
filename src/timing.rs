//! Per-module timing and outcome registry.
//!
//! Purely observational: the registry records what happened and how long
//! it took, and never changes control flow. Shared across the fan-out
//! worker threads behind a mutex.

use std::fmt;
use std::sync::Mutex;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Outcome of one module's execution within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleStatus {
    Success,
    /// Produced usable output but degraded along the way (retries
    /// exhausted on a secondary feed, LKG fallback served, ...).
    Warning,
    Error,
}

impl ModuleStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ModuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable record of one module execution. Lives for the duration of
/// the run, then lands in the run report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleResult {
    pub name: String,
    pub status: ModuleStatus,
    /// Wall-clock execution time in seconds.
    pub duration_seconds: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Thread-safe collection of [`ModuleResult`]s for the current run.
#[derive(Debug, Default)]
pub struct TimingRegistry {
    results: Mutex<Vec<ModuleResult>>,
}

impl TimingRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, result: ModuleResult) {
        debug!(
            module = %result.name,
            status = %result.status,
            duration_seconds = result.duration_seconds,
            "module finished"
        );
        if let Ok(mut results) = self.results.lock() {
            results.push(result);
        }
    }

    /// Snapshot of everything recorded so far, in recording order.
    #[must_use]
    pub fn results(&self) -> Vec<ModuleResult> {
        self.results
            .lock()
            .map(|results| results.clone())
            .unwrap_or_default()
    }
}

/// Run `f` under the registry's clock, recording its outcome.
///
/// Success and error are inferred from the result; errors re-propagate
/// unchanged. Callers that can distinguish degraded success use
/// [`timed_with_status`].
pub fn timed<T, E: fmt::Display>(
    registry: &TimingRegistry,
    name: &str,
    f: impl FnOnce() -> Result<T, E>,
) -> Result<T, E> {
    timed_with_status(registry, name, |_| ModuleStatus::Success, f)
}

/// Like [`timed`], but lets the caller classify an `Ok` value as
/// `Success` or `Warning` by inspecting it.
pub fn timed_with_status<T, E: fmt::Display>(
    registry: &TimingRegistry,
    name: &str,
    status_of: impl FnOnce(&T) -> ModuleStatus,
    f: impl FnOnce() -> Result<T, E>,
) -> Result<T, E> {
    let started = Instant::now();
    let result = f();
    let duration_seconds = started.elapsed().as_secs_f64();

    match &result {
        Ok(value) => registry.record(ModuleResult {
            name: name.to_string(),
            status: status_of(value),
            duration_seconds,
            error: None,
        }),
        Err(err) => registry.record(ModuleResult {
            name: name.to_string(),
            status: ModuleStatus::Error,
            duration_seconds,
            error: Some(err.to_string()),
        }),
    }

    result
}
