//! Run reports and the rolling status history.
//!
//! Every run, whatever its outcome, produces one [`RunReport`] appended
//! to `status.json`, a bounded public health record the retry-checker
//! and operators read. History is pruned to the last seven days on every
//! append; a corrupt history file is treated as empty rather than fatal,
//! since losing history must never block today's digest.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Duration};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::datetime::{now_canonical, CANONICAL_TZ};
use crate::error::HistoryError;
use crate::paths;
use crate::run_context::{RunContext, RunType};
use crate::timing::{ModuleResult, ModuleStatus};

/// Days of history retained in `status.json`.
pub const HISTORY_RETENTION_DAYS: i64 = 7;

/// Overall outcome of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    Success,
    /// Some modules failed or degraded, but a digest was still produced.
    Partial,
    Failure,
}

impl OverallStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Partial => "partial",
            Self::Failure => "failure",
        }
    }
}

/// Classify a run from its per-module results.
///
/// Failure only when EVERY module errored; any error or warning short of
/// that is partial; clean board is success.
#[must_use]
pub fn classify(results: &[ModuleResult]) -> OverallStatus {
    let errors = results
        .iter()
        .filter(|r| r.status == ModuleStatus::Error)
        .count();
    let warnings = results
        .iter()
        .filter(|r| r.status == ModuleStatus::Warning)
        .count();

    if !results.is_empty() && errors == results.len() {
        OverallStatus::Failure
    } else if errors > 0 || warnings > 0 {
        OverallStatus::Partial
    } else {
        OverallStatus::Success
    }
}

/// Delivery outcome folded into the report by the publisher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryStats {
    pub sent: u32,
    pub failed: u32,
}

/// Structured record of one complete run.
///
/// Times are RFC 3339 strings in the canonical timezone so the file is
/// directly readable and round-trips through serde without a custom
/// timezone deserializer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub run_type: RunType,
    pub start_time: String,
    pub end_time: String,
    pub duration_seconds: f64,
    pub environment: String,
    pub modules: BTreeMap<String, ModuleResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscriber_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_delivery: Option<DeliveryStats>,
    pub errors: Vec<String>,
    pub overall_status: OverallStatus,
    #[serde(skip)]
    finalized: bool,
}

impl RunReport {
    /// Assemble a report from the run context and the timing registry's
    /// results. Overall status is classified here; delivery adjustments
    /// come later via [`finalize_delivery`](Self::finalize_delivery).
    #[must_use]
    pub fn from_run(ctx: &RunContext, results: Vec<ModuleResult>, environment: &str) -> Self {
        let end_time = now_canonical();
        let overall_status = classify(&results);
        let errors: Vec<String> = results
            .iter()
            .filter(|r| r.status == ModuleStatus::Error)
            .map(|r| {
                format!(
                    "{}: {}",
                    r.name,
                    r.error.as_deref().unwrap_or("unknown error")
                )
            })
            .collect();
        let modules = results
            .into_iter()
            .map(|r| (r.name.clone(), r))
            .collect();

        Self {
            run_id: ctx.run_id.clone(),
            run_type: ctx.run_type,
            start_time: ctx.start_time.to_rfc3339(),
            end_time: end_time.to_rfc3339(),
            duration_seconds: (end_time - ctx.start_time).num_milliseconds() as f64 / 1000.0,
            environment: environment.to_string(),
            modules,
            subscriber_count: None,
            email_delivery: None,
            errors,
            overall_status,
            finalized: false,
        }
    }

    /// Record a run-level error (canary verification, publish failure)
    /// without changing the overall status.
    pub fn push_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn set_subscriber_count(&mut self, count: u32) {
        self.subscriber_count = Some(count);
    }

    /// Fold delivery results into the overall status. Idempotent: only
    /// the first call takes effect.
    ///
    /// Total delivery failure downgrades the run to failure; partial
    /// delivery failure caps a success at partial.
    pub fn finalize_delivery(&mut self, delivery: DeliveryStats) {
        if self.finalized {
            return;
        }
        self.finalized = true;
        self.email_delivery = Some(delivery);

        if delivery.sent == 0 && delivery.failed > 0 {
            self.overall_status = OverallStatus::Failure;
        } else if delivery.failed > 0 && self.overall_status == OverallStatus::Success {
            self.overall_status = OverallStatus::Partial;
        }
    }

    /// The report's end time parsed back into the canonical timezone.
    /// `None` when the stored string is unparseable.
    #[must_use]
    pub fn end_time_canonical(&self) -> Option<DateTime<Tz>> {
        DateTime::parse_from_rfc3339(&self.end_time)
            .ok()
            .map(|dt| dt.with_timezone(&CANONICAL_TZ))
    }
}

/// The rolling `{"runs": [...]}` record in `status.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusHistory {
    pub runs: Vec<RunReport>,
}

impl StatusHistory {
    /// Load history from the default state-dir location.
    #[must_use]
    pub fn load_default() -> Self {
        Self::load(&paths::status_history_path())
    }

    /// Load history from `path`. Missing or corrupt files yield an empty
    /// history: the record is advisory and must never block a run.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str(&content) {
            Ok(history) => history,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "status history corrupt, starting fresh");
                Self::default()
            }
        }
    }

    /// Append a report and drop everything older than the retention
    /// window, preserving the order of what remains.
    pub fn append_and_prune(&mut self, report: RunReport, now: DateTime<Tz>) {
        self.runs.push(report);
        let cutoff = now - Duration::days(HISTORY_RETENTION_DAYS);
        self.runs.retain(|run| {
            run.end_time_canonical()
                .is_some_and(|end| end >= cutoff)
        });
    }

    /// Persist to `path` atomically.
    pub fn save(&self, path: &Path) -> Result<(), HistoryError> {
        let json = serde_json::to_string_pretty(self)?;
        paths::atomic_write(path, &json)?;
        Ok(())
    }

    /// Load-append-prune-save against one file. The whole pipeline calls
    /// this exactly once per run, after the report is final.
    pub fn record(path: &Path, report: RunReport) -> Result<(), HistoryError> {
        let mut history = Self::load(path);
        info!(
            run_id = %report.run_id,
            status = report.overall_status.as_str(),
            "recording run report"
        );
        history.append_and_prune(report, now_canonical());
        history.save(path)
    }

    /// Whether a `primary` run already succeeded on the given canonical
    /// date (`%Y-%m-%d`). The retry-checker's no-action condition.
    #[must_use]
    pub fn has_successful_primary_run_on(&self, date: &str) -> bool {
        self.runs.iter().any(|run| {
            run.run_type == RunType::Primary
                && run.overall_status == OverallStatus::Success
                && run
                    .end_time_canonical()
                    .is_some_and(|end| end.format("%Y-%m-%d").to_string() == date)
        })
    }

    /// Most recent report, if any.
    #[must_use]
    pub fn latest(&self) -> Option<&RunReport> {
        self.runs.last()
    }
}
