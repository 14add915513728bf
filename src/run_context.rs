//! Run context: correlation metadata for a single end-to-end run.

use chrono::DateTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::datetime::now_canonical;

/// Which entry point started this run. The retry-checker only considers
/// `primary` runs when deciding whether today already succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunType {
    Primary,
    Retry,
    WebUpdate,
    RetryCheck,
}

impl RunType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Retry => "retry",
            Self::WebUpdate => "web_update",
            Self::RetryCheck => "retry_check",
        }
    }
}

/// Metadata about a single execution run. Created once at process start,
/// read by every component that needs correlation, never persisted beyond
/// the run report it seeds.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Short opaque identifier unique per run.
    pub run_id: String,
    /// Wall-clock start in the canonical timezone.
    pub start_time: DateTime<Tz>,
    pub run_type: RunType,
}

impl RunContext {
    #[must_use]
    pub fn new(run_type: RunType) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().simple().to_string()[..8].to_string(),
            start_time: now_canonical(),
            run_type,
        }
    }

    /// Seconds elapsed since the run started.
    #[must_use]
    pub fn elapsed_seconds(&self) -> f64 {
        (now_canonical() - self.start_time).num_milliseconds() as f64 / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_ids_are_short_and_unique() {
        let a = RunContext::new(RunType::Primary);
        let b = RunContext::new(RunType::Primary);
        assert_eq!(a.run_id.len(), 8);
        assert_ne!(a.run_id, b.run_id);
    }

    #[test]
    fn run_type_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&RunType::WebUpdate).unwrap(),
            r#""web_update""#
        );
        assert_eq!(RunType::Primary.as_str(), "primary");
    }

    #[test]
    fn elapsed_is_non_negative() {
        let ctx = RunContext::new(RunType::Retry);
        assert!(ctx.elapsed_seconds() >= 0.0);
    }
}
