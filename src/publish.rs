//! Publication seam for the assembled snapshot.
//!
//! Delivery mechanics (email campaigns, remote uploads) live behind the
//! [`Publisher`] trait so the pipeline only sees delivery counts. The
//! built-in publisher writes the snapshot to the local output directory,
//! which downstream jobs serve or sync.

use std::path::PathBuf;

use tracing::{info, warn};

use crate::error::PublishError;
use crate::orchestrator::DigestSnapshot;
use crate::paths;
use crate::report::DeliveryStats;

/// What a publisher hands back to the run report.
#[derive(Debug, Clone, Copy, Default)]
pub struct PublishReceipt {
    /// Successful/failed delivery counts. `sent` counts recipients for a
    /// mail publisher and written artifacts for a file publisher.
    pub delivery: DeliveryStats,
    /// Audience size, when the publisher knows one.
    pub subscriber_count: Option<u32>,
}

/// A destination for the finished snapshot.
pub trait Publisher {
    fn name(&self) -> &'static str;

    fn publish(&self, snapshot: &DigestSnapshot) -> Result<PublishReceipt, PublishError>;

    /// Canary check after publishing: confirm the snapshot actually
    /// landed. Failures here are reported but never change the run's
    /// overall status.
    fn verify(&self, _snapshot: &DigestSnapshot) -> Result<(), PublishError> {
        Ok(())
    }
}

/// Writes `daily_update.json` plus a dated copy under the state
/// directory's output folder.
#[derive(Debug)]
pub struct LocalPublisher {
    output_dir: PathBuf,
}

impl LocalPublisher {
    #[must_use]
    pub fn new() -> Self {
        Self {
            output_dir: paths::output_dir(),
        }
    }

    #[must_use]
    pub fn at(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    fn latest_path(&self) -> PathBuf {
        self.output_dir.join("daily_update.json")
    }

    fn dated_path(&self, snapshot: &DigestSnapshot) -> PathBuf {
        self.output_dir.join(format!("daily_update_{}.json", snapshot.date))
    }
}

impl Default for LocalPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl Publisher for LocalPublisher {
    fn name(&self) -> &'static str {
        "local"
    }

    fn publish(&self, snapshot: &DigestSnapshot) -> Result<PublishReceipt, PublishError> {
        let json = serde_json::to_string_pretty(snapshot)?;
        paths::atomic_write(&self.latest_path(), &json)?;
        paths::atomic_write(&self.dated_path(snapshot), &json)?;
        info!(path = %self.latest_path().display(), "snapshot published");
        Ok(PublishReceipt {
            delivery: DeliveryStats { sent: 2, failed: 0 },
            subscriber_count: None,
        })
    }

    fn verify(&self, snapshot: &DigestSnapshot) -> Result<(), PublishError> {
        let content = std::fs::read_to_string(self.latest_path())?;
        let written: DigestSnapshot = serde_json::from_str(&content)?;
        if written.date != snapshot.date {
            warn!(
                expected = %snapshot.date,
                found = %written.date,
                "published snapshot has the wrong date"
            );
            return Err(PublishError::Verification(format!(
                "expected date {}, found {}",
                snapshot.date, written.date
            )));
        }
        Ok(())
    }
}
