//! parkdaily: resilient daily digest aggregation pipeline.
//!
//! Assembles a once-per-day content digest from independent, unreliable
//! providers and publishes it as a JSON snapshot. The pipeline is built
//! around four resilience mechanisms:
//!
//! - a day-scoped Last-Known-Good cache so provider outages degrade to
//!   earlier data from the same day,
//! - a PID-file run lock with liveness probing so crashed runs never
//!   wedge the scheduler,
//! - fail-isolated concurrent fan-out where one broken module cannot
//!   sink the others,
//! - a rolling status history driving an hourly idempotent
//!   retry-checker.

pub mod checker;
pub mod cli;
pub mod config;
pub mod datetime;
pub mod error;
pub mod exit_codes;
pub mod lkg_cache;
pub mod lock;
pub mod logging;
pub mod module;
pub mod orchestrator;
pub mod paths;
pub mod providers;
pub mod publish;
pub mod report;
pub mod retry;
pub mod run_context;
pub mod timing;

pub use config::Settings;
pub use error::{DigestError, FetchError, FetchErrorKind};
pub use exit_codes::ExitCode;
pub use lkg_cache::LkgCache;
pub use lock::RunLock;
pub use module::{CachePolicy, DigestModule, ModuleOutput};
pub use orchestrator::{DigestSnapshot, Orchestrator};
pub use report::{OverallStatus, RunReport, StatusHistory};
pub use retry::{with_retry, RetryPolicy};
pub use run_context::{RunContext, RunType};
pub use timing::{timed, ModuleResult, ModuleStatus, TimingRegistry};
