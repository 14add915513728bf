//! Structured logging setup.
//!
//! Every entry point initializes tracing once, then opens a run span
//! carrying `run_id` and `run_type` so all events from one run correlate
//! in the log stream.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::run_context::RunContext;

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `verbose` selects debug-level
/// output for parkdaily itself. Safe to call more than once; later calls
/// are no-ops.
pub fn init_tracing(verbose: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            if verbose {
                EnvFilter::try_new("parkdaily=debug,info")
            } else {
                EnvFilter::try_new("parkdaily=info,warn")
            }
        })
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                // stderr keeps stdout clean for command output (`status`)
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .try_init();
}

/// Span correlating all log events of one run.
pub fn run_span(ctx: &RunContext) -> tracing::Span {
    tracing::info_span!(
        "run",
        run_id = %ctx.run_id,
        run_type = ctx.run_type.as_str()
    )
}
