//! Exit code constants and error mapping for parkdaily
//!
//! The retry-checker contract depends on these values: the hourly cron
//! wrapper distinguishes "nothing to do" (0) from "lock held by a live
//! run" (3) from genuine failure (1).

use crate::error::DigestError;

/// Exit code constants for parkdaily
pub mod codes {
    /// Success - run completed, or no action was needed
    pub const SUCCESS: i32 = 0;

    /// Failure - run failed, retry launch failed, or retry timed out
    pub const FAILURE: i32 = 1;

    /// CLI arguments or configuration error - refused to start
    pub const CLI_ARGS: i32 = 2;

    /// Lock held - another live instance owns the run slot
    pub const LOCK_HELD: i32 = 3;
}

/// Exit code wrapper so library code never calls `std::process::exit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(i32);

impl ExitCode {
    pub const SUCCESS: Self = Self(codes::SUCCESS);
    pub const FAILURE: Self = Self(codes::FAILURE);
    pub const CLI_ARGS: Self = Self(codes::CLI_ARGS);
    pub const LOCK_HELD: Self = Self(codes::LOCK_HELD);

    #[must_use]
    pub const fn from_i32(code: i32) -> Self {
        Self(code)
    }

    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    #[must_use]
    pub const fn is_success(self) -> bool {
        self.0 == codes::SUCCESS
    }
}

/// Map a `DigestError` to the exit code the CLI should return.
#[must_use]
pub fn error_to_exit_code(error: &DigestError) -> ExitCode {
    match error {
        DigestError::Config(_) => ExitCode::CLI_ARGS,
        _ => ExitCode::FAILURE,
    }
}
