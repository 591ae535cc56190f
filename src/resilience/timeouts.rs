//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap every network and signing call with a deadline
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from other errors

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

/// The wrapped operation did not finish before its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{operation} timed out after {secs} seconds")]
pub struct TimedOut {
    pub operation: &'static str,
    pub secs: u64,
}

/// Per-call deadline for one kind of operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    operation: &'static str,
    duration: Duration,
}

impl Deadline {
    pub fn from_secs(operation: &'static str, secs: u64) -> Self {
        Self {
            operation,
            duration: Duration::from_secs(secs),
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Run `fut`, failing with [`TimedOut`] once the deadline passes.
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, TimedOut> {
        tokio::time::timeout(self.duration, fut)
            .await
            .map_err(|_| TimedOut {
                operation: self.operation,
                secs: self.duration.as_secs(),
            })
    }
}
