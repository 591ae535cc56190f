//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to referral API or wallet:
//!     → timeouts.rs (enforce per-call deadline)
//!     → On timeout: caller maps to a soft failure the user can re-trigger
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - No automatic retries: one attempt per user action

pub mod timeouts;

pub use timeouts::{Deadline, TimedOut};
