//! Remote referral service.
//!
//! # Data Flow
//! ```text
//! SignupController
//!     → ReferralApi (trait seam)
//!     → client.rs (HTTP + deadline, fails soft)
//!     → types.rs (payloads, response decoding)
//! ```

pub mod client;
pub mod types;

pub use client::{HttpReferralClient, ReferralApi};
pub use types::{ApiError, ReservationRequest};
