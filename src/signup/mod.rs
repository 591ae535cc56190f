//! Signup flow subsystem.
//!
//! # Data Flow
//! ```text
//! User action
//!     → controller.rs (calls referral service / wallet)
//!     → machine.rs (Event → pure transition)
//!     → state.rs (SessionState published on a watch channel)
//!     → observers re-render
//! ```

pub mod controller;
pub mod machine;
pub mod state;

pub use controller::{SignupController, SignupError};
pub use machine::{transition, Event, Rejection};
pub use state::{Phase, SessionState};
