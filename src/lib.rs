//! Referral signup flow.
//!
//! A session enters a referral code, connects a wallet, signs a message and
//! reserves a slot with the remote referral service.

pub mod config;
pub mod observability;
pub mod referral;
pub mod resilience;
pub mod signup;
pub mod validation;
pub mod wallet;

pub use config::SignupConfig;
pub use referral::{HttpReferralClient, ReferralApi, ReservationRequest};
pub use signup::{Phase, SessionState, SignupController};
pub use validation::validate_email_syntax;
pub use wallet::{LocalWalletProvider, WalletConnector, WalletProvider};
