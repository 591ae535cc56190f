//! Session state for one signup.

use serde::Serialize;

pub const INVALID_REFERRAL_CODE: &str = "Invalid referral code";
pub const INVALID_EMAIL_SYNTAX: &str = "Invalid email syntax";
pub const WALLET_ALREADY_USED: &str = "Wallet already used";
pub const INVALID_EMAIL: &str = "Invalid email";
pub const SIGNING_FAILED: &str = "Error with signing the message. Please try again.";
pub const RESERVATION_FAILED: &str = "Failed to reserve slot.";
pub const GENERIC_ALERT: &str = "An error occurred. Please try again.";

/// Where the session is in the signup flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Code entry; the collection dialog is closed.
    #[default]
    Idle,
    /// Code verified, dialog open, no wallet yet.
    CodeApplied,
    /// Waiting on the wallet provider for account access.
    WalletPending,
    /// Wallet connected; email entry and submit are available.
    WalletConnected,
    /// A submission is in flight.
    Submitting,
    /// Slot reserved. Terminal.
    Completed,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::CodeApplied => "code_applied",
            Phase::WalletPending => "wallet_pending",
            Phase::WalletConnected => "wallet_connected",
            Phase::Submitting => "submitting",
            Phase::Completed => "completed",
        }
    }

    /// Whether the collection dialog is shown in this phase.
    pub fn is_dialog_open(&self) -> bool {
        matches!(
            self,
            Phase::CodeApplied | Phase::WalletPending | Phase::WalletConnected | Phase::Submitting
        )
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the view needs to render a session.
///
/// Invariants:
/// - `wallet_address` is `Some` only after a successful connect.
/// - `signature` is `Some` only together with `signed_message`, and that
///   message embeds the current `referral_code` and `email`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SessionState {
    pub referral_code: String,
    pub wallet_address: Option<String>,
    pub email: String,
    pub signature: Option<String>,
    pub signed_message: Option<String>,
    pub phase: Phase,
    /// Inline error for the last failed step.
    pub error_message: Option<String>,
    /// Blocking alert for an unexpected failure.
    pub alert: Option<String>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_completed(&self) -> bool {
        self.phase == Phase::Completed
    }

    /// Whether a submit action would start a submission.
    pub fn can_submit(&self) -> bool {
        self.phase == Phase::WalletConnected
            && !self.email.trim().is_empty()
            && !self.referral_code.is_empty()
            && self.wallet_address.is_some()
    }
}

/// The human-readable text a wallet signs to bind a submission.
pub fn signing_message(referral_code: &str, email: &str) -> String {
    format!(
        "Submitting referral code: {} for email: {}",
        referral_code, email
    )
}
