//! Signup state machine.
//!
//! # States
//! ```text
//! Idle → CodeApplied → WalletPending → WalletConnected → Submitting → Completed
//! ```
//!
//! An error message can be attached in any state. Failures return control to
//! the last interactive state without discarding collected data.
//!
//! # Design Decisions
//! - `transition` is pure: no IO, no async, no clocks
//! - An event that does not apply to the current phase leaves the state untouched
//! - `Completed` ignores every event

use crate::signup::state::{
    Phase, SessionState, GENERIC_ALERT, INVALID_EMAIL, INVALID_EMAIL_SYNTAX,
    INVALID_REFERRAL_CODE, RESERVATION_FAILED, SIGNING_FAILED, WALLET_ALREADY_USED,
};

/// Something that happened: a user action or a collaborator's answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    CodeEdited(String),
    EmailEdited(String),
    /// The service accepted `code`.
    CodeAccepted { code: String },
    /// The service rejected `code`.
    CodeRejected { code: String },
    DialogClosed,
    WalletConnectStarted,
    WalletConnected { address: String },
    WalletConnectFailed { message: String },
    /// The freshly connected wallet has already redeemed a code.
    WalletAlreadyUsed,
    AccountsChanged { accounts: Vec<String> },
    SubmitStarted,
    MessageSigned { message: String, signature: String },
    SubmitRejected(Rejection),
    SubmitCompleted,
    /// Submission ended in an unexpected failure.
    SubmitAborted,
    AlertDismissed,
}

/// The validation step a submission failed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rejection {
    EmailSyntax,
    ReferralCode,
    WalletUsed,
    EmailTaken,
    Signing,
    Reservation,
}

impl Rejection {
    /// Message shown to the user.
    pub fn message(&self) -> &'static str {
        match self {
            Rejection::EmailSyntax => INVALID_EMAIL_SYNTAX,
            Rejection::ReferralCode => INVALID_REFERRAL_CODE,
            Rejection::WalletUsed => WALLET_ALREADY_USED,
            Rejection::EmailTaken => INVALID_EMAIL,
            Rejection::Signing => SIGNING_FAILED,
            Rejection::Reservation => RESERVATION_FAILED,
        }
    }

    /// Whether the collection dialog closes on this failure.
    pub fn closes_dialog(&self) -> bool {
        !matches!(self, Rejection::EmailTaken | Rejection::Signing)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Rejection::EmailSyntax => "email_syntax",
            Rejection::ReferralCode => "referral_code",
            Rejection::WalletUsed => "wallet_used",
            Rejection::EmailTaken => "email_taken",
            Rejection::Signing => "signing",
            Rejection::Reservation => "reservation",
        }
    }
}

/// The open-dialog phase matching what has been collected so far.
fn collection_phase(state: &SessionState) -> Phase {
    if state.wallet_address.is_some() {
        Phase::WalletConnected
    } else {
        Phase::CodeApplied
    }
}

fn clear_signature(state: &mut SessionState) {
    state.signature = None;
    state.signed_message = None;
}

/// Compute the state that follows `state` once `event` has happened.
pub fn transition(state: &SessionState, event: &Event) -> SessionState {
    let mut next = state.clone();
    if state.phase == Phase::Completed {
        return next;
    }

    match (state.phase, event) {
        (Phase::Idle, Event::CodeEdited(code)) => {
            if *code != next.referral_code {
                next.referral_code = code.clone();
                clear_signature(&mut next);
            }
        }
        (Phase::WalletConnected, Event::EmailEdited(email)) => {
            if *email != next.email {
                next.email = email.clone();
                clear_signature(&mut next);
            }
        }

        (Phase::Idle, Event::CodeAccepted { code })
            if !code.is_empty() && *code == state.referral_code =>
        {
            next.phase = Phase::CodeApplied;
            next.error_message = None;
        }
        (Phase::Idle, Event::CodeRejected { code }) if *code == state.referral_code => {
            next.error_message = Some(INVALID_REFERRAL_CODE.to_string());
        }

        (Phase::CodeApplied | Phase::WalletConnected, Event::DialogClosed) => {
            next.phase = Phase::Idle;
        }

        (Phase::CodeApplied, Event::WalletConnectStarted) => {
            next.error_message = None;
            next.phase = if state.wallet_address.is_some() {
                Phase::WalletConnected
            } else {
                Phase::WalletPending
            };
        }
        (Phase::WalletPending, Event::WalletConnected { address }) => {
            next.wallet_address = Some(address.clone());
            next.phase = Phase::WalletConnected;
        }
        (Phase::WalletPending, Event::WalletConnectFailed { message }) => {
            next.error_message = Some(message.clone());
            next.phase = Phase::CodeApplied;
        }
        (Phase::WalletPending | Phase::WalletConnected, Event::WalletAlreadyUsed) => {
            next.error_message = Some(WALLET_ALREADY_USED.to_string());
            next.phase = Phase::Idle;
        }

        (phase, Event::AccountsChanged { accounts }) => match accounts.first() {
            None => {
                next.wallet_address = None;
                clear_signature(&mut next);
                if phase == Phase::WalletConnected {
                    next.phase = Phase::CodeApplied;
                }
            }
            // Swaps only apply to a live connection; after a disconnect the
            // next account must come through a fresh connect.
            Some(address) => {
                if state
                    .wallet_address
                    .as_deref()
                    .is_some_and(|current| current != address)
                {
                    next.wallet_address = Some(address.clone());
                    clear_signature(&mut next);
                }
            }
        },

        (Phase::WalletConnected, Event::SubmitStarted) if state.can_submit() => {
            next.phase = Phase::Submitting;
            next.error_message = None;
            next.alert = None;
            clear_signature(&mut next);
        }
        (Phase::Submitting, Event::MessageSigned { message, signature }) => {
            next.signed_message = Some(message.clone());
            next.signature = Some(signature.clone());
        }
        (Phase::Submitting, Event::SubmitRejected(rejection)) => {
            next.error_message = Some(rejection.message().to_string());
            next.phase = if rejection.closes_dialog() {
                Phase::Idle
            } else {
                collection_phase(&next)
            };
        }
        (Phase::Submitting, Event::SubmitCompleted) => {
            next.phase = Phase::Completed;
            next.error_message = None;
        }
        (Phase::Submitting, Event::SubmitAborted) => {
            next.alert = Some(GENERIC_ALERT.to_string());
            next.phase = collection_phase(&next);
        }

        (_, Event::AlertDismissed) => {
            next.alert = None;
        }

        _ => {}
    }

    next
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connected() -> SessionState {
        SessionState {
            referral_code: "VIP1".into(),
            wallet_address: Some("0xABC".into()),
            email: "user@test.com".into(),
            phase: Phase::WalletConnected,
            ..Default::default()
        }
    }

    fn run(state: &SessionState, events: &[Event]) -> SessionState {
        events.iter().fold(state.clone(), |s, e| transition(&s, e))
    }

    #[test]
    fn test_happy_path() {
        let start = SessionState::new();
        let end = run(
            &start,
            &[
                Event::CodeEdited("VIP1".into()),
                Event::CodeAccepted { code: "VIP1".into() },
                Event::WalletConnectStarted,
                Event::WalletConnected { address: "0xABC".into() },
                Event::EmailEdited("user@test.com".into()),
                Event::SubmitStarted,
                Event::MessageSigned {
                    message: "m".into(),
                    signature: "0x01".into(),
                },
                Event::SubmitCompleted,
            ],
        );
        assert_eq!(end.phase, Phase::Completed);
        assert_eq!(end.wallet_address.as_deref(), Some("0xABC"));
        assert_eq!(end.signature.as_deref(), Some("0x01"));
        assert!(end.error_message.is_none());
    }

    #[test]
    fn test_code_rejection_stays_idle() {
        let state = run(
            &SessionState::new(),
            &[
                Event::CodeEdited("BAD".into()),
                Event::CodeRejected { code: "BAD".into() },
            ],
        );
        assert_eq!(state.phase, Phase::Idle);
        assert_eq!(state.error_message.as_deref(), Some(INVALID_REFERRAL_CODE));
    }

    #[test]
    fn test_stale_code_verdict_ignored() {
        let state = run(
            &SessionState::new(),
            &[
                Event::CodeEdited("OLD".into()),
                Event::CodeEdited("NEW".into()),
                Event::CodeAccepted { code: "OLD".into() },
            ],
        );
        assert_eq!(state.phase, Phase::Idle);
    }

    #[test]
    fn test_reopen_with_known_wallet_skips_connect() {
        let mut state = connected();
        state.phase = Phase::CodeApplied;
        let next = transition(&state, &Event::WalletConnectStarted);
        assert_eq!(next.phase, Phase::WalletConnected);
    }

    #[test]
    fn test_connect_failure_returns_to_code_applied() {
        let state = SessionState {
            referral_code: "VIP1".into(),
            phase: Phase::WalletPending,
            ..Default::default()
        };
        let next = transition(
            &state,
            &Event::WalletConnectFailed {
                message: "User rejected the request.".into(),
            },
        );
        assert_eq!(next.phase, Phase::CodeApplied);
        assert_eq!(next.error_message.as_deref(), Some("User rejected the request."));
    }

    #[test]
    fn test_used_wallet_closes_dialog_and_keeps_address() {
        let next = transition(&connected(), &Event::WalletAlreadyUsed);
        assert_eq!(next.phase, Phase::Idle);
        assert_eq!(next.error_message.as_deref(), Some(WALLET_ALREADY_USED));
        assert_eq!(next.wallet_address.as_deref(), Some("0xABC"));
    }

    #[test]
    fn test_submit_requires_email() {
        let mut state = connected();
        state.email.clear();
        assert_eq!(transition(&state, &Event::SubmitStarted), state);
    }

    #[test]
    fn test_second_submit_is_noop() {
        let submitting = transition(&connected(), &Event::SubmitStarted);
        assert_eq!(submitting.phase, Phase::Submitting);
        assert_eq!(transition(&submitting, &Event::SubmitStarted), submitting);
    }

    #[test]
    fn test_rejections_route_to_interactive_phase() {
        let submitting = transition(&connected(), &Event::SubmitStarted);
        let cases = [
            (Rejection::EmailSyntax, Phase::Idle),
            (Rejection::ReferralCode, Phase::Idle),
            (Rejection::WalletUsed, Phase::Idle),
            (Rejection::EmailTaken, Phase::WalletConnected),
            (Rejection::Signing, Phase::WalletConnected),
            (Rejection::Reservation, Phase::Idle),
        ];
        for (rejection, phase) in cases {
            let next = transition(&submitting, &Event::SubmitRejected(rejection));
            assert_eq!(next.phase, phase, "{:?}", rejection);
            assert_eq!(next.error_message.as_deref(), Some(rejection.message()));
            assert_eq!(next.email, "user@test.com");
        }
    }

    #[test]
    fn test_abort_raises_alert_and_reenables_submit() {
        let submitting = transition(&connected(), &Event::SubmitStarted);
        let aborted = transition(&submitting, &Event::SubmitAborted);
        assert_eq!(aborted.phase, Phase::WalletConnected);
        assert_eq!(aborted.alert.as_deref(), Some(GENERIC_ALERT));
        assert!(aborted.can_submit());

        let dismissed = transition(&aborted, &Event::AlertDismissed);
        assert!(dismissed.alert.is_none());
    }

    #[test]
    fn test_abort_after_disconnect_needs_reconnect() {
        let submitting = transition(&connected(), &Event::SubmitStarted);
        let disconnected = transition(&submitting, &Event::AccountsChanged { accounts: vec![] });
        assert_eq!(disconnected.phase, Phase::Submitting);

        let aborted = transition(&disconnected, &Event::SubmitAborted);
        assert_eq!(aborted.phase, Phase::CodeApplied);
    }

    #[test]
    fn test_disconnect_requires_reconnect() {
        let next = transition(&connected(), &Event::AccountsChanged { accounts: vec![] });
        assert_eq!(next.phase, Phase::CodeApplied);
        assert!(next.wallet_address.is_none());
    }

    #[test]
    fn test_account_swap_is_silent() {
        let next = transition(
            &connected(),
            &Event::AccountsChanged {
                accounts: vec!["0xDEF".into()],
            },
        );
        assert_eq!(next.phase, Phase::WalletConnected);
        assert_eq!(next.wallet_address.as_deref(), Some("0xDEF"));
    }

    #[test]
    fn test_account_after_disconnect_is_ignored() {
        let disconnected = transition(&connected(), &Event::AccountsChanged { accounts: vec![] });
        let next = transition(
            &disconnected,
            &Event::AccountsChanged {
                accounts: vec!["0xDEF".into()],
            },
        );
        assert_eq!(next, disconnected);
        assert_eq!(
            transition(&next, &Event::WalletConnectStarted).phase,
            Phase::WalletPending
        );
    }

    #[test]
    fn test_email_edit_invalidates_signature() {
        let mut state = connected();
        state.signature = Some("0x01".into());
        state.signed_message = Some("m".into());
        let next = transition(&state, &Event::EmailEdited("other@test.com".into()));
        assert!(next.signature.is_none());
        assert!(next.signed_message.is_none());
    }

    #[test]
    fn test_completed_is_terminal() {
        let submitting = transition(&connected(), &Event::SubmitStarted);
        let done = transition(&submitting, &Event::SubmitCompleted);

        let events = [
            Event::CodeEdited("X".into()),
            Event::EmailEdited("x@y.z".into()),
            Event::SubmitStarted,
            Event::DialogClosed,
            Event::AccountsChanged { accounts: vec![] },
            Event::SubmitAborted,
            Event::CodeAccepted { code: "VIP1".into() },
        ];
        for event in &events {
            assert_eq!(transition(&done, event), done, "{:?}", event);
        }
    }

    #[test]
    fn test_edits_frozen_while_submitting() {
        let submitting = transition(&connected(), &Event::SubmitStarted);
        assert_eq!(
            transition(&submitting, &Event::EmailEdited("x@y.z".into())),
            submitting
        );
        assert_eq!(
            transition(&submitting, &Event::CodeEdited("X".into())),
            submitting
        );
        assert_eq!(transition(&submitting, &Event::DialogClosed), submitting);
    }
}
