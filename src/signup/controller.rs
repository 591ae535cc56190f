//! Signup flow controller.
//!
//! # Responsibilities
//! - Own the session state and apply every change through [`transition`]
//! - Drive the referral service and wallet connector for each user action
//! - Run the submission chain in order, stopping at the first failure
//! - Publish every state change to observers
//!
//! # Submission chain
//! ```text
//! email syntax → code re-check → wallet re-check → email taken → sign → reserve
//! ```

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Weak};

use futures_util::FutureExt;
use thiserror::Error;
use tokio::sync::watch;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::FlowConfig;
use crate::observability::metrics;
use crate::referral::{ReferralApi, ReservationRequest};
use crate::signup::machine::{transition, Event, Rejection};
use crate::signup::state::{signing_message, Phase, SessionState};
use crate::validation::validate_email_syntax;
use crate::wallet::WalletConnector;

/// Failures the submission chain does not expect.
///
/// They surface as a generic alert rather than an inline message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignupError {
    #[error("no wallet address in session")]
    NoWalletAddress,

    #[error("wallet account changed during submission")]
    AccountChanged,

    #[error("submission panicked")]
    Panicked,
}

/// How a submission that ran to the end of its chain finished.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Submission {
    Reserved,
    Rejected(Rejection),
}

/// Apply `event` to the published state, returning whether anything changed.
fn apply(state: &watch::Sender<SessionState>, event: Event) -> bool {
    state.send_if_modified(|current| {
        let next = transition(current, &event);
        if next == *current {
            tracing::trace!(?event, phase = %current.phase, "Event ignored");
            return false;
        }
        if next.phase != current.phase {
            tracing::debug!(from = %current.phase, to = %next.phase, "Signup phase changed");
            metrics::record_transition(next.phase.as_str());
        }
        *current = next;
        true
    })
}

/// Orchestrates one signup session.
pub struct SignupController {
    api: Arc<dyn ReferralApi>,
    wallet: WalletConnector,
    policy: FlowConfig,
    state: Arc<watch::Sender<SessionState>>,
    session_id: Uuid,
}

impl SignupController {
    pub fn new(api: Arc<dyn ReferralApi>, wallet: WalletConnector, policy: FlowConfig) -> Self {
        let (state, _) = watch::channel(SessionState::new());
        let session_id = Uuid::new_v4();
        tracing::info!(session = %session_id, "Signup session started");

        Self {
            api,
            wallet,
            policy,
            state: Arc::new(state),
            session_id,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Observe state changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn wallet(&self) -> &WalletConnector {
        &self.wallet
    }

    fn dispatch(&self, event: Event) -> bool {
        apply(&self.state, event)
    }

    fn span(&self, action: &'static str) -> tracing::Span {
        tracing::info_span!("signup", session = %self.session_id, action)
    }

    pub fn set_referral_code(&self, code: impl Into<String>) {
        self.dispatch(Event::CodeEdited(code.into()));
    }

    pub fn set_email(&self, email: impl Into<String>) {
        self.dispatch(Event::EmailEdited(email.into()));
    }

    pub fn close_dialog(&self) {
        self.dispatch(Event::DialogClosed);
    }

    pub fn dismiss_alert(&self) {
        self.dispatch(Event::AlertDismissed);
    }

    /// Verify the entered code and open the collection dialog if it is valid.
    ///
    /// Does nothing for an empty code or outside `Idle`.
    pub async fn apply_code(&self) {
        let code = {
            let state = self.state.borrow();
            if state.phase != Phase::Idle || state.referral_code.is_empty() {
                return;
            }
            state.referral_code.clone()
        };

        async {
            if self.api.verify_referral_code(&code).await {
                tracing::info!(code = %code, "Referral code accepted");
                self.dispatch(Event::CodeAccepted { code });
            } else {
                tracing::info!(code = %code, "Referral code rejected");
                self.dispatch(Event::CodeRejected { code });
            }
        }
        .instrument(self.span("apply_code"))
        .await
    }

    /// Connect the wallet for the open dialog and screen it against the service.
    pub async fn open_collection(&self) {
        if !self.dispatch(Event::WalletConnectStarted) {
            return;
        }
        if self.state.borrow().phase != Phase::WalletPending {
            // Already connected earlier in the session.
            return;
        }

        async {
            let address = match self.wallet.connect().await {
                Ok(address) => address,
                Err(e) => {
                    self.dispatch(Event::WalletConnectFailed {
                        message: e.to_string(),
                    });
                    return;
                }
            };

            self.watch_accounts();
            self.dispatch(Event::WalletConnected {
                address: address.clone(),
            });

            if self.api.is_wallet_used(&address).await {
                tracing::info!(address = %address, "Connected wallet already used");
                self.dispatch(Event::WalletAlreadyUsed);
            }
        }
        .instrument(self.span("open_collection"))
        .await
    }

    fn watch_accounts(&self) {
        let state: Weak<watch::Sender<SessionState>> = Arc::downgrade(&self.state);
        let result = self.wallet.watch_accounts(Arc::new(move |accounts: &[String]| {
            if let Some(state) = state.upgrade() {
                apply(
                    &state,
                    Event::AccountsChanged {
                        accounts: accounts.to_vec(),
                    },
                );
            }
        }));
        if let Err(e) = result {
            tracing::warn!(error = %e, "Could not watch wallet accounts");
        }
    }

    /// Submit the collected data. A no-op unless a submission can start.
    pub async fn submit(&self) {
        if !self.dispatch(Event::SubmitStarted) {
            tracing::debug!(phase = %self.state.borrow().phase, "Submit ignored");
            return;
        }
        let snapshot = self.state();

        async {
            let outcome = AssertUnwindSafe(self.run_submission(&snapshot))
                .catch_unwind()
                .await
                .unwrap_or(Err(SignupError::Panicked));

            let event = match outcome {
                Ok(Submission::Reserved) => {
                    metrics::record_submission("reserved");
                    tracing::info!("Referral successfully applied");
                    Event::SubmitCompleted
                }
                Ok(Submission::Rejected(rejection)) => {
                    metrics::record_submission(rejection.as_str());
                    tracing::info!(step = rejection.as_str(), "Submission rejected");
                    Event::SubmitRejected(rejection)
                }
                Err(e) => {
                    metrics::record_submission("aborted");
                    tracing::error!(error = %e, "Submission failed unexpectedly");
                    Event::SubmitAborted
                }
            };
            self.dispatch(event);
        }
        .instrument(self.span("submit"))
        .await
    }

    async fn run_submission(&self, session: &SessionState) -> Result<Submission, SignupError> {
        let code = session.referral_code.as_str();
        let email = session.email.as_str();
        let address = session
            .wallet_address
            .as_deref()
            .ok_or(SignupError::NoWalletAddress)?;

        if !validate_email_syntax(email) {
            return Ok(Submission::Rejected(Rejection::EmailSyntax));
        }
        if !self.api.verify_referral_code(code).await {
            return Ok(Submission::Rejected(Rejection::ReferralCode));
        }
        if self.api.is_wallet_used(address).await {
            return Ok(Submission::Rejected(Rejection::WalletUsed));
        }
        if self.api.is_email_taken(email).await {
            return Ok(Submission::Rejected(Rejection::EmailTaken));
        }

        let (signature, message) = match self.sign_submission(code, email, address).await? {
            Some(signed) => signed,
            None => return Ok(Submission::Rejected(Rejection::Signing)),
        };

        let request = ReservationRequest {
            code: code.to_string(),
            wallet_address: address.to_string(),
            email: email.to_string(),
            signature,
            message,
        };
        if !self.api.reserve_slot(&request).await {
            return Ok(Submission::Rejected(Rejection::Reservation));
        }
        Ok(Submission::Reserved)
    }

    /// Produce `(signature, message)` for the reservation.
    ///
    /// `Ok(None)` is a signing failure the user can retry. Without any wallet
    /// provider both parts are empty unless the policy requires a signature.
    async fn sign_submission(
        &self,
        code: &str,
        email: &str,
        address: &str,
    ) -> Result<Option<(String, String)>, SignupError> {
        if !self.wallet.has_provider() {
            if self.policy.require_signature {
                tracing::warn!("Signature required but no wallet provider is available");
                return Ok(None);
            }
            tracing::warn!("No wallet provider; submitting without signature");
            return Ok(Some((String::new(), String::new())));
        }

        if self.wallet.account().as_deref() != Some(address) {
            return Err(SignupError::AccountChanged);
        }

        let message = signing_message(code, email);
        match self.wallet.sign(&message).await {
            Ok(signature) => {
                self.dispatch(Event::MessageSigned {
                    message: message.clone(),
                    signature: signature.clone(),
                });
                Ok(Some((signature, message)))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Error signing message");
                Ok(None)
            }
        }
    }

    /// Deregister the account-change listener. Also happens on drop.
    pub fn teardown(&self) {
        self.wallet.release();
        tracing::info!(session = %self.session_id, "Signup session torn down");
    }
}

impl Drop for SignupController {
    fn drop(&mut self) {
        self.wallet.release();
    }
}

impl std::fmt::Debug for SignupController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignupController")
            .field("session_id", &self.session_id)
            .field("phase", &self.state.borrow().phase)
            .field("wallet", &self.wallet)
            .finish()
    }
}
