//! Wallet error definitions.

use thiserror::Error;

use crate::resilience::TimedOut;

/// Errors surfaced by wallet providers and the connector.
///
/// `Display` output is shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    /// No provider capability was injected.
    #[error("No wallet found. Please install a wallet.")]
    NoWallet,

    /// The user or provider refused the request.
    #[error("{0}")]
    Rejected(String),

    /// Access was granted but no account came back.
    #[error("Wallet returned no accounts")]
    NoAccounts,

    /// Another connect request is still waiting on the provider.
    #[error("Wallet connection already in progress")]
    ConnectInProgress,

    /// No account is connected, or the requested one is not authorized.
    #[error("Wallet is not connected")]
    NotConnected,

    #[error("Message signing failed: {0}")]
    Signing(String),

    #[error(transparent)]
    Timeout(#[from] TimedOut),

    #[error("Invalid private key format: {0}")]
    InvalidKey(String),

    #[error("Environment variable {0} not set")]
    MissingKey(&'static str),
}

/// Result type for wallet operations.
pub type WalletResult<T> = Result<T, WalletError>;
