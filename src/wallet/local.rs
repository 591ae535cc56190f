//! Private-key wallet provider.
//!
//! # Security
//! - Private keys are loaded from a hex string or an environment variable
//! - Keys are never logged or serialized

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use alloy::primitives::{hex, Address};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer;
use async_trait::async_trait;

use crate::wallet::provider::{AccountListeners, AccountsHandler, Subscription, WalletProvider};
use crate::wallet::types::{WalletError, WalletResult};

/// Environment variable name for the private key.
pub const PRIVATE_KEY_ENV_VAR: &str = "REFERRAL_WALLET_PRIVATE_KEY";

/// A [`WalletProvider`] holding one local private key.
///
/// Account access must be granted through [`request_accounts`] before the
/// key signs anything, mirroring how injected wallets gate a site.
///
/// [`request_accounts`]: WalletProvider::request_accounts
#[derive(Debug)]
pub struct LocalWalletProvider {
    signer: RwLock<PrivateKeySigner>,
    chain_id: u64,
    /// Whether the user is willing to grant access.
    approves: AtomicBool,
    /// Whether access is currently granted.
    granted: AtomicBool,
    listeners: AccountListeners,
}

fn parse_key(private_key_hex: &str, chain_id: u64) -> WalletResult<PrivateKeySigner> {
    let key_hex = private_key_hex.strip_prefix("0x").unwrap_or(private_key_hex);
    let signer: PrivateKeySigner = key_hex
        .parse()
        .map_err(|e| WalletError::InvalidKey(format!("{}", e)))?;
    Ok(signer.with_chain_id(Some(chain_id)))
}

impl LocalWalletProvider {
    /// Create a provider from a hex-encoded private key (with or without 0x).
    pub fn from_private_key(private_key_hex: &str, chain_id: u64) -> WalletResult<Self> {
        let signer = parse_key(private_key_hex, chain_id)?;

        tracing::info!(
            address = %signer.address(),
            chain_id = chain_id,
            "Local wallet initialized"
        );

        Ok(Self {
            signer: RwLock::new(signer),
            chain_id,
            approves: AtomicBool::new(true),
            granted: AtomicBool::new(false),
            listeners: AccountListeners::new(),
        })
    }

    /// Load the key from `REFERRAL_WALLET_PRIVATE_KEY`.
    pub fn from_env(chain_id: u64) -> WalletResult<Self> {
        let private_key = std::env::var(PRIVATE_KEY_ENV_VAR)
            .map_err(|_| WalletError::MissingKey(PRIVATE_KEY_ENV_VAR))?;

        Self::from_private_key(&private_key, chain_id)
    }

    fn current_signer(&self) -> PrivateKeySigner {
        self.signer
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// The key's address.
    pub fn address(&self) -> Address {
        self.current_signer().address()
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Whether future access requests are granted or refused.
    pub fn set_approval(&self, approves: bool) {
        self.approves.store(approves, Ordering::SeqCst);
    }

    pub fn is_granted(&self) -> bool {
        self.granted.load(Ordering::SeqCst)
    }

    /// Revoke access and notify listeners with an empty account list.
    pub fn disconnect(&self) {
        self.granted.store(false, Ordering::SeqCst);
        tracing::info!("Local wallet disconnected");
        self.listeners.emit(&[]);
    }

    /// Replace the key and notify listeners of the new account.
    pub fn switch_account(&self, private_key_hex: &str) -> WalletResult<Address> {
        let signer = parse_key(private_key_hex, self.chain_id)?;
        let address = signer.address();
        *self
            .signer
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = signer;

        tracing::info!(address = %address, "Local wallet account switched");
        if self.is_granted() {
            self.listeners.emit(&[address.to_string()]);
        }
        Ok(address)
    }

    /// Number of registered account-change listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

#[async_trait]
impl WalletProvider for LocalWalletProvider {
    async fn request_accounts(&self) -> WalletResult<Vec<String>> {
        if !self.approves.load(Ordering::SeqCst) {
            return Err(WalletError::Rejected("User rejected the request.".to_string()));
        }
        self.granted.store(true, Ordering::SeqCst);
        Ok(vec![self.address().to_string()])
    }

    async fn sign_personal_message(&self, message: &str, address: &str) -> WalletResult<String> {
        if !self.is_granted() {
            return Err(WalletError::NotConnected);
        }
        let requested: Address = address
            .parse()
            .map_err(|e| WalletError::Signing(format!("invalid address '{}': {}", address, e)))?;

        let signer = self.current_signer();
        if signer.address() != requested {
            return Err(WalletError::NotConnected);
        }

        let signature = signer
            .sign_message(message.as_bytes())
            .await
            .map_err(|e| WalletError::Signing(e.to_string()))?;

        Ok(hex::encode_prefixed(signature.as_bytes()))
    }

    fn on_accounts_changed(&self, handler: AccountsHandler) -> Subscription {
        self.listeners.subscribe(handler)
    }
}
