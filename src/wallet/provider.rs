//! The wallet provider capability.
//!
//! A provider is whatever holds the user's accounts: a browser extension
//! bridge, a hardware signer, or [`LocalWalletProvider`](super::LocalWalletProvider).
//! The flow only needs account access, personal-sign, and account-change
//! notifications.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::wallet::types::WalletResult;

/// Callback invoked with the provider's new account list.
pub type AccountsHandler = Arc<dyn Fn(&[String]) + Send + Sync>;

/// Capability interface to an account-holding wallet.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Ask the user for account access. The first entry is the selected account.
    async fn request_accounts(&self) -> WalletResult<Vec<String>>;

    /// EIP-191 personal-sign `message` with `address`, returning `0x` hex.
    async fn sign_personal_message(&self, message: &str, address: &str) -> WalletResult<String>;

    /// Register `handler` for account changes. Dropping the returned
    /// [`Subscription`] deregisters it.
    fn on_accounts_changed(&self, handler: AccountsHandler) -> Subscription;
}

/// Disposer for a registered listener.
///
/// Deregisters on [`unsubscribe`](Self::unsubscribe) or on drop, whichever
/// comes first.
#[must_use = "dropping a Subscription deregisters its listener immediately"]
pub struct Subscription {
    dispose: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn new(dispose: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            dispose: Some(Box::new(dispose)),
        }
    }

    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(dispose) = self.dispose.take() {
            dispose();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.dispose.is_some())
            .finish()
    }
}

/// Registry of account-change listeners for provider implementations.
#[derive(Clone, Default)]
pub struct AccountListeners {
    handlers: Arc<DashMap<u64, AccountsHandler>>,
    next_id: Arc<AtomicU64>,
}

impl AccountListeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler`; the subscription removes it again.
    pub fn subscribe(&self, handler: AccountsHandler) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.handlers.insert(id, handler);

        let handlers: Weak<DashMap<u64, AccountsHandler>> = Arc::downgrade(&self.handlers);
        Subscription::new(move || {
            if let Some(handlers) = handlers.upgrade() {
                handlers.remove(&id);
            }
        })
    }

    /// Invoke every registered handler with `accounts`.
    pub fn emit(&self, accounts: &[String]) {
        // Handlers are collected first so none runs while a map shard is locked.
        let handlers: Vec<AccountsHandler> =
            self.handlers.iter().map(|r| Arc::clone(r.value())).collect();

        tracing::debug!(
            listeners = handlers.len(),
            accounts = accounts.len(),
            "Account change notified"
        );
        for handler in handlers {
            handler(accounts);
        }
    }

    /// Number of live listeners.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for AccountListeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountListeners")
            .field("listeners", &self.len())
            .finish()
    }
}
