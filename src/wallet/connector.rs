//! Wallet connection management.
//!
//! # Responsibilities
//! - Request account access from the injected provider, once per invocation
//! - Refuse overlapping connect requests
//! - Track the connected account across provider account changes
//! - Hold the account-change subscription until released

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::config::WalletConfig;
use crate::resilience::Deadline;
use crate::wallet::provider::{AccountsHandler, Subscription, WalletProvider};
use crate::wallet::types::{WalletError, WalletResult};

/// Notification fired with the address of every successful connect.
pub type ConnectHook = Box<dyn Fn(&str) + Send + Sync>;

/// Connects to a wallet provider and signs with the selected account.
pub struct WalletConnector {
    provider: Option<Arc<dyn WalletProvider>>,
    account: Arc<Mutex<Option<String>>>,
    connecting: AtomicBool,
    last_error: Mutex<Option<String>>,
    subscription: Mutex<Option<Subscription>>,
    on_connect: Option<ConnectHook>,
    connect_deadline: Deadline,
    sign_deadline: Deadline,
}

/// Clears the in-flight flag when a connect attempt ends, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl WalletConnector {
    /// Create a connector. `None` means no wallet is installed; every
    /// connect then fails with [`WalletError::NoWallet`].
    pub fn new(provider: Option<Arc<dyn WalletProvider>>, config: &WalletConfig) -> Self {
        if provider.is_none() {
            tracing::warn!("No wallet provider available");
        }
        Self {
            provider,
            account: Arc::new(Mutex::new(None)),
            connecting: AtomicBool::new(false),
            last_error: Mutex::new(None),
            subscription: Mutex::new(None),
            on_connect: None,
            connect_deadline: Deadline::from_secs("wallet connect", config.connect_timeout_secs),
            sign_deadline: Deadline::from_secs("wallet sign", config.sign_timeout_secs),
        }
    }

    /// Fire `hook` after every successful connect.
    pub fn with_on_connect(mut self, hook: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_connect = Some(Box::new(hook));
        self
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// True while a connect request is waiting on the provider.
    pub fn is_connecting(&self) -> bool {
        self.connecting.load(Ordering::SeqCst)
    }

    /// The connected account, if any.
    pub fn account(&self) -> Option<String> {
        lock(&self.account).clone()
    }

    /// Message of the last failed connect, cleared by the next attempt.
    pub fn last_error(&self) -> Option<String> {
        lock(&self.last_error).clone()
    }

    /// A provider is present and an account is connected.
    pub fn is_session_active(&self) -> bool {
        self.provider.is_some() && self.account().is_some()
    }

    /// Request account access and return the selected account.
    pub async fn connect(&self) -> WalletResult<String> {
        let _in_flight = InFlight::acquire(&self.connecting).ok_or(WalletError::ConnectInProgress)?;
        *lock(&self.last_error) = None;

        match self.request_first_account().await {
            Ok(address) => {
                *lock(&self.account) = Some(address.clone());
                tracing::info!(address = %address, "Wallet connected");
                if let Some(hook) = &self.on_connect {
                    hook(&address);
                }
                Ok(address)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Wallet connection failed");
                *lock(&self.last_error) = Some(e.to_string());
                Err(e)
            }
        }
    }

    async fn request_first_account(&self) -> WalletResult<String> {
        let provider = self.provider.as_ref().ok_or(WalletError::NoWallet)?;
        let accounts = self.connect_deadline.run(provider.request_accounts()).await??;
        accounts.into_iter().next().ok_or(WalletError::NoAccounts)
    }

    /// Follow account changes from the provider.
    ///
    /// The connector's own account is updated before `handler` runs. A
    /// previous subscription is replaced, so at most one listener is live.
    pub fn watch_accounts(&self, handler: AccountsHandler) -> WalletResult<()> {
        let provider = self.provider.as_ref().ok_or(WalletError::NoWallet)?;
        let account = Arc::clone(&self.account);

        let subscription = provider.on_accounts_changed(Arc::new(move |accounts: &[String]| {
            let next = accounts.first().cloned();
            match &next {
                Some(address) => tracing::info!(address = %address, "Wallet account changed"),
                None => tracing::info!("Wallet disconnected by provider"),
            }
            *lock(&account) = next;
            handler(accounts);
        }));

        // The old subscription is dropped after the lock guard is released.
        let previous = lock(&self.subscription).replace(subscription);
        drop(previous);
        Ok(())
    }

    /// Sign `message` with the connected account.
    pub async fn sign(&self, message: &str) -> WalletResult<String> {
        let provider = self.provider.as_ref().ok_or(WalletError::NoWallet)?;
        let address = self.account().ok_or(WalletError::NotConnected)?;

        self.sign_deadline
            .run(provider.sign_personal_message(message, &address))
            .await?
    }

    /// Drop the account-change subscription.
    pub fn release(&self) {
        let subscription = lock(&self.subscription).take();
        if let Some(subscription) = subscription {
            subscription.unsubscribe();
            tracing::debug!("Account change listener released");
        }
    }
}

impl std::fmt::Debug for WalletConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletConnector")
            .field("has_provider", &self.has_provider())
            .field("account", &self.account())
            .field("connecting", &self.is_connecting())
            .finish()
    }
}
