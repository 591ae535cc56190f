//! Wallet subsystem.
//!
//! # Data Flow
//! ```text
//! Injected capability (provider.rs: WalletProvider)
//!     → connector.rs (access request, in-flight guard, account tracking)
//!     → SignupController (address, signatures, account changes)
//!
//! local.rs: private-key provider for the CLI and tests
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from arguments or environment variables
//! - Never log private keys or signatures
//! - Connect and sign calls have configurable timeouts

pub mod connector;
pub mod local;
pub mod provider;
pub mod types;

pub use connector::WalletConnector;
pub use local::LocalWalletProvider;
pub use provider::{AccountListeners, AccountsHandler, Subscription, WalletProvider};
pub use types::{WalletError, WalletResult};
