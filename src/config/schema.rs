//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files.
//! Every field has a default so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};

/// Root configuration for a signup session.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct SignupConfig {
    /// Remote referral service settings.
    pub api: ApiConfig,

    /// Wallet connection and signing settings.
    pub wallet: WalletConfig,

    /// Submission flow policy.
    pub signup: FlowConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Remote referral service configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    /// Base endpoint every operation path is joined onto.
    pub base_url: String,

    /// Deadline for a single request/response exchange in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api/referral".to_string(),
            request_timeout_secs: 10,
        }
    }
}

/// Wallet configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct WalletConfig {
    /// Chain ID the local signer is bound to.
    pub chain_id: u64,

    /// Deadline for an account access request in seconds.
    pub connect_timeout_secs: u64,

    /// Deadline for a personal-sign request in seconds.
    pub sign_timeout_secs: u64,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            chain_id: 1,
            connect_timeout_secs: 60,
            sign_timeout_secs: 60,
        }
    }
}

/// Submission flow policy.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct FlowConfig {
    /// Refuse to reserve a slot without a wallet signature.
    ///
    /// When false, a session without an active signing capability submits
    /// an empty signature and message.
    pub require_signature: bool,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
