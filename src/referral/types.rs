//! Wire types for the referral service.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::resilience::TimedOut;

/// The payload committed by the single mutating call of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationRequest {
    pub code: String,
    pub wallet_address: String,
    pub email: String,
    /// `0x`-prefixed personal-sign signature, empty when signing was skipped.
    pub signature: String,
    /// The exact text that was signed, empty when signing was skipped.
    pub message: String,
}

/// A boolean answer from the service.
///
/// Endpoints reply either with a bare JSON boolean or with an object
/// carrying one named flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub(crate) enum FlagResponse {
    Bare(bool),
    Object(FlagObject),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub(crate) struct FlagObject {
    #[serde(alias = "valid", alias = "used", alias = "reserved")]
    success: bool,
}

impl FlagResponse {
    pub(crate) fn value(self) -> bool {
        match self {
            FlagResponse::Bare(flag) => flag,
            FlagResponse::Object(object) => object.success,
        }
    }
}

/// Why a referral API call produced no usable answer.
///
/// Never escapes the client: every variant is logged and turned into `false`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid endpoint: {0}")]
    Endpoint(#[from] url::ParseError),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("service returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("unexpected response body: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Timeout(#[from] TimedOut),
}

impl ApiError {
    /// Short label used as a metrics outcome.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Endpoint(_) => "endpoint",
            ApiError::Transport(_) => "transport",
            ApiError::Status(_) => "status",
            ApiError::Parse(_) => "parse",
            ApiError::Timeout(_) => "timeout",
        }
    }
}
