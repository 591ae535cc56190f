//! Referral service client.
//!
//! # Responsibilities
//! - Issue the four referral operations against the configured base URL
//! - Bound every call with the request deadline
//! - Fail soft: transport, status, timeout and parse failures become `false`

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use url::Url;

use crate::config::ApiConfig;
use crate::observability::metrics;
use crate::referral::types::{ApiError, FlagResponse, ReservationRequest};
use crate::resilience::Deadline;

/// Operations offered by the remote referral service.
///
/// Implementations never return errors. A call that cannot be answered
/// reports `false`, so "unknown" reads as "invalid code", "wallet not used",
/// "email not taken" and "not reserved" respectively. The later validation
/// steps and the server-side reservation are the authority.
#[async_trait]
pub trait ReferralApi: Send + Sync {
    /// True iff the service reports `code` valid.
    async fn verify_referral_code(&self, code: &str) -> bool;

    /// True iff `address` already redeemed a code.
    async fn is_wallet_used(&self, address: &str) -> bool;

    /// True iff `email` is already taken.
    async fn is_email_taken(&self, email: &str) -> bool;

    /// Commit the reservation. True iff the server confirms it.
    async fn reserve_slot(&self, request: &ReservationRequest) -> bool;
}

/// HTTP implementation of [`ReferralApi`].
#[derive(Clone)]
pub struct HttpReferralClient {
    client: Client,
    base_url: Url,
    deadline: Deadline,
}

impl HttpReferralClient {
    /// Create a client for the configured service.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        // A base without trailing slash would lose its last segment on join.
        let mut base = config.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)?;
        let client = Client::builder().build()?;

        tracing::info!(
            base_url = %base_url,
            request_timeout_secs = config.request_timeout_secs,
            "Referral client initialized"
        );

        Ok(Self {
            client,
            base_url,
            deadline: Deadline::from_secs("referral request", config.request_timeout_secs),
        })
    }

    /// Base URL operation paths are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(path)?)
    }

    /// Send `request` and decode a boolean answer.
    async fn fetch_flag(&self, request: RequestBuilder) -> Result<bool, ApiError> {
        let exchange = async {
            let response = request.send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(ApiError::Status(status));
            }
            let body = response.bytes().await?;
            let flag: FlagResponse = serde_json::from_slice(&body)?;
            Ok::<bool, ApiError>(flag.value())
        };

        self.deadline.run(exchange).await?
    }

    /// Run one operation, logging and swallowing any failure.
    async fn flag_or_false(
        &self,
        operation: &'static str,
        request: Result<RequestBuilder, ApiError>,
    ) -> bool {
        let result = match request {
            Ok(request) => self.fetch_flag(request).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(flag) => {
                metrics::record_api_request(operation, "ok");
                tracing::debug!(operation, flag, "Referral API answered");
                flag
            }
            Err(e) => {
                metrics::record_api_request(operation, e.kind());
                tracing::warn!(operation, error = %e, "Referral API request failed");
                false
            }
        }
    }

    fn get(&self, path: &str, key: &str, value: &str) -> Result<RequestBuilder, ApiError> {
        let url = self.endpoint(path)?;
        Ok(self.client.get(url).query(&[(key, value)]))
    }
}

#[async_trait]
impl ReferralApi for HttpReferralClient {
    async fn verify_referral_code(&self, code: &str) -> bool {
        let request = self.get("verifyCode", "code", code);
        self.flag_or_false("verify_code", request).await
    }

    async fn is_wallet_used(&self, address: &str) -> bool {
        let request = self.get("isWalletUsed", "wallet", address);
        self.flag_or_false("wallet_used", request).await
    }

    async fn is_email_taken(&self, email: &str) -> bool {
        let request = self.get("isEmailUsed", "email", email);
        self.flag_or_false("email_used", request).await
    }

    async fn reserve_slot(&self, request: &ReservationRequest) -> bool {
        let builder = self
            .endpoint("reserveSlot")
            .map(|url| self.client.post(url).json(request));

        let reserved = self.flag_or_false("reserve_slot", builder).await;
        tracing::info!(
            code = %request.code,
            wallet = %request.wallet_address,
            signed = !request.signature.is_empty(),
            reserved,
            "Slot reservation submitted"
        );
        reserved
    }
}

impl std::fmt::Debug for HttpReferralClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpReferralClient")
            .field("base_url", &self.base_url.as_str())
            .field("timeout_secs", &self.deadline.duration().as_secs())
            .finish()
    }
}
