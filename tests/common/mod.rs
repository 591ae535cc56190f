//! Shared fakes for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::net::TcpListener;

use referral_signup::config::{FlowConfig, WalletConfig};
use referral_signup::wallet::{
    AccountListeners, AccountsHandler, Subscription, WalletError, WalletProvider, WalletResult,
};
use referral_signup::{ReferralApi, ReservationRequest, SignupController, WalletConnector};

/// One call made against a fake collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    VerifyCode(String),
    WalletUsed(String),
    EmailTaken(String),
    Reserve(ReservationRequest),
}

/// In-memory referral service with scripted answers.
pub struct FakeReferralApi {
    pub code_valid: AtomicBool,
    pub wallet_used: AtomicBool,
    pub email_taken: AtomicBool,
    pub reserve_ok: AtomicBool,
    /// Panic inside `is_email_taken`.
    pub panic_on_email: AtomicBool,
    calls: Mutex<Vec<Call>>,
}

impl Default for FakeReferralApi {
    fn default() -> Self {
        Self {
            code_valid: AtomicBool::new(true),
            wallet_used: AtomicBool::new(false),
            email_taken: AtomicBool::new(false),
            reserve_ok: AtomicBool::new(true),
            panic_on_email: AtomicBool::new(false),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl FakeReferralApi {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn reservations(&self) -> Vec<ReservationRequest> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Reserve(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ReferralApi for FakeReferralApi {
    async fn verify_referral_code(&self, code: &str) -> bool {
        self.record(Call::VerifyCode(code.to_string()));
        tokio::task::yield_now().await;
        self.code_valid.load(Ordering::SeqCst)
    }

    async fn is_wallet_used(&self, address: &str) -> bool {
        self.record(Call::WalletUsed(address.to_string()));
        tokio::task::yield_now().await;
        self.wallet_used.load(Ordering::SeqCst)
    }

    async fn is_email_taken(&self, email: &str) -> bool {
        self.record(Call::EmailTaken(email.to_string()));
        tokio::task::yield_now().await;
        if self.panic_on_email.load(Ordering::SeqCst) {
            panic!("email lookup exploded");
        }
        self.email_taken.load(Ordering::SeqCst)
    }

    async fn reserve_slot(&self, request: &ReservationRequest) -> bool {
        self.record(Call::Reserve(request.clone()));
        tokio::task::yield_now().await;
        self.reserve_ok.load(Ordering::SeqCst)
    }
}

/// Wallet provider with a fixed account list.
pub struct FakeWallet {
    pub accounts: Mutex<Vec<String>>,
    pub reject: AtomicBool,
    pub sign_fails: AtomicBool,
    /// Never answer signing requests.
    pub sign_hangs: AtomicBool,
    pub listeners: AccountListeners,
    pub signed: Mutex<Vec<(String, String)>>,
    pub access_requests: Mutex<u32>,
}

impl FakeWallet {
    pub fn with_account(address: &str) -> Self {
        Self {
            accounts: Mutex::new(vec![address.to_string()]),
            reject: AtomicBool::new(false),
            sign_fails: AtomicBool::new(false),
            sign_hangs: AtomicBool::new(false),
            listeners: AccountListeners::new(),
            signed: Mutex::new(Vec::new()),
            access_requests: Mutex::new(0),
        }
    }

    /// Simulate the user switching or disconnecting accounts.
    pub fn change_accounts(&self, accounts: &[&str]) {
        let accounts: Vec<String> = accounts.iter().map(|a| a.to_string()).collect();
        *self.accounts.lock().unwrap() = accounts.clone();
        self.listeners.emit(&accounts);
    }
}

#[async_trait]
impl WalletProvider for FakeWallet {
    async fn request_accounts(&self) -> WalletResult<Vec<String>> {
        *self.access_requests.lock().unwrap() += 1;
        tokio::task::yield_now().await;
        if self.reject.load(Ordering::SeqCst) {
            return Err(WalletError::Rejected("User rejected the request.".to_string()));
        }
        Ok(self.accounts.lock().unwrap().clone())
    }

    async fn sign_personal_message(&self, message: &str, address: &str) -> WalletResult<String> {
        tokio::task::yield_now().await;
        if self.sign_hangs.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.sign_fails.load(Ordering::SeqCst) {
            return Err(WalletError::Signing("User denied message signature.".to_string()));
        }
        self.signed
            .lock()
            .unwrap()
            .push((message.to_string(), address.to_string()));
        Ok(format!("0xsig-{}", address))
    }

    fn on_accounts_changed(&self, handler: AccountsHandler) -> Subscription {
        self.listeners.subscribe(handler)
    }
}

/// A controller wired to fresh fakes.
pub fn controller_with(
    api: Arc<FakeReferralApi>,
    wallet: Option<Arc<FakeWallet>>,
    policy: FlowConfig,
) -> SignupController {
    let provider = wallet.map(|w| w as Arc<dyn WalletProvider>);
    let connector = WalletConnector::new(provider, &WalletConfig::default());
    SignupController::new(api, connector, policy)
}

/// Shared state of the mock referral server.
#[derive(Default)]
pub struct MockService {
    pub valid_codes: Vec<String>,
    pub used_wallets: Vec<String>,
    pub used_emails: Vec<String>,
    pub reservations: Mutex<Vec<serde_json::Value>>,
    pub queries: Mutex<Vec<HashMap<String, String>>>,
}

async fn verify_code(
    State(service): State<Arc<MockService>>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<bool> {
    let valid = query
        .get("code")
        .map(|code| service.valid_codes.contains(code))
        .unwrap_or(false);
    service.queries.lock().unwrap().push(query);
    Json(valid)
}

async fn wallet_used(
    State(service): State<Arc<MockService>>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<bool> {
    let used = query
        .get("wallet")
        .map(|wallet| service.used_wallets.contains(wallet))
        .unwrap_or(false);
    service.queries.lock().unwrap().push(query);
    Json(used)
}

async fn email_used(
    State(service): State<Arc<MockService>>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<serde_json::Value> {
    let used = query
        .get("email")
        .map(|email| service.used_emails.contains(email))
        .unwrap_or(false);
    service.queries.lock().unwrap().push(query);
    Json(serde_json::json!({ "used": used }))
}

async fn reserve_slot(
    State(service): State<Arc<MockService>>,
    Json(body): Json<serde_json::Value>,
) -> Json<serde_json::Value> {
    service.reservations.lock().unwrap().push(body);
    Json(serde_json::json!({ "success": true }))
}

/// Serve `service` under `/api/referral` on an ephemeral port.
pub async fn start_mock_service(service: Arc<MockService>) -> SocketAddr {
    let api = Router::new()
        .route("/verifyCode", get(verify_code))
        .route("/isWalletUsed", get(wallet_used))
        .route("/isEmailUsed", get(email_used))
        .route("/reserveSlot", post(reserve_slot))
        .with_state(service);
    let app = Router::new()
        .nest("/api/referral", api)
        .route("/broken/verifyCode", get(|| async { "not json" }))
        .route(
            "/failing/verifyCode",
            get(|| async { (axum::http::StatusCode::INTERNAL_SERVER_ERROR, "true") }),
        )
        .route(
            "/slow/verifyCode",
            get(|| async {
                tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                Json(true)
            }),
        );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}
