//! Referral signup CLI.
//!
//! Drives one signup session against the configured referral service,
//! using the private key in `REFERRAL_WALLET_PRIVATE_KEY` as the wallet.
//!
//! ```text
//! apply code → open dialog (connect wallet) → enter email → submit
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::sync::watch;

use referral_signup::config::{self, ConfigError, SignupConfig};
use referral_signup::observability;
use referral_signup::wallet::WalletProvider;
use referral_signup::{
    HttpReferralClient, LocalWalletProvider, Phase, ReferralApi, SessionState, SignupController,
    WalletConnector,
};

#[derive(Parser)]
#[command(name = "referral-signup")]
#[command(about = "Redeem a referral code with a wallet signature", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override api.base_url
    #[arg(long)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full signup flow
    Signup {
        #[arg(long)]
        code: String,
        #[arg(long)]
        email: String,
    },
    /// Only check whether a referral code is valid
    CheckCode { code: String },
}

fn load(cli: &Cli) -> Result<SignupConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => {
            let mut config = SignupConfig::default();
            config::loader::apply_env_overrides(&mut config);
            config
        }
    };
    if let Some(url) = &cli.api_url {
        config.api.base_url = url.clone();
    }
    config::validation::validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

fn render(state: &SessionState) -> String {
    let mut line = match state.phase {
        Phase::Idle => "Enter a referral code".to_string(),
        Phase::CodeApplied => "Your referral code is valid! Please connect your wallet to continue".to_string(),
        Phase::WalletPending => "Connecting...".to_string(),
        Phase::WalletConnected => format!(
            "Connected wallet: {}. Please provide your email to complete the process",
            state.wallet_address.as_deref().unwrap_or_default()
        ),
        Phase::Submitting => "Submitting...".to_string(),
        Phase::Completed => "You are now a VIP member.".to_string(),
    };
    if let Some(error) = &state.error_message {
        line.push_str(&format!(" [error: {}]", error));
    }
    if let Some(alert) = &state.alert {
        line.push_str(&format!(" [alert: {}]", alert));
    }
    line
}

/// Print every published state until the sender goes away.
async fn follow(mut updates: watch::Receiver<SessionState>) {
    while updates.changed().await.is_ok() {
        let line = render(&updates.borrow_and_update());
        println!("{}", line);
    }
}

async fn signup(config: &SignupConfig, api: Arc<dyn ReferralApi>, code: String, email: String) -> ExitCode {
    let provider: Option<Arc<dyn WalletProvider>> =
        match LocalWalletProvider::from_env(config.wallet.chain_id) {
            Ok(wallet) => {
                tracing::info!(
                    address = %wallet.address(),
                    chain_id = wallet.chain_id(),
                    "Local wallet loaded"
                );
                Some(Arc::new(wallet))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Local wallet unavailable");
                None
            }
        };
    let connector = WalletConnector::new(provider, &config.wallet)
        .with_on_connect(|address| tracing::info!(address = %address, "Connected wallet address"));
    let controller = SignupController::new(api, connector, config.signup.clone());
    let printer = tokio::spawn(follow(controller.subscribe()));

    controller.set_referral_code(code);
    controller.apply_code().await;
    if controller.state().phase == Phase::CodeApplied {
        controller.open_collection().await;
    }
    if controller.state().phase == Phase::WalletConnected {
        controller.set_email(email);
        controller.submit().await;
    }

    let state = controller.state();
    controller.teardown();
    drop(controller);
    if let Err(e) = printer.await {
        tracing::warn!(error = %e, "State printer task failed");
    }

    if state.is_completed() {
        ExitCode::SUCCESS
    } else {
        eprintln!("{}", render(&state));
        ExitCode::FAILURE
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    observability::init_logging(&config.observability.log_level);

    let api: Arc<dyn ReferralApi> = match HttpReferralClient::new(&config.api) {
        Ok(client) => {
            tracing::debug!(base_url = %client.base_url(), "Referral client ready");
            Arc::new(client)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Signup { code, email } => signup(&config, api, code, email).await,
        Commands::CheckCode { code } => {
            if api.verify_referral_code(&code).await {
                println!("Referral code {} is valid", code);
                ExitCode::SUCCESS
            } else {
                println!("Invalid referral code");
                ExitCode::FAILURE
            }
        }
    }
}
