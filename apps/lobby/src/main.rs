//! Headless lobby shell.
//!
//! Plays the presentation role in a terminal: renders the connector list the
//! registry publishes and drives one connection attempt.

mod logging;

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use clap::{Parser, Subcommand, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use velvet_core::{
    ChainId, ConnectOutcome, ConnectorError, DomainEvent, KeychainPrompt, RegistryStatus,
    SessionState, Theme, VelvetConfig, WalletService,
};

#[derive(Parser)]
#[command(name = "velvet-lobby", version, about = "Velvet Ace wallet lobby")]
struct Cli {
    /// Verbose logging for velvet crates
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Skip the hosted controller connector
    #[arg(long, global = true)]
    no_controller: bool,

    /// Skip predeployed Katana accounts
    #[arg(long, global = true)]
    no_predeployed: bool,

    /// Use the development variant (simulated connecting delay)
    #[arg(long, global = true)]
    dev: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load every source and print the merged connector list
    List {
        /// Case-insensitive name filter
        #[arg(short, long, default_value = "")]
        filter: String,

        #[arg(long, value_enum, default_value_t = ThemeArg::Dark)]
        theme: ThemeArg,
    },
    /// Connect the given connector and print the account
    Connect {
        connector_id: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ThemeArg {
    Dark,
    Light,
}

impl From<ThemeArg> for Theme {
    fn from(theme: ThemeArg) -> Self {
        match theme {
            ThemeArg::Dark => Theme::Dark,
            ThemeArg::Light => Theme::Light,
        }
    }
}

/// Controller keychain stand-in: asks for the account address on the terminal.
struct TerminalKeychain;

#[async_trait]
impl KeychainPrompt for TerminalKeychain {
    async fn authorize(&self, rpc_url: &str, chain_id: &ChainId) -> Result<String, ConnectorError> {
        eprintln!("Controller session on {} ({})", rpc_url, chain_id);
        eprint!("Account address (empty to decline): ");

        let mut line = String::new();
        BufReader::new(tokio::io::stdin())
            .read_line(&mut line)
            .await
            .map_err(|e| ConnectorError::rejected(format!("keychain unavailable: {}", e)))?;

        let address = line.trim();
        if address.is_empty() {
            return Err(ConnectorError::rejected("user declined"));
        }
        Ok(address.to_string())
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<VelvetConfig> {
    let mut config = VelvetConfig::from_env().context("Failed to load configuration")?;
    if cli.dev {
        config.session = VelvetConfig::development().session;
    }
    if cli.no_controller {
        config.controller.enabled = false;
    }
    if cli.no_predeployed {
        config.predeployed.enabled = false;
    }
    Ok(config)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose);

    let config = load_config(&cli)?;
    debug!(?config, "Loaded configuration");

    let wallet = WalletService::builder(config)
        .with_keychain_prompt(Arc::new(TerminalKeychain))
        .build();

    match cli.command {
        Command::List { filter, theme } => list(&wallet, &filter, theme.into()).await,
        Command::Connect { connector_id } => connect(&wallet, &connector_id).await,
    }
}

async fn list(wallet: &WalletService, filter: &str, theme: Theme) -> anyhow::Result<()> {
    let snapshot = wallet.refresh().await;

    if snapshot.status() == RegistryStatus::NoConnectorsAvailable {
        eprintln!("No wallets available. Install Argent X or Braavos, or start Katana.");
    }

    let views: Vec<_> = snapshot
        .filter(filter)
        .iter()
        .map(|d| d.view(theme))
        .collect();
    println!("{}", serde_json::to_string_pretty(&views)?);
    Ok(())
}

async fn connect(wallet: &WalletService, connector_id: &str) -> anyhow::Result<()> {
    let mut events = wallet.subscribe();
    let progress = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            if let DomainEvent::SessionStateChanged { connector_id, state, .. } = event {
                if state == SessionState::Connecting {
                    eprintln!("{} ... Connecting...", connector_id);
                }
                if state.is_terminal() {
                    break;
                }
            }
        }
    });

    wallet.refresh().await;
    let outcome = wallet.connect(connector_id).await;
    progress.abort();

    match outcome {
        ConnectOutcome::Connected(account) => {
            info!(address = %account.address, "Connected");
            println!("{}", account.short());
            Ok(())
        }
        ConnectOutcome::Failed(failure) => {
            anyhow::bail!("{}: {}", failure.connector_name, failure.reason)
        }
        ConnectOutcome::Ignored(reason) => {
            anyhow::bail!("'{}' cannot be selected ({:?})", connector_id, reason)
        }
        ConnectOutcome::Abandoned => anyhow::bail!("connection abandoned"),
    }
}
