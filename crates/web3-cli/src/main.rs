//! # web3
//!
//! Command-line interface for Ethereum-compatible networks.
//!
//! ## Usage
//!
//! ```bash
//! # Query commands
//! web3 block latest
//! web3 tx 0x...
//! web3 balance 0x742d35Cc6634C0532925a3b844Bc9e7595f0aB3d
//! web3 --network ethereum snapshot
//!
//! # Transfers
//! web3 transfer 0.1 to 0x...
//! web3 transfer 10 to 0x... --erc20 --address 0x...
//!
//! # Contracts
//! web3 contract build Token.sol
//! web3 contract deploy Token.bin
//! web3 contract call --abi erc20 --address 0x... --function balanceOf 0x...
//!
//! # Identity
//! web3 did create did:go:alice --registry 0x...
//! web3 claim sign --id cred-1 --type AgeCredential --issuer did:go:alice --subject did:go:bob
//! ```

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use web3_sdk::CancellationToken;

mod commands;
mod config;
mod error;
mod keystore;
mod output;

pub use config::{Config, Settings};
pub use error::CliError;
pub use output::{Output, OutputFormat};

/// Signing key variable
pub const PRIVATE_KEY_VAR: &str = "WEB3_PRIVATE_KEY";
/// Contract address variable
pub const ADDRESS_VAR: &str = "WEB3_ADDRESS";
/// Network name variable
pub const NETWORK_VAR: &str = "WEB3_NETWORK";
/// RPC URL variable
pub const RPC_URL_VAR: &str = "WEB3_RPC_URL";
/// DIDRegistry address variable
pub const DID_REGISTRY_VAR: &str = "WEB3_DID_REGISTRY";
/// Output format variable
pub const FORMAT_VAR: &str = "WEB3_FORMAT";

/// Web3 CLI
#[derive(Parser, Debug)]
#[command(name = "web3")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Built-in network name
    #[arg(short, long, global = true, env = NETWORK_VAR)]
    network: Option<String>,

    /// Use the testnet network
    #[arg(long, global = true)]
    testnet: bool,

    /// RPC endpoint URL
    #[arg(long, global = true, env = RPC_URL_VAR)]
    rpc_url: Option<String>,

    /// Private key for signing
    #[arg(long, visible_alias = "pk", global = true, env = PRIVATE_KEY_VAR, hide_env_values = true)]
    private_key: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, global = true, env = FORMAT_VAR)]
    format: Option<OutputFormat>,

    /// Config file (default ~/.web3/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// CLI commands
#[derive(Debug, Subcommand)]
enum Commands {
    #[command(flatten)]
    Query(commands::query::QueryCommand),
    /// Transfer coins or ERC20 tokens: `transfer AMOUNT to ADDRESS`
    #[command(visible_alias = "send")]
    Transfer(commands::transfer::TransferCommand),
    /// Build, deploy and call contracts
    #[command(subcommand, visible_alias = "c")]
    Contract(commands::contract::ContractCommand),
    /// Account management
    #[command(subcommand, visible_alias = "a")]
    Account(commands::account::AccountCommand),
    /// Generate contract code
    #[command(subcommand, visible_alias = "g")]
    Generate(commands::generate::GenerateCommand),
    /// Decentralized identifiers
    #[command(subcommand)]
    Did(commands::did::DidCommand),
    /// Verifiable credentials
    #[command(subcommand)]
    Claim(commands::claim::ClaimCommand),
    /// Show WEB3_* environment variables
    Env,
}

fn init_tracing(verbose: bool, log_json: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    if log_json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);
    let json = cli.format == Some(OutputFormat::Json);

    if let Err(e) = run(cli).await {
        if matches!(e.downcast_ref::<CliError>(), Some(CliError::NotVerified)) {
            std::process::exit(1);
        }
        if json {
            println!(
                "{}",
                serde_json::json!({
                    "error": format!("{:#}", e),
                    "success": false
                })
            );
        } else {
            eprintln!("Error: {:#}", e);
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref()).context("cannot load config")?;
    let settings = Settings::resolve(
        cli.network.as_deref(),
        cli.testnet,
        cli.rpc_url.as_deref(),
        cli.format,
        cli.private_key,
        config,
    )?;
    tracing::debug!(url = %settings.endpoint.url, "resolved endpoint");

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted");
            on_signal.cancel();
        }
    });

    let ctx = commands::Context::new(settings, cancel);
    match cli.command {
        Commands::Query(cmd) => cmd.execute(&ctx).await?,
        Commands::Transfer(cmd) => cmd.execute(&ctx).await?,
        Commands::Contract(cmd) => cmd.execute(&ctx).await?,
        Commands::Account(cmd) => cmd.execute(&ctx).await?,
        Commands::Generate(cmd) => cmd.execute(&ctx).await?,
        Commands::Did(cmd) => cmd.execute(&ctx).await?,
        Commands::Claim(cmd) => cmd.execute(&ctx).await?,
        Commands::Env => commands::env::execute(&ctx)?,
    }
    Ok(())
}
