//! Patient Data Governance Dashboard
//!
//! Interactive two-role session over the access-control contract.
//! Configuration comes from the environment (or a `.env` file in the
//! working directory); flags override it.
//!
//! Usage:
//!   governance-dashboard [--abi <path>] [--receipt-timeout-secs <n>] [--poll-interval-ms <n>]

use anyhow::Context;
use clap::Parser;
use colored::*;
use governance_core::config::{
    load_env_file, DEFAULT_ABI_PATH, DEFAULT_POLL_INTERVAL_MS, DEFAULT_RECEIPT_TIMEOUT_SECS,
};
use governance_core::render;
use governance_core::*;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "governance-dashboard")]
#[command(author = "Patient Data Governance")]
#[command(version = "0.1.0")]
#[command(about = "Patient / provider dashboard for timed access to patient records", long_about = None)]
struct Cli {
    /// JSON-RPC endpoint of the chain gateway
    #[arg(long, env = "ALCHEMY_RPC")]
    rpc_url: String,

    /// Deployed contract address
    #[arg(long, env = "CONTRACT_ADDRESS")]
    contract_address: String,

    /// Address that signs and sends patient transactions
    #[arg(long, env = "SENDER_ADDRESS")]
    sender_address: String,

    /// Signing key for the sender address
    #[arg(long, env = "PRIVATE_KEY", hide_env_values = true, hide = true)]
    private_key: String,

    /// Contract interface description (JSON ABI or build artifact)
    #[arg(long, env = "CONTRACT_ABI", default_value = DEFAULT_ABI_PATH)]
    abi: PathBuf,

    /// Give up waiting for a receipt after this many seconds
    #[arg(long, default_value_t = DEFAULT_RECEIPT_TIMEOUT_SECS)]
    receipt_timeout_secs: u64,

    /// Delay between receipt polls
    #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL_MS)]
    poll_interval_ms: u64,
}

fn main() -> anyhow::Result<()> {
    // Must run before clap reads the environment
    load_env_file(Path::new(".env")).context("could not load .env")?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = DashboardConfig::from_raw(
        &cli.rpc_url,
        &cli.contract_address,
        &cli.sender_address,
        &cli.private_key,
        cli.abi,
    )?;
    config.gateway.receipt = ReceiptPolicy {
        timeout: Duration::from_secs(cli.receipt_timeout_secs),
        poll_interval: Duration::from_millis(cli.poll_interval_ms),
    };

    let gateway = HttpGateway::connect(&config.gateway)
        .context("Failed to connect to the chain gateway. Check your RPC URL.")?;
    let client_version = gateway.client_version()?;

    let binding = ContractBinding::load(config.contract_address, &config.abi_path)
        .with_context(|| format!("{} could not be used as the contract interface", config.abi_path.display()))?;

    let signer = LocalSigner::from_hex(&config.private_key)?;
    let builder = TransactionBuilder::new(
        signer,
        config.sender_address,
        GasPolicy::default(),
        config.gateway.receipt,
    )?;

    println!("{}", render::banner(binding.address(), &client_version));

    let stdin = io::stdin();
    let mut console = Console::new(&gateway, &binding, &builder, stdin.lock(), io::stdout());
    console.run()?;

    println!("{}", "Session ended.".dimmed());
    Ok(())
}
