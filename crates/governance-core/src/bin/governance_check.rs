//! Connection check
//!
//! Confirms the gateway answers and the interface file loads, then lists
//! the contract functions it exposes. Nothing is signed or sent.
//!
//! Usage:
//!   governance-check [--rpc-url <url>] [--contract-address <address>] [--abi <path>]

use anyhow::Context;
use clap::Parser;
use colored::*;
use governance_core::config::{load_env_file, parse_startup_address, DEFAULT_ABI_PATH};
use governance_core::render;
use governance_core::{AddressRole, ChainGateway, ContractBinding, GatewayConfig, HttpGateway};
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "governance-check")]
#[command(author = "Patient Data Governance")]
#[command(version = "0.1.0")]
#[command(about = "Check the gateway connection and the contract interface", long_about = None)]
struct Cli {
    /// JSON-RPC endpoint of the chain gateway
    #[arg(long, env = "ALCHEMY_RPC")]
    rpc_url: String,

    /// Deployed contract address
    #[arg(long, env = "CONTRACT_ADDRESS")]
    contract_address: String,

    /// Contract interface description (JSON ABI or build artifact)
    #[arg(long, env = "CONTRACT_ABI", default_value = DEFAULT_ABI_PATH)]
    abi: PathBuf,
}

fn main() -> anyhow::Result<()> {
    // Must run before clap reads the environment
    load_env_file(Path::new(".env")).context("could not load .env")?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let gateway = HttpGateway::connect(&GatewayConfig::new(cli.rpc_url.trim()))
        .context("Failed to connect to the chain gateway. Check your RPC URL.")?;

    println!("{}", render::heading("CONNECTION CHECK"));
    println!("{} Connected to {}", "✓".green(), gateway.url());
    println!("  Client:   {}", gateway.client_version()?.cyan());
    println!("  Chain ID: {}", gateway.chain_id()?.to_string().cyan());

    let contract = parse_startup_address(AddressRole::Contract, &cli.contract_address)?;
    let binding = ContractBinding::load(contract, &cli.abi)
        .with_context(|| format!("{} could not be used as the contract interface", cli.abi.display()))?;

    println!();
    println!("{}", "Contract functions:".bold());
    for signature in binding.function_signatures() {
        println!("  - {}", signature);
    }

    Ok(())
}
