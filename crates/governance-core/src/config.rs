//! Fixed client policy and startup configuration
//!
//! The binaries assemble these structs from command-line flags and the
//! environment. Apart from `load_env_file`, which the binaries call before
//! parsing flags, library code never touches the environment.

use crate::error::{AccessError, AccessResult};
use alloy_primitives::Address;
use governance_validation::{parse_address, AddressRole};
use std::path::PathBuf;
use std::time::Duration;

/// Gas limit for every state-changing call
pub const GAS_LIMIT: u64 = 300_000;

/// Gas price in gwei
pub const GAS_PRICE_GWEI: u64 = 10;

pub const WEI_PER_GWEI: u128 = 1_000_000_000;

/// Public test network the contract is deployed on
pub const SEPOLIA_CHAIN_ID: u64 = 11_155_111;

/// Lifetime of a grant issued from the patient dashboard
pub const GRANT_DURATION_SECS: u64 = 3600;

/// Interface description, relative to the working directory
pub const DEFAULT_ABI_PATH: &str = "contract_abi.json";

pub const EXPLORER_TX_BASE: &str = "https://sepolia.etherscan.io/tx/";

pub const DEFAULT_RECEIPT_TIMEOUT_SECS: u64 = 120;

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Where and how to talk to the JSON-RPC endpoint
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    pub rpc_url: String,
    pub receipt: ReceiptPolicy,
    pub request_timeout: Duration,
}

impl GatewayConfig {
    pub fn new(rpc_url: impl Into<String>) -> Self {
        GatewayConfig {
            rpc_url: rpc_url.into(),
            receipt: ReceiptPolicy::default(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Polling bound for receipt waits
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReceiptPolicy {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for ReceiptPolicy {
    fn default() -> Self {
        ReceiptPolicy {
            timeout: Duration::from_secs(DEFAULT_RECEIPT_TIMEOUT_SECS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

/// Everything the dashboard needs at startup
#[derive(Clone, Debug)]
pub struct DashboardConfig {
    pub gateway: GatewayConfig,
    pub contract_address: Address,
    pub sender_address: Address,
    /// Hex-encoded secp256k1 key, `0x` prefix optional
    pub private_key: String,
    pub abi_path: PathBuf,
}

impl DashboardConfig {
    /// Validate raw startup values. Any problem here is fatal.
    pub fn from_raw(
        rpc_url: &str,
        contract_address: &str,
        sender_address: &str,
        private_key: &str,
        abi_path: PathBuf,
    ) -> AccessResult<Self> {
        if rpc_url.trim().is_empty() {
            return Err(AccessError::Config("RPC endpoint URL is empty".to_string()));
        }
        if private_key.trim().is_empty() {
            return Err(AccessError::Config("private signing key is empty".to_string()));
        }

        Ok(DashboardConfig {
            gateway: GatewayConfig::new(rpc_url.trim()),
            contract_address: parse_startup_address(AddressRole::Contract, contract_address)?,
            sender_address: parse_startup_address(AddressRole::Sender, sender_address)?,
            private_key: private_key.trim().to_string(),
            abi_path,
        })
    }
}

/// Address from configuration; a bad value is a config error, not a
/// validation error, because it halts startup.
pub fn parse_startup_address(role: AddressRole, raw: &str) -> AccessResult<Address> {
    parse_address(role, raw).map_err(|e| AccessError::Config(e.to_string()))
}

/// Load `KEY=value` pairs from `path` into the process environment without
/// overriding variables that are already set. A missing file is not an
/// error (`Ok(false)`); an unreadable or malformed one is.
#[cfg(feature = "cli")]
pub fn load_env_file(path: &std::path::Path) -> AccessResult<bool> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(true),
        Err(dotenvy::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(AccessError::Config(format!("{}: {}", path.display(), e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_constants() {
        assert_eq!(GAS_LIMIT, 300_000);
        assert_eq!(GAS_PRICE_GWEI as u128 * WEI_PER_GWEI, 10_000_000_000);
        assert_eq!(SEPOLIA_CHAIN_ID, 11155111);
        assert_eq!(GRANT_DURATION_SECS, 3600);
    }

    #[test]
    fn test_from_raw_rejects_bad_contract_address() {
        let err = DashboardConfig::from_raw(
            "https://rpc.example",
            "0xnotanaddress",
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
            "0x01",
            PathBuf::from(DEFAULT_ABI_PATH),
        )
        .unwrap_err();
        assert!(matches!(err, AccessError::Config(_)));
        assert!(err.is_fatal_at_startup());
    }

    #[test]
    fn test_from_raw_accepts_valid_values() {
        let config = DashboardConfig::from_raw(
            " https://rpc.example ",
            "0xfb6916095ca1df60bb79ce92ce3ea74c37c5d359",
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
            "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318",
            PathBuf::from(DEFAULT_ABI_PATH),
        )
        .unwrap();
        assert_eq!(config.gateway.rpc_url, "https://rpc.example");
        assert_eq!(config.gateway.receipt, ReceiptPolicy::default());
    }

    #[cfg(feature = "cli")]
    fn scratch_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("governance-{}-{}.env", std::process::id(), name));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[cfg(feature = "cli")]
    #[test]
    fn test_load_env_file_missing_is_ok() {
        let path = std::env::temp_dir().join(format!("governance-{}-absent.env", std::process::id()));
        assert_eq!(load_env_file(&path).unwrap(), false);
    }

    #[cfg(feature = "cli")]
    #[test]
    fn test_load_env_file_malformed_is_config_error() {
        let path = scratch_file("malformed", "this is not a valid line\n");
        let err = load_env_file(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, AccessError::Config(_)));
        assert!(err.is_fatal_at_startup());
    }

    #[cfg(feature = "cli")]
    #[test]
    fn test_load_env_file_sets_missing_variables() {
        let path = scratch_file("valid", "GOVERNANCE_TEST_ENV_VALUE=from-file\n");
        assert!(load_env_file(&path).unwrap());
        std::fs::remove_file(&path).ok();
        assert_eq!(std::env::var("GOVERNANCE_TEST_ENV_VALUE").unwrap(), "from-file");
    }
}
