//! Error taxonomy for the dashboard
//!
//! Startup-fatal errors (`Connectivity`, `InterfaceLoad`, `Config`) stop the
//! process. Everything else is caught at the boundary of the action that
//! triggered it and rendered; the session keeps running.

use alloy_primitives::B256;
use governance_validation::ValidationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AccessError {
    /// Gateway unreachable or not answering JSON-RPC
    #[error("could not reach the chain gateway at {url}: {reason}")]
    Connectivity { url: String, reason: String },

    /// Missing or malformed interface description
    #[error("contract interface could not be loaded: {0}")]
    InterfaceLoad(String),

    /// Bad user input; no remote call was issued
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The contract reverted a read or a write
    #[error("contract call reverted: {0}")]
    ContractCall(String),

    /// Signing or submission failure
    #[error("transaction failed: {0}")]
    Transaction(String),

    /// No receipt within the polling bound
    #[error("no receipt for {tx_hash} after {waited_secs}s")]
    Timeout { tx_hash: B256, waited_secs: u64 },

    /// Gateway error object that is not a revert
    #[error("gateway error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("configuration error: {0}")]
    Config(String),
}

impl AccessError {
    pub fn is_fatal_at_startup(&self) -> bool {
        matches!(
            self,
            AccessError::Connectivity { .. } | AccessError::InterfaceLoad(_) | AccessError::Config(_)
        )
    }

    /// Signing, submission and receipt-wait failures
    pub fn is_transaction_failure(&self) -> bool {
        matches!(self, AccessError::Transaction(_) | AccessError::Timeout { .. })
    }

    pub fn is_revert(&self) -> bool {
        matches!(self, AccessError::ContractCall(_))
    }
}

pub type AccessResult<T> = Result<T, AccessError>;
