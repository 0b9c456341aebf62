//! Chain Gateway Client
//!
//! `ChainGateway` is the seam every controller talks through. `HttpGateway`
//! implements it over a blocking JSON-RPC connection; tests substitute an
//! in-memory chain.

use crate::config::{GatewayConfig, ReceiptPolicy, SEPOLIA_CHAIN_ID};
use crate::error::{AccessError, AccessResult};
use crate::rpc::{parse_quantity, RpcRequest, RpcResponse};
use alloy_primitives::{Address, Bytes, B256};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Read-only contract call (`eth_call`)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallRequest {
    pub from: Option<Address>,
    pub to: Address,
    pub data: Bytes,
}

/// Confirmation that a transaction was included
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    pub transaction_hash: B256,
    pub block_number: u64,
    /// 1 = success, 0 = reverted
    pub status: u64,
    pub gas_used: u64,
}

impl Receipt {
    pub fn succeeded(&self) -> bool {
        self.status == 1
    }
}

pub trait ChainGateway {
    fn client_version(&self) -> AccessResult<String>;

    fn is_connected(&self) -> bool {
        self.client_version().is_ok()
    }

    fn chain_id(&self) -> AccessResult<u64>;

    /// Timestamp of the latest block. This is "now" for every expiry
    /// comparison; wall-clock time is never used.
    fn latest_block_timestamp(&self) -> AccessResult<u64>;

    /// Nonce for the next transaction from `address`
    fn transaction_count(&self, address: Address) -> AccessResult<u64>;

    fn call(&self, request: &CallRequest) -> AccessResult<Bytes>;

    fn send_raw_transaction(&self, raw: &[u8]) -> AccessResult<B256>;

    /// `None` while the transaction is pending
    fn transaction_receipt(&self, tx_hash: B256) -> AccessResult<Option<Receipt>>;

    /// Poll for a receipt until one arrives or the policy's timeout elapses.
    fn wait_for_receipt(&self, tx_hash: B256, policy: &ReceiptPolicy) -> AccessResult<Receipt> {
        let started = Instant::now();
        loop {
            if let Some(receipt) = self.transaction_receipt(tx_hash)? {
                return Ok(receipt);
            }
            if started.elapsed() >= policy.timeout {
                return Err(AccessError::Timeout {
                    tx_hash,
                    waited_secs: started.elapsed().as_secs(),
                });
            }
            std::thread::sleep(policy.poll_interval);
        }
    }
}

// =============================================================================
// HTTP JSON-RPC
// =============================================================================

pub struct HttpGateway {
    client: reqwest::blocking::Client,
    url: String,
    next_id: AtomicU64,
}

#[derive(Deserialize)]
struct BlockHeader {
    timestamp: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReceipt {
    transaction_hash: String,
    #[serde(default)]
    block_number: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    gas_used: Option<String>,
}

impl RawReceipt {
    fn into_receipt(self) -> AccessResult<Receipt> {
        Ok(Receipt {
            transaction_hash: parse_hash(&self.transaction_hash)?,
            block_number: parse_quantity(self.block_number.as_deref().unwrap_or("0x0"))?,
            // Pre-Byzantium receipts carry no status; treat as success
            status: parse_quantity(self.status.as_deref().unwrap_or("0x1"))?,
            gas_used: parse_quantity(self.gas_used.as_deref().unwrap_or("0x0"))?,
        })
    }
}

impl HttpGateway {
    /// Open a connection and confirm the endpoint answers.
    pub fn connect(config: &GatewayConfig) -> AccessResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AccessError::Connectivity {
                url: config.rpc_url.clone(),
                reason: e.to_string(),
            })?;

        let gateway = HttpGateway {
            client,
            url: config.rpc_url.clone(),
            next_id: AtomicU64::new(1),
        };

        let version = gateway.client_version().map_err(|e| match e {
            AccessError::Connectivity { .. } => e,
            other => AccessError::Connectivity {
                url: config.rpc_url.clone(),
                reason: other.to_string(),
            },
        })?;
        info!(client = %version, "connected to chain gateway");

        match gateway.chain_id() {
            Ok(id) if id != SEPOLIA_CHAIN_ID => {
                warn!(chain_id = id, expected = SEPOLIA_CHAIN_ID, "gateway is on an unexpected network");
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "could not read chain id"),
        }

        Ok(gateway)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn request<T: DeserializeOwned>(&self, method: &str, params: serde_json::Value) -> AccessResult<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(method, id, "json-rpc request");

        let response = self
            .client
            .post(&self.url)
            .json(&RpcRequest::new(id, method, params))
            .send()
            .map_err(|e| self.unreachable(e.to_string()))?;

        let status = response.status();
        let body: RpcResponse = response
            .json()
            .map_err(|e| self.unreachable(format!("HTTP {}: {}", status, e)))?;

        body.into_result()
    }

    fn unreachable(&self, reason: String) -> AccessError {
        AccessError::Connectivity {
            url: self.url.clone(),
            reason,
        }
    }
}

impl ChainGateway for HttpGateway {
    fn client_version(&self) -> AccessResult<String> {
        self.request("web3_clientVersion", json!([]))
    }

    fn chain_id(&self) -> AccessResult<u64> {
        let raw: String = self.request("eth_chainId", json!([]))?;
        parse_quantity(&raw)
    }

    fn latest_block_timestamp(&self) -> AccessResult<u64> {
        let block: Option<BlockHeader> = self.request("eth_getBlockByNumber", json!(["latest", false]))?;
        let block = block.ok_or_else(|| AccessError::Rpc {
            code: -32000,
            message: "latest block not available".to_string(),
        })?;
        parse_quantity(&block.timestamp)
    }

    fn transaction_count(&self, address: Address) -> AccessResult<u64> {
        let raw: String = self.request(
            "eth_getTransactionCount",
            json!([address.to_checksum(None), "pending"]),
        )?;
        parse_quantity(&raw)
    }

    fn call(&self, request: &CallRequest) -> AccessResult<Bytes> {
        let mut call = json!({
            "to": request.to.to_checksum(None),
            "data": format!("0x{}", hex::encode(&request.data)),
        });
        if let Some(from) = request.from {
            call["from"] = json!(from.to_checksum(None));
        }
        let raw: String = self.request("eth_call", json!([call, "latest"]))?;
        parse_bytes(&raw)
    }

    fn send_raw_transaction(&self, raw: &[u8]) -> AccessResult<B256> {
        let hash: String = self.request(
            "eth_sendRawTransaction",
            json!([format!("0x{}", hex::encode(raw))]),
        )?;
        parse_hash(&hash)
    }

    fn transaction_receipt(&self, tx_hash: B256) -> AccessResult<Option<Receipt>> {
        let raw: Option<RawReceipt> =
            self.request("eth_getTransactionReceipt", json!([tx_hash.to_string()]))?;
        raw.map(RawReceipt::into_receipt).transpose()
    }
}

fn parse_hash(raw: &str) -> AccessResult<B256> {
    B256::from_str(raw).map_err(|e| AccessError::Rpc {
        code: -32700,
        message: format!("invalid hash {:?}: {}", raw, e),
    })
}

fn parse_bytes(raw: &str) -> AccessResult<Bytes> {
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    hex::decode(digits).map(Bytes::from).map_err(|e| AccessError::Rpc {
        code: -32700,
        message: format!("invalid hex data: {}", e),
    })
}
