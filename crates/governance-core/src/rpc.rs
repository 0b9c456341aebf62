//! JSON-RPC 2.0 envelopes and error classification

use crate::error::AccessError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Error code gateways use for execution reverts
pub const EXECUTION_REVERTED_CODE: i64 = 3;

#[derive(Debug, Serialize)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: serde_json::Value,
}

impl<'a> RpcRequest<'a> {
    pub fn new(id: u64, method: &'a str, params: serde_json::Value) -> Self {
        RpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl RpcErrorObject {
    pub fn is_revert(&self) -> bool {
        self.code == EXECUTION_REVERTED_CODE || self.message.to_ascii_lowercase().contains("revert")
    }

    /// Map onto the dashboard taxonomy
    pub fn into_access_error(self) -> AccessError {
        if self.is_revert() {
            let detail = match self.data.as_ref().and_then(|d| d.as_str()) {
                Some(data) if !data.is_empty() && data != "0x" => {
                    format!("{} (data: {})", self.message, data)
                }
                _ => self.message,
            };
            AccessError::ContractCall(detail)
        } else {
            AccessError::Rpc {
                code: self.code,
                message: self.message,
            }
        }
    }
}

impl RpcResponse {
    /// Extract a typed result. A `null` result decodes into `Option::None`
    /// for optional targets (pending receipts).
    pub fn into_result<T: DeserializeOwned>(self) -> Result<T, AccessError> {
        if let Some(error) = self.error {
            return Err(error.into_access_error());
        }
        let value = self.result.unwrap_or(serde_json::Value::Null);
        serde_json::from_value(value).map_err(|e| AccessError::Rpc {
            code: -32700,
            message: format!("unexpected result shape: {}", e),
        })
    }
}

/// Parse a hex quantity such as `"0x1a"`
pub fn parse_quantity(raw: &str) -> Result<u64, AccessError> {
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    if digits.is_empty() {
        return Ok(0);
    }
    u64::from_str_radix(digits, 16).map_err(|e| AccessError::Rpc {
        code: -32700,
        message: format!("invalid quantity {:?}: {}", raw, e),
    })
}

pub fn quantity(value: u64) -> String {
    format!("0x{:x}", value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_envelope() {
        let request = RpcRequest::new(7, "eth_chainId", json!([]));
        let encoded = serde_json::to_value(&request).unwrap();
        assert_eq!(
            encoded,
            json!({"jsonrpc": "2.0", "id": 7, "method": "eth_chainId", "params": []})
        );
    }

    #[test]
    fn test_result_extraction() {
        let response: RpcResponse =
            serde_json::from_value(json!({"jsonrpc": "2.0", "id": 1, "result": "0xaa36a7"}))
                .unwrap();
        let chain_id: String = response.into_result().unwrap();
        assert_eq!(parse_quantity(&chain_id).unwrap(), 11155111);
    }

    #[test]
    fn test_null_result_is_none() {
        let response: RpcResponse =
            serde_json::from_value(json!({"jsonrpc": "2.0", "id": 1, "result": null})).unwrap();
        let receipt: Option<serde_json::Value> = response.into_result().unwrap();
        assert!(receipt.is_none());
    }

    #[test]
    fn test_revert_is_contract_call_error() {
        let response: RpcResponse = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": 3, "message": "execution reverted: Patient not registered", "data": "0x08c379a0"}
        }))
        .unwrap();
        let err = response.into_result::<String>().unwrap_err();
        match err {
            AccessError::ContractCall(detail) => {
                assert!(detail.contains("Patient not registered"));
                assert!(detail.contains("0x08c379a0"));
            }
            other => panic!("expected ContractCall, got {:?}", other),
        }
    }

    #[test]
    fn test_other_errors_stay_rpc() {
        let response: RpcResponse = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": -32000, "message": "nonce too low"}
        }))
        .unwrap();
        assert!(matches!(
            response.into_result::<String>(),
            Err(AccessError::Rpc { code: -32000, .. })
        ));
    }

    #[test]
    fn test_quantities() {
        assert_eq!(parse_quantity("0x0").unwrap(), 0);
        assert_eq!(parse_quantity("0x").unwrap(), 0);
        assert_eq!(parse_quantity("0x493e0").unwrap(), 300_000);
        assert_eq!(quantity(300_000), "0x493e0");
        assert!(parse_quantity("0xzz").is_err());
    }
}
