//! In-memory chain for integration tests
//!
//! Implements `ChainGateway` over a tiny model of the access-control
//! contract. Raw transactions are decoded and their signer recovered, so
//! the signing path is exercised end to end. Every gateway call is counted.

#![allow(dead_code)]

use alloy_dyn_abi::{DynSolValue, FunctionExt, JsonAbiExt};
use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use governance_core::binding::{
    ACCESS_PERMISSIONS, GRANT_TIMED_ACCESS, REGISTER_PATIENT, VIEW_PATIENT_INFO,
};
use governance_core::config::{parse_startup_address, SEPOLIA_CHAIN_ID};
use governance_core::*;
use std::cell::RefCell;
use std::collections::HashMap;
use std::time::Duration;

pub const ABI: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/../../contract_abi.json"));

/// Example key from the web3.js account documentation
pub const PATIENT_KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";
pub const PATIENT: &str = "0x2c7536E3605D9C16a7a3D7b1898e529396a65c23";
pub const PROVIDER: &str = "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB";
pub const CONTRACT: &str = "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359";

/// 2025-10-09 08:53:20 UTC
pub const GENESIS_TIME: u64 = 1_760_000_000;

pub fn address(raw: &str) -> Address {
    parse_startup_address(AddressRole::Contract, raw).unwrap()
}

pub fn binding() -> ContractBinding {
    ContractBinding::from_json(address(CONTRACT), ABI).unwrap()
}

pub fn builder() -> TransactionBuilder {
    let signer = LocalSigner::from_hex(PATIENT_KEY).unwrap();
    TransactionBuilder::new(
        signer,
        address(PATIENT),
        GasPolicy::default(),
        ReceiptPolicy {
            timeout: Duration::from_millis(50),
            poll_interval: Duration::from_millis(1),
        },
    )
    .unwrap()
}

pub fn jane_doe() -> RegistrationInput {
    RegistrationInput {
        patient_id: "MRN001".to_string(),
        name: "Jane Doe".to_string(),
        age: 40,
        gender: "Female".to_string(),
        physical_address: "12 Elm Street, Springfield".to_string(),
        phone: "+1-555-0100".to_string(),
        email: "jane.doe@example.org".to_string(),
    }
}

#[derive(Default)]
struct State {
    now: u64,
    block: u64,
    nonces: HashMap<Address, u64>,
    patients: HashMap<Address, Vec<DynSolValue>>,
    /// (provider, section index) -> (has_access, expires_at)
    permissions: HashMap<(Address, u8), (bool, u64)>,
    receipts: HashMap<B256, Receipt>,
    /// JSON-RPC method per gateway call, with the contract function for
    /// calls and sends (`eth_call:accessPermissions`)
    calls: Vec<String>,
    sends: usize,
    fail_sends_from: Option<usize>,
    withhold_receipts: bool,
    call_transport_error: bool,
}

pub struct MockChain {
    contract: Address,
    binding: ContractBinding,
    state: RefCell<State>,
}

impl MockChain {
    pub fn new() -> Self {
        MockChain {
            contract: address(CONTRACT),
            binding: binding(),
            state: RefCell::new(State {
                now: GENESIS_TIME,
                block: 1,
                ..State::default()
            }),
        }
    }

    pub fn advance(&self, secs: u64) {
        self.state.borrow_mut().now += secs;
    }

    pub fn now(&self) -> u64 {
        self.state.borrow().now
    }

    /// Every send with a zero-based index of `n` or later is rejected
    pub fn fail_sends_from(&self, n: usize) {
        self.state.borrow_mut().fail_sends_from = Some(n);
    }

    /// Accept transactions but never produce receipts
    pub fn withhold_receipts(&self) {
        self.state.borrow_mut().withhold_receipts = true;
    }

    /// Make `eth_call` fail like an unreachable node
    pub fn break_calls(&self) {
        self.state.borrow_mut().call_transport_error = true;
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }

    pub fn count(&self, method: &str) -> usize {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|c| c.as_str() == method)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.state.borrow().calls.len()
    }

    pub fn is_registered(&self, patient: Address) -> bool {
        self.state.borrow().patients.contains_key(&patient)
    }

    pub fn permission(&self, provider: Address, section: Section) -> Option<(bool, u64)> {
        self.state
            .borrow()
            .permissions
            .get(&(provider, section.index()))
            .copied()
    }

    fn function_for(&self, data: &[u8]) -> Option<&alloy_json_abi::Function> {
        let selector = data.get(..4)?;
        [REGISTER_PATIENT, GRANT_TIMED_ACCESS, VIEW_PATIENT_INFO, ACCESS_PERMISSIONS]
            .iter()
            .filter_map(|name| self.binding.function(name))
            .find(|f| f.selector().as_slice() == selector)
    }

    /// Apply a decoded transaction; `false` means the contract reverted
    fn apply(&self, state: &mut State, sender: Address, function: &str, args: Vec<DynSolValue>) -> bool {
        match function {
            REGISTER_PATIENT => {
                if state.patients.contains_key(&sender) {
                    return false;
                }
                state.patients.insert(sender, args);
                true
            }
            GRANT_TIMED_ACCESS => {
                if !state.patients.contains_key(&sender) {
                    return false;
                }
                let provider = args[0].as_address().unwrap();
                let (section, _) = args[1].as_uint().unwrap();
                let (duration, _) = args[2].as_uint().unwrap();
                let section: u8 = section.to();
                let expires_at = state.now + duration.to::<u64>();
                state.permissions.insert((provider, section), (true, expires_at));
                true
            }
            _ => false,
        }
    }
}

impl ChainGateway for MockChain {
    fn client_version(&self) -> AccessResult<String> {
        self.state.borrow_mut().calls.push("web3_clientVersion".to_string());
        Ok("MockChain/v1.0.0".to_string())
    }

    fn chain_id(&self) -> AccessResult<u64> {
        self.state.borrow_mut().calls.push("eth_chainId".to_string());
        Ok(SEPOLIA_CHAIN_ID)
    }

    fn latest_block_timestamp(&self) -> AccessResult<u64> {
        let mut state = self.state.borrow_mut();
        state.calls.push("eth_getBlockByNumber".to_string());
        Ok(state.now)
    }

    fn transaction_count(&self, address: Address) -> AccessResult<u64> {
        let mut state = self.state.borrow_mut();
        state.calls.push("eth_getTransactionCount".to_string());
        Ok(state.nonces.get(&address).copied().unwrap_or(0))
    }

    fn call(&self, request: &CallRequest) -> AccessResult<Bytes> {
        let function = self.function_for(&request.data).cloned();
        let mut state = self.state.borrow_mut();
        let name = function.as_ref().map(|f| f.name.clone()).unwrap_or_default();
        state.calls.push(format!("eth_call:{}", name));

        if state.call_transport_error {
            return Err(AccessError::Connectivity {
                url: "mock://chain".to_string(),
                reason: "connection refused".to_string(),
            });
        }
        let Some(function) = function.filter(|_| request.to == self.contract) else {
            return Ok(Bytes::new());
        };
        let args = function.abi_decode_input(&request.data[4..]).unwrap();

        let output = match name.as_str() {
            VIEW_PATIENT_INFO => {
                let patient = args[0].as_address().unwrap();
                match state.patients.get(&patient) {
                    Some(values) => function.abi_encode_output(values).unwrap(),
                    None => {
                        return Err(AccessError::ContractCall(
                            "execution reverted: Patient not registered".to_string(),
                        ))
                    }
                }
            }
            ACCESS_PERMISSIONS => {
                let provider = args[0].as_address().unwrap();
                let (section, _) = args[1].as_uint().unwrap();
                let (has_access, expires_at) = state
                    .permissions
                    .get(&(provider, section.to::<u8>()))
                    .copied()
                    .unwrap_or((false, 0));
                function
                    .abi_encode_output(&[
                        DynSolValue::Bool(has_access),
                        DynSolValue::Uint(U256::from(expires_at), 256),
                    ])
                    .unwrap()
            }
            _ => Vec::new(),
        };
        Ok(Bytes::from(output))
    }

    fn send_raw_transaction(&self, raw: &[u8]) -> AccessResult<B256> {
        let tx = SignedTransaction::decode(raw)?;
        let sender = tx.recover_sender()?;
        let function = self.function_for(&tx.input).cloned();

        let mut state = self.state.borrow_mut();
        let name = function.as_ref().map(|f| f.name.clone()).unwrap_or_default();
        state.calls.push(format!("eth_sendRawTransaction:{}", name));

        let index = state.sends;
        state.sends += 1;
        if state.fail_sends_from.is_some_and(|n| index >= n) {
            return Err(AccessError::Rpc {
                code: -32000,
                message: "insufficient funds for gas * price + value".to_string(),
            });
        }

        assert_eq!(tx.chain_id(), Some(SEPOLIA_CHAIN_ID));
        let expected_nonce = state.nonces.get(&sender).copied().unwrap_or(0);
        if tx.nonce != expected_nonce {
            return Err(AccessError::Rpc {
                code: -32000,
                message: format!("nonce too low: next nonce {}, tx nonce {}", expected_nonce, tx.nonce),
            });
        }
        state.nonces.insert(sender, expected_nonce + 1);

        let succeeded = match function.filter(|_| tx.to == self.contract) {
            Some(function) => {
                let args = function.abi_decode_input(&tx.input[4..]).unwrap();
                self.apply(&mut state, sender, &name, args)
            }
            None => false,
        };

        let tx_hash = keccak256(raw);
        state.block += 1;
        let receipt = Receipt {
            transaction_hash: tx_hash,
            block_number: state.block,
            status: u64::from(succeeded),
            gas_used: 21_000,
        };
        if !state.withhold_receipts {
            state.receipts.insert(tx_hash, receipt);
        }
        Ok(tx_hash)
    }

    fn transaction_receipt(&self, tx_hash: B256) -> AccessResult<Option<Receipt>> {
        let mut state = self.state.borrow_mut();
        state.calls.push("eth_getTransactionReceipt".to_string());
        Ok(state.receipts.get(&tx_hash).cloned())
    }
}
