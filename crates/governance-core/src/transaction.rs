//! Transaction Builder
//!
//! Assembles EIP-155 legacy transactions (RLP), signs them with a local
//! secp256k1 key and blocks until a receipt arrives.
//!
//! Policy is fixed: 300,000 gas at 10 gwei on chain 11155111. The nonce is
//! read from the gateway immediately before every build; nothing is cached,
//! so two sessions signing with the same key can collide.

use crate::binding::TransactionIntent;
use crate::config::{ReceiptPolicy, GAS_LIMIT, GAS_PRICE_GWEI, SEPOLIA_CHAIN_ID, WEI_PER_GWEI};
use crate::error::{AccessError, AccessResult};
use crate::gateway::{ChainGateway, Receipt};
use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_rlp::{Decodable, Encodable, RlpDecodable, RlpEncodable};
use governance_validation::to_checksum;
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use tracing::{info, warn};

/// Gas and network policy for every state-changing call
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GasPolicy {
    pub gas_limit: u64,
    pub gas_price_wei: u128,
    pub chain_id: u64,
}

impl Default for GasPolicy {
    fn default() -> Self {
        GasPolicy {
            gas_limit: GAS_LIMIT,
            gas_price_wei: GAS_PRICE_GWEI as u128 * WEI_PER_GWEI,
            chain_id: SEPOLIA_CHAIN_ID,
        }
    }
}

// =============================================================================
// Wire format
// =============================================================================

/// Unsigned fields plus the EIP-155 `(chain_id, 0, 0)` suffix
#[derive(RlpEncodable)]
struct SigningPayload {
    nonce: u64,
    gas_price: u128,
    gas_limit: u64,
    to: Address,
    value: U256,
    input: Bytes,
    chain_id: u64,
    empty_r: u8,
    empty_s: u8,
}

/// A signed legacy transaction as it goes over the wire
#[derive(Clone, Debug, PartialEq, Eq, RlpEncodable, RlpDecodable)]
pub struct LegacyTransaction {
    pub nonce: u64,
    pub gas_price: u128,
    pub gas_limit: u64,
    pub to: Address,
    pub value: U256,
    pub input: Bytes,
    pub v: u64,
    pub r: U256,
    pub s: U256,
}

impl LegacyTransaction {
    /// Chain id and y-parity packed into `v`; `None` for pre-EIP-155 `v`
    pub fn chain_id(&self) -> Option<u64> {
        (self.v >= 35).then(|| (self.v - 35) / 2)
    }

    fn signing_hash(&self, chain_id: u64) -> B256 {
        signing_hash(
            self.nonce,
            self.gas_price,
            self.gas_limit,
            self.to,
            self.value,
            &self.input,
            chain_id,
        )
    }

    /// Recover the sending address from the signature.
    pub fn recover_sender(&self) -> AccessResult<Address> {
        let chain_id = self
            .chain_id()
            .ok_or_else(|| AccessError::Transaction(format!("v={} is not an EIP-155 signature", self.v)))?;
        let y_odd = (self.v - 35) % 2 == 1;

        let mut compact = [0u8; 64];
        compact[..32].copy_from_slice(&self.r.to_be_bytes::<32>());
        compact[32..].copy_from_slice(&self.s.to_be_bytes::<32>());
        let signature = Signature::from_slice(&compact)
            .map_err(|e| AccessError::Transaction(format!("malformed signature: {}", e)))?;

        let hash = self.signing_hash(chain_id);
        let key = VerifyingKey::recover_from_prehash(hash.as_slice(), &signature, RecoveryId::new(y_odd, false))
            .map_err(|e| AccessError::Transaction(format!("signature does not recover: {}", e)))?;
        Ok(address_of(&key))
    }
}

#[allow(clippy::too_many_arguments)]
fn signing_hash(
    nonce: u64,
    gas_price: u128,
    gas_limit: u64,
    to: Address,
    value: U256,
    input: &Bytes,
    chain_id: u64,
) -> B256 {
    let payload = SigningPayload {
        nonce,
        gas_price,
        gas_limit,
        to,
        value,
        input: input.clone(),
        chain_id,
        empty_r: 0,
        empty_s: 0,
    };
    let mut encoded = Vec::with_capacity(payload.length());
    payload.encode(&mut encoded);
    keccak256(&encoded)
}

/// A transaction ready for `eth_sendRawTransaction`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedTransaction {
    pub transaction: LegacyTransaction,
    pub raw: Bytes,
    pub hash: B256,
    pub action: String,
}

impl SignedTransaction {
    /// Decode raw wire bytes
    pub fn decode(raw: &[u8]) -> AccessResult<LegacyTransaction> {
        let mut buf = raw;
        let transaction = LegacyTransaction::decode(&mut buf)
            .map_err(|e| AccessError::Transaction(format!("invalid RLP: {}", e)))?;
        if !buf.is_empty() {
            return Err(AccessError::Transaction("trailing bytes after transaction".to_string()));
        }
        Ok(transaction)
    }
}

// =============================================================================
// Signing
// =============================================================================

/// secp256k1 key held in process memory for the whole session
pub struct LocalSigner {
    key: SigningKey,
    address: Address,
}

impl LocalSigner {
    /// Parse a hex key (`0x` optional). Any problem is a startup config error.
    pub fn from_hex(raw: &str) -> AccessResult<Self> {
        let trimmed = raw.trim();
        let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let bytes = hex::decode(digits)
            .map_err(|_| AccessError::Config("private key is not valid hex".to_string()))?;
        if bytes.len() != 32 {
            return Err(AccessError::Config(format!(
                "private key must be 32 bytes, got {}",
                bytes.len()
            )));
        }
        let key = SigningKey::from_slice(&bytes)
            .map_err(|_| AccessError::Config("private key is not a valid secp256k1 scalar".to_string()))?;
        let address = address_of(key.verifying_key());
        Ok(LocalSigner { key, address })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Returns `(r, s, y_odd)` with low-s normalisation
    fn sign_hash(&self, hash: &B256) -> AccessResult<(U256, U256, bool)> {
        let (signature, recovery_id) = self
            .key
            .sign_prehash_recoverable(hash.as_slice())
            .map_err(|e| AccessError::Transaction(format!("signing failed: {}", e)))?;
        let bytes = signature.to_bytes();
        Ok((
            U256::from_be_slice(&bytes[..32]),
            U256::from_be_slice(&bytes[32..]),
            recovery_id.is_y_odd(),
        ))
    }
}

impl std::fmt::Debug for LocalSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalSigner")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

fn address_of(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}

// =============================================================================
// Builder
// =============================================================================

pub struct TransactionBuilder {
    signer: LocalSigner,
    sender: Address,
    policy: GasPolicy,
    receipt: ReceiptPolicy,
}

impl TransactionBuilder {
    /// The configured sender must be the signer's own address.
    pub fn new(
        signer: LocalSigner,
        sender: Address,
        policy: GasPolicy,
        receipt: ReceiptPolicy,
    ) -> AccessResult<Self> {
        if signer.address() != sender {
            return Err(AccessError::Config(format!(
                "sender address {} does not match the signing key's address {}",
                to_checksum(&sender),
                to_checksum(&signer.address())
            )));
        }
        Ok(TransactionBuilder {
            signer,
            sender,
            policy,
            receipt,
        })
    }

    pub fn sender(&self) -> Address {
        self.sender
    }

    pub fn policy(&self) -> &GasPolicy {
        &self.policy
    }

    /// Fetch the nonce, encode and sign.
    pub fn build<G: ChainGateway + ?Sized>(
        &self,
        gateway: &G,
        intent: &TransactionIntent,
    ) -> AccessResult<SignedTransaction> {
        let nonce = gateway.transaction_count(self.sender)?;
        self.sign(nonce, intent)
    }

    fn sign(&self, nonce: u64, intent: &TransactionIntent) -> AccessResult<SignedTransaction> {
        let hash = signing_hash(
            nonce,
            self.policy.gas_price_wei,
            self.policy.gas_limit,
            intent.to,
            U256::ZERO,
            &intent.data,
            self.policy.chain_id,
        );
        let (r, s, y_odd) = self.signer.sign_hash(&hash)?;

        let transaction = LegacyTransaction {
            nonce,
            gas_price: self.policy.gas_price_wei,
            gas_limit: self.policy.gas_limit,
            to: intent.to,
            value: U256::ZERO,
            input: intent.data.clone(),
            v: self.policy.chain_id * 2 + 35 + y_odd as u64,
            r,
            s,
        };

        let mut raw = Vec::with_capacity(transaction.length());
        transaction.encode(&mut raw);
        let hash = keccak256(&raw);

        Ok(SignedTransaction {
            transaction,
            raw: Bytes::from(raw),
            hash,
            action: intent.action.clone(),
        })
    }

    /// Send and block until the receipt arrives. No retry on failure.
    pub fn submit<G: ChainGateway + ?Sized>(
        &self,
        gateway: &G,
        signed: &SignedTransaction,
    ) -> AccessResult<Receipt> {
        info!(
            action = %signed.action,
            nonce = signed.transaction.nonce,
            "submitting transaction"
        );
        let tx_hash = gateway
            .send_raw_transaction(&signed.raw)
            .map_err(into_transaction_error)?;

        let receipt = gateway
            .wait_for_receipt(tx_hash, &self.receipt)
            .map_err(into_transaction_error)?;

        if !receipt.succeeded() {
            warn!(tx_hash = %receipt.transaction_hash, block = receipt.block_number, "transaction reverted");
            return Err(AccessError::ContractCall(format!(
                "transaction {} reverted in block {}",
                receipt.transaction_hash, receipt.block_number
            )));
        }

        info!(
            action = %signed.action,
            tx_hash = %receipt.transaction_hash,
            block = receipt.block_number,
            gas_used = receipt.gas_used,
            "transaction confirmed"
        );
        Ok(receipt)
    }

    /// `build` then `submit`
    pub fn execute<G: ChainGateway + ?Sized>(
        &self,
        gateway: &G,
        intent: &TransactionIntent,
    ) -> AccessResult<Receipt> {
        let signed = self.build(gateway, intent)?;
        self.submit(gateway, &signed)
    }
}

/// Keep reverts and timeouts as they are; anything else becomes a
/// transaction failure carrying the original message.
fn into_transaction_error(err: AccessError) -> AccessError {
    match err {
        AccessError::ContractCall(_) | AccessError::Timeout { .. } | AccessError::Transaction(_) => err,
        AccessError::Rpc { message, .. } => AccessError::Transaction(message),
        other => AccessError::Transaction(other.to_string()),
    }
}
