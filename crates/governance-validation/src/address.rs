//! Account address validation
//!
//! An address is accepted when it is 40 hex digits (optional `0x` prefix),
//! in any letter case, and is converted to its EIP-55 form. Mixed-case input
//! whose capitalisation disagrees with EIP-55 is still accepted;
//! `checksum_mismatch` lets callers flag it.

use crate::ValidationError;
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Which input an address came from, for error messages
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddressRole {
    Patient,
    Provider,
    Sender,
    Contract,
}

impl std::fmt::Display for AddressRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AddressRole::Patient => write!(f, "Patient"),
            AddressRole::Provider => write!(f, "Provider"),
            AddressRole::Sender => write!(f, "Sender"),
            AddressRole::Contract => write!(f, "Contract"),
        }
    }
}

/// Parse user input into an address.
pub fn parse_address(role: AddressRole, input: &str) -> Result<Address, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingAddress { role });
    }

    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if digits.len() != 40 {
        return Err(ValidationError::MalformedAddress {
            role,
            reason: format!("expected 40 hex digits, got {}", digits.len()),
        });
    }

    if let Some(bad) = digits.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(ValidationError::MalformedAddress {
            role,
            reason: format!("invalid character {:?}", bad),
        });
    }

    Address::from_str(digits).map_err(|e| ValidationError::MalformedAddress {
        role,
        reason: e.to_string(),
    })
}

/// True for well-formed mixed-case input that is not a valid EIP-55
/// checksum (likely a typo). Single-case and malformed input return false.
pub fn checksum_mismatch(input: &str) -> bool {
    let trimmed = input.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    let has_lower = digits.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = digits.chars().any(|c| c.is_ascii_uppercase());
    if !(has_lower && has_upper) {
        return false;
    }
    match Address::from_str(digits) {
        Ok(address) => address.to_checksum(None)[2..] != *digits,
        Err(_) => false,
    }
}

/// EIP-55 checksum form (`0x` + mixed-case hex)
pub fn to_checksum(address: &Address) -> String {
    address.to_checksum(None)
}
