//! Patient Data Governance - Input Validation
//!
//! Pure validation for everything the dashboards accept from a user before
//! any remote call is issued:
//! - Patient registration fields and age
//! - Account addresses (hex syntax, any case, converted to EIP-55 form)
//! - Non-empty selections
//!
//! Nothing in this crate touches the network. A value that passes these
//! checks can still be rejected by the contract itself.

pub mod address;
pub mod registration;

pub use address::{checksum_mismatch, parse_address, to_checksum, AddressRole};
pub use registration::{
    parse_age, validate_registration, Registration, RegistrationField, RegistrationInput,
};

use thiserror::Error;

/// A locally detected input problem. No remote call is issued when one of
/// these is returned.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// One or more required text fields are empty or whitespace-only
    #[error("required fields are empty: {}", field_list(.0))]
    BlankFields(Vec<RegistrationField>),

    #[error("age must be 0 or greater (got {0})")]
    NegativeAge(i64),

    #[error("age must be a whole number (got {0:?})")]
    AgeNotANumber(String),

    #[error("{role} address is required")]
    MissingAddress { role: AddressRole },

    #[error("{role} address is not a valid Ethereum address: {reason}")]
    MalformedAddress { role: AddressRole, reason: String },

    #[error("select at least one section")]
    NoSectionsSelected,

    #[error("unknown section {0:?}")]
    UnknownSection(String),
}

fn field_list(fields: &[RegistrationField]) -> String {
    fields
        .iter()
        .map(|f| f.label())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Reject an empty selection (sections to grant, rows to act on)
pub fn require_selection(count: usize) -> Result<(), ValidationError> {
    if count == 0 {
        return Err(ValidationError::NoSectionsSelected);
    }
    Ok(())
}
