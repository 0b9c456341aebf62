//! Provider dashboard
//!
//! A check is read-only: one registration lookup, then one permission read
//! per section. Nothing is signed.

use crate::binding::ContractBinding;
use crate::error::AccessResult;
use crate::gateway::ChainGateway;
use crate::permission::{format_expiration, Permission};
use crate::sections::Section;
use alloy_primitives::Address;
use governance_validation::{checksum_mismatch, parse_address, AddressRole, ValidationError};
use serde::Serialize;
use tracing::{debug, info, warn};

/// One row of the permission table
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AccessRow {
    pub section: Section,
    pub permission: Permission,
    pub active: bool,
    /// Rendered expiry column
    pub expires: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AccessReport {
    pub patient: Address,
    pub provider: Address,
    /// Always one row per section, in index order
    pub rows: Vec<AccessRow>,
    /// Chain time every row was judged against
    pub now: u64,
}

impl AccessReport {
    pub fn active_sections(&self) -> Vec<Section> {
        self.rows
            .iter()
            .filter(|row| row.active)
            .map(|row| row.section)
            .collect()
    }

    pub fn summary(&self) -> String {
        let active = self.active_sections();
        if active.is_empty() {
            return "Access denied for all sections, or all access has expired.".to_string();
        }
        let labels: Vec<&str> = active.iter().map(|s| s.label()).collect();
        format!("Access granted to sections: {}", labels.join(", "))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AccessCheck {
    /// The registration lookup reverted; no permissions were read
    PatientNotRegistered { patient: Address },
    Report(AccessReport),
}

pub struct ProviderDashboard<'a, G: ChainGateway + ?Sized> {
    gateway: &'a G,
    binding: &'a ContractBinding,
}

impl<'a, G: ChainGateway + ?Sized> ProviderDashboard<'a, G> {
    pub fn new(gateway: &'a G, binding: &'a ContractBinding) -> Self {
        ProviderDashboard { gateway, binding }
    }

    pub fn check_access(&self, patient_input: &str, provider_input: &str) -> AccessResult<AccessCheck> {
        // Both present before either is parsed
        if patient_input.trim().is_empty() {
            return Err(ValidationError::MissingAddress { role: AddressRole::Patient }.into());
        }
        if provider_input.trim().is_empty() {
            return Err(ValidationError::MissingAddress { role: AddressRole::Provider }.into());
        }
        let patient = parse_address(AddressRole::Patient, patient_input)?;
        let provider = parse_address(AddressRole::Provider, provider_input)?;
        for (role, input) in [(AddressRole::Patient, patient_input), (AddressRole::Provider, provider_input)] {
            if checksum_mismatch(input) {
                warn!(%role, "address capitalisation does not match its checksum");
            }
        }

        match self.binding.view_patient_info(self.gateway, patient) {
            Ok(record) => debug!(patient_id = %record.patient_id, "patient record found"),
            Err(e) if e.is_revert() => {
                info!(%patient, error = %e, "registration lookup reverted");
                return Ok(AccessCheck::PatientNotRegistered { patient });
            }
            Err(e) => return Err(e),
        }

        let now = self.gateway.latest_block_timestamp()?;
        let mut rows = Vec::with_capacity(Section::ALL.len());
        for section in Section::ALL {
            let permission = self.binding.access_permissions(self.gateway, provider, section)?;
            rows.push(AccessRow {
                section,
                permission,
                active: permission.is_active(now),
                expires: format_expiration(permission.expires_at, now),
            });
        }

        let report = AccessReport {
            patient,
            provider,
            rows,
            now,
        };
        info!(%patient, %provider, active = report.active_sections().len(), "access checked");
        Ok(AccessCheck::Report(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(section: Section, has_access: bool, expires_at: u64, now: u64) -> AccessRow {
        let permission = Permission { has_access, expires_at };
        AccessRow {
            section,
            permission,
            active: permission.is_active(now),
            expires: format_expiration(expires_at, now),
        }
    }

    #[test]
    fn test_summary_lists_active_sections() {
        let now = 1_760_000_000;
        let report = AccessReport {
            patient: Address::ZERO,
            provider: Address::ZERO,
            rows: vec![
                row(Section::PersonalInformation, false, 0, now),
                row(Section::BloodResults, true, now - 10, now),
                row(Section::Imaging, true, now + 3600, now),
                row(Section::Medications, true, 0, now),
            ],
            now,
        };
        assert_eq!(report.active_sections(), vec![Section::Imaging, Section::Medications]);
        assert_eq!(report.summary(), "Access granted to sections: Imaging, Medications");
    }

    #[test]
    fn test_summary_when_nothing_active() {
        let now = 1_760_000_000;
        let report = AccessReport {
            patient: Address::ZERO,
            provider: Address::ZERO,
            rows: Section::ALL.iter().map(|s| row(*s, false, 0, now)).collect(),
            now,
        };
        assert!(report.active_sections().is_empty());
        assert!(report.summary().starts_with("Access denied"));
    }
}
