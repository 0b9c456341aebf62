//! Patient dashboard actions
//!
//! Two independent actions from one screen. Each one validates locally,
//! then issues its transactions synchronously; a validation failure never
//! reaches the gateway.

use crate::binding::ContractBinding;
use crate::config::GRANT_DURATION_SECS;
use crate::error::{AccessError, AccessResult};
use crate::gateway::ChainGateway;
use crate::sections::Section;
use crate::session::TxLog;
use crate::transaction::TransactionBuilder;
use alloy_primitives::{Address, B256};
use governance_validation::{
    checksum_mismatch, parse_address, require_selection, validate_registration, AddressRole,
    RegistrationInput,
};
use tracing::{info, warn};

/// Outcome of a single confirmed transaction
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionReceipt {
    pub action: String,
    pub tx_hash: B256,
    pub block_number: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionGrant {
    pub section: Section,
    pub tx_hash: B256,
}

/// Grants are separate transactions with no atomicity between them. A
/// failure stops the loop; grants committed before it stay in effect.
#[derive(Debug)]
pub struct GrantReport {
    pub provider: Address,
    pub granted: Vec<SectionGrant>,
    pub failure: Option<(Section, AccessError)>,
    /// Selected but never attempted because of an earlier failure
    pub skipped: Vec<Section>,
}

impl GrantReport {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }

    pub fn last_tx_hash(&self) -> Option<B256> {
        self.granted.last().map(|g| g.tx_hash)
    }
}

pub struct PatientDashboard<'a, G: ChainGateway + ?Sized> {
    gateway: &'a G,
    binding: &'a ContractBinding,
    builder: &'a TransactionBuilder,
}

impl<'a, G: ChainGateway + ?Sized> PatientDashboard<'a, G> {
    pub fn new(gateway: &'a G, binding: &'a ContractBinding, builder: &'a TransactionBuilder) -> Self {
        PatientDashboard {
            gateway,
            binding,
            builder,
        }
    }

    /// The patient's own address (the transaction sender)
    pub fn patient_address(&self) -> Address {
        self.builder.sender()
    }

    /// Register the sender as a patient.
    pub fn register(&self, input: &RegistrationInput, log: &mut TxLog) -> AccessResult<ActionReceipt> {
        let registration = validate_registration(input)?;
        let intent = self.binding.register_patient(&registration)?;
        let receipt = self.builder.execute(self.gateway, &intent)?;

        log.record(intent.action.clone(), receipt.transaction_hash);
        info!(patient_id = %registration.patient_id, tx_hash = %receipt.transaction_hash, "patient registered");

        Ok(ActionReceipt {
            action: intent.action,
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
        })
    }

    /// Grant `provider_input` timed access to each selected section, one
    /// transaction per section, in selection order.
    pub fn grant_access(
        &self,
        provider_input: &str,
        sections: &[Section],
        log: &mut TxLog,
    ) -> AccessResult<GrantReport> {
        let provider = parse_address(AddressRole::Provider, provider_input)?;
        if checksum_mismatch(provider_input) {
            warn!(%provider, "provider address capitalisation does not match its checksum");
        }

        let mut selected: Vec<Section> = Vec::with_capacity(sections.len());
        for section in sections {
            if !selected.contains(section) {
                selected.push(*section);
            }
        }
        require_selection(selected.len())?;

        let mut report = GrantReport {
            provider,
            granted: Vec::new(),
            failure: None,
            skipped: Vec::new(),
        };

        let mut pending = selected.into_iter();
        for section in pending.by_ref() {
            let outcome = self
                .binding
                .grant_timed_access(provider, section, GRANT_DURATION_SECS)
                .and_then(|intent| {
                    let receipt = self.builder.execute(self.gateway, &intent)?;
                    Ok((intent, receipt))
                });

            match outcome {
                Ok((intent, receipt)) => {
                    log.record(intent.action, receipt.transaction_hash);
                    report.granted.push(SectionGrant {
                        section,
                        tx_hash: receipt.transaction_hash,
                    });
                }
                Err(e) => {
                    warn!(%section, error = %e, granted = report.granted.len(), "grant stopped early");
                    report.failure = Some((section, e));
                    break;
                }
            }
        }
        report.skipped = pending.collect();

        if report.is_complete() {
            info!(provider = %provider, sections = report.granted.len(), "access granted");
        }
        Ok(report)
    }
}
