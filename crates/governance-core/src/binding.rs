//! Contract Binding
//!
//! Loads the interface description of the deployed access-control contract
//! and exposes typed wrappers for the four operations the dashboards use.
//! State-changing operations produce a `TransactionIntent` for the
//! transaction builder; read operations go straight to `eth_call`.

use crate::error::{AccessError, AccessResult};
use crate::gateway::{CallRequest, ChainGateway};
use crate::permission::Permission;
use crate::sections::Section;
use alloy_dyn_abi::{DynSolValue, FunctionExt, JsonAbiExt};
use alloy_json_abi::{Function, JsonAbi, Param, StateMutability};
use alloy_primitives::{Address, Bytes, U256};
use governance_validation::{to_checksum, Registration};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

pub const REGISTER_PATIENT: &str = "registerPatient";
pub const GRANT_TIMED_ACCESS: &str = "grantTimedAccess";
pub const VIEW_PATIENT_INFO: &str = "viewPatientInfo";
pub const ACCESS_PERMISSIONS: &str = "accessPermissions";

const REGISTER_PATIENT_SIG: &str =
    "registerPatient(string,string,uint256,string,string,string,string)";
const GRANT_TIMED_ACCESS_SIG: &str = "grantTimedAccess(address,uint8,uint256)";
const VIEW_PATIENT_INFO_SIG: &str = "viewPatientInfo(address)";
const ACCESS_PERMISSIONS_SIG: &str = "accessPermissions(address,uint8)";

const PATIENT_RECORD_TYPES: [&str; 7] =
    ["string", "string", "uint256", "string", "string", "string", "string"];
const PERMISSION_TYPES: [&str; 2] = ["bool", "uint256"];

/// A state-changing call ready to be built into a transaction
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionIntent {
    pub to: Address,
    pub data: Bytes,
    /// Label recorded in the session log
    pub action: String,
}

/// Patient record as stored by the contract
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub patient_id: String,
    pub name: String,
    pub age: u64,
    pub gender: String,
    pub physical_address: String,
    pub phone: String,
    pub email: String,
}

impl PatientRecord {
    fn from_values(values: Vec<DynSolValue>) -> AccessResult<Self> {
        let values = flatten_single_tuple(values);
        if values.len() != PATIENT_RECORD_TYPES.len() {
            return Err(malformed_output(VIEW_PATIENT_INFO));
        }
        let text = |i: usize| -> AccessResult<String> {
            values[i]
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| malformed_output(VIEW_PATIENT_INFO))
        };
        Ok(PatientRecord {
            patient_id: text(0)?,
            name: text(1)?,
            age: uint_to_u64(&values[2]).ok_or_else(|| malformed_output(VIEW_PATIENT_INFO))?,
            gender: text(3)?,
            physical_address: text(4)?,
            phone: text(5)?,
            email: text(6)?,
        })
    }
}

pub struct ContractBinding {
    address: Address,
    abi: JsonAbi,
    register_patient: Function,
    grant_timed_access: Function,
    view_patient_info: Function,
    access_permissions: Function,
}

impl ContractBinding {
    /// Load the interface description from a file.
    pub fn load(address: Address, path: &Path) -> AccessResult<Self> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            AccessError::InterfaceLoad(format!("{}: {}", path.display(), e))
        })?;
        Self::from_json(address, &source)
    }

    /// Accepts a bare ABI array or a build artifact with an `abi` field.
    pub fn from_json(address: Address, source: &str) -> AccessResult<Self> {
        let value: serde_json::Value = serde_json::from_str(source)
            .map_err(|e| AccessError::InterfaceLoad(format!("malformed JSON: {}", e)))?;

        let abi_value = match value {
            serde_json::Value::Object(mut artifact) => artifact
                .remove("abi")
                .ok_or_else(|| AccessError::InterfaceLoad("artifact has no `abi` field".to_string()))?,
            other => other,
        };

        let abi: JsonAbi = serde_json::from_value(abi_value)
            .map_err(|e| AccessError::InterfaceLoad(format!("not a contract ABI: {}", e)))?;

        let register_patient = require_function(&abi, REGISTER_PATIENT_SIG, false)?;
        let grant_timed_access = require_function(&abi, GRANT_TIMED_ACCESS_SIG, false)?;
        let view_patient_info = require_function(&abi, VIEW_PATIENT_INFO_SIG, true)?;
        let access_permissions = require_function(&abi, ACCESS_PERMISSIONS_SIG, true)?;

        require_outputs(&view_patient_info, &PATIENT_RECORD_TYPES)?;
        require_outputs(&access_permissions, &PERMISSION_TYPES)?;

        Ok(ContractBinding {
            address,
            abi,
            register_patient,
            grant_timed_access,
            view_patient_info,
            access_permissions,
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Every function signature in the interface, sorted
    pub fn function_signatures(&self) -> Vec<String> {
        let mut signatures: Vec<String> = self.abi.functions().map(|f| f.signature()).collect();
        signatures.sort();
        signatures
    }

    /// One of the four bound functions, by name
    pub fn function(&self, name: &str) -> Option<&Function> {
        match name {
            REGISTER_PATIENT => Some(&self.register_patient),
            GRANT_TIMED_ACCESS => Some(&self.grant_timed_access),
            VIEW_PATIENT_INFO => Some(&self.view_patient_info),
            ACCESS_PERMISSIONS => Some(&self.access_permissions),
            _ => None,
        }
    }

    pub fn register_patient(&self, registration: &Registration) -> AccessResult<TransactionIntent> {
        let data = encode_input(
            &self.register_patient,
            &[
                DynSolValue::String(registration.patient_id.clone()),
                DynSolValue::String(registration.name.clone()),
                DynSolValue::Uint(U256::from(registration.age), 256),
                DynSolValue::String(registration.gender.clone()),
                DynSolValue::String(registration.physical_address.clone()),
                DynSolValue::String(registration.phone.clone()),
                DynSolValue::String(registration.email.clone()),
            ],
        )?;
        Ok(TransactionIntent {
            to: self.address,
            data,
            action: "Register Patient".to_string(),
        })
    }

    pub fn grant_timed_access(
        &self,
        provider: Address,
        section: Section,
        duration_secs: u64,
    ) -> AccessResult<TransactionIntent> {
        let data = encode_input(
            &self.grant_timed_access,
            &[
                DynSolValue::Address(provider),
                DynSolValue::Uint(U256::from(section.index()), 8),
                DynSolValue::Uint(U256::from(duration_secs), 256),
            ],
        )?;
        Ok(TransactionIntent {
            to: self.address,
            data,
            action: format!("Grant Access to {} ({})", to_checksum(&provider), section),
        })
    }

    /// Reverts when the patient was never registered.
    pub fn view_patient_info<G: ChainGateway + ?Sized>(
        &self,
        gateway: &G,
        patient: Address,
    ) -> AccessResult<PatientRecord> {
        let input = encode_input(&self.view_patient_info, &[DynSolValue::Address(patient)])?;
        let values = self.read(gateway, &self.view_patient_info, input)?;
        PatientRecord::from_values(values)
    }

    pub fn access_permissions<G: ChainGateway + ?Sized>(
        &self,
        gateway: &G,
        provider: Address,
        section: Section,
    ) -> AccessResult<Permission> {
        let input = encode_input(
            &self.access_permissions,
            &[
                DynSolValue::Address(provider),
                DynSolValue::Uint(U256::from(section.index()), 8),
            ],
        )?;
        let values = flatten_single_tuple(self.read(gateway, &self.access_permissions, input)?);

        let has_access = values
            .first()
            .and_then(DynSolValue::as_bool)
            .ok_or_else(|| malformed_output(ACCESS_PERMISSIONS))?;
        let expires_at = values
            .get(1)
            .and_then(uint_to_u64)
            .ok_or_else(|| malformed_output(ACCESS_PERMISSIONS))?;

        Ok(Permission { has_access, expires_at })
    }

    fn read<G: ChainGateway + ?Sized>(
        &self,
        gateway: &G,
        function: &Function,
        data: Bytes,
    ) -> AccessResult<Vec<DynSolValue>> {
        debug!(function = %function.name, "contract read");
        let output = gateway.call(&CallRequest {
            from: None,
            to: self.address,
            data,
        })?;

        // Nodes answer a reason-less revert with empty data
        if output.is_empty() {
            return Err(AccessError::ContractCall(format!(
                "{} returned no data",
                function.name
            )));
        }

        function.abi_decode_output(&output).map_err(|e| AccessError::Rpc {
            code: -32700,
            message: format!("could not decode {} output: {}", function.name, e),
        })
    }
}

fn require_function(abi: &JsonAbi, signature: &str, read_only: bool) -> AccessResult<Function> {
    let name = signature.split('(').next().unwrap_or(signature);
    let function = abi
        .function(name)
        .and_then(|overloads| overloads.iter().find(|f| f.signature() == signature))
        .ok_or_else(|| AccessError::InterfaceLoad(format!("interface is missing {}", signature)))?;

    let is_read_only = matches!(
        function.state_mutability,
        StateMutability::View | StateMutability::Pure
    );
    if is_read_only != read_only {
        return Err(AccessError::InterfaceLoad(format!(
            "{} must be {}",
            signature,
            if read_only { "a view function" } else { "state-changing" }
        )));
    }

    Ok(function.clone())
}

fn require_outputs(function: &Function, expected: &[&str]) -> AccessResult<()> {
    let types = flatten_output_types(&function.outputs);
    if types != expected {
        return Err(AccessError::InterfaceLoad(format!(
            "{} must return ({}), interface declares ({})",
            function.name,
            expected.join(","),
            types.join(",")
        )));
    }
    Ok(())
}

/// A single struct return is treated like its fields returned directly
fn flatten_output_types(outputs: &[Param]) -> Vec<String> {
    match outputs {
        [single] if single.ty == "tuple" => single.components.iter().map(|p| p.ty.clone()).collect(),
        _ => outputs.iter().map(|p| p.ty.clone()).collect(),
    }
}

fn flatten_single_tuple(values: Vec<DynSolValue>) -> Vec<DynSolValue> {
    match <[DynSolValue; 1]>::try_from(values) {
        Ok([DynSolValue::Tuple(fields)]) => fields,
        Ok([other]) => vec![other],
        Err(values) => values,
    }
}

fn encode_input(function: &Function, values: &[DynSolValue]) -> AccessResult<Bytes> {
    function
        .abi_encode_input(values)
        .map(Bytes::from)
        .map_err(|e| AccessError::Transaction(format!("could not encode {} call: {}", function.name, e)))
}

fn uint_to_u64(value: &DynSolValue) -> Option<u64> {
    let (raw, _) = value.as_uint()?;
    u64::try_from(raw).ok()
}

fn malformed_output(name: &str) -> AccessError {
    AccessError::Rpc {
        code: -32700,
        message: format!("{} returned an unexpected shape", name),
    }
}
