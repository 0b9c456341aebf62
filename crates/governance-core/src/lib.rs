//! Patient Data Governance - Dashboard Core
//!
//! Client side of a timed access-control contract on an EVM chain. A
//! patient registers a record and grants providers time-limited access to
//! sections of it; a provider checks which sections are currently open.
//!
//! # Layers
//!
//! - [`gateway`]: JSON-RPC transport behind the [`ChainGateway`] trait
//! - [`binding`]: typed wrappers for the four contract operations
//! - [`transaction`]: EIP-155 signing, submission and receipt wait
//! - [`patient`] / [`provider`]: the two role controllers
//! - [`render`] / [`console`]: text surface and interactive session
//!
//! # Example
//!
//! ```rust,no_run
//! use governance_core::{
//!     config::parse_startup_address, AccessCheck, AddressRole, ContractBinding,
//!     GatewayConfig, HttpGateway, ProviderDashboard,
//! };
//! use std::path::Path;
//!
//! let gateway = HttpGateway::connect(&GatewayConfig::new("https://sepolia.example/rpc"))?;
//! let contract = parse_startup_address(
//!     AddressRole::Contract,
//!     "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
//! )?;
//! let binding = ContractBinding::load(contract, Path::new("contract_abi.json"))?;
//!
//! let provider = ProviderDashboard::new(&gateway, &binding);
//! match provider.check_access(
//!     "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
//!     "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
//! )? {
//!     AccessCheck::PatientNotRegistered { .. } => println!("not registered"),
//!     AccessCheck::Report(report) => println!("{}", report.summary()),
//! }
//! # Ok::<(), governance_core::AccessError>(())
//! ```

pub mod binding;
pub mod config;
pub mod console;
pub mod error;
pub mod gateway;
pub mod patient;
pub mod permission;
pub mod provider;
pub mod render;
pub mod rpc;
pub mod sections;
pub mod session;
pub mod transaction;

pub use binding::{ContractBinding, PatientRecord, TransactionIntent};
pub use config::{DashboardConfig, GatewayConfig, ReceiptPolicy};
pub use console::Console;
pub use error::{AccessError, AccessResult};
pub use gateway::{CallRequest, ChainGateway, HttpGateway, Receipt};
pub use patient::{ActionReceipt, GrantReport, PatientDashboard, SectionGrant};
pub use permission::{format_expiration, Permission};
pub use provider::{AccessCheck, AccessReport, AccessRow, ProviderDashboard};
pub use sections::{parse_selection, Section};
pub use session::{TxLog, TxLogEntry};
pub use transaction::{GasPolicy, LegacyTransaction, LocalSigner, SignedTransaction, TransactionBuilder};

pub use governance_validation::{
    AddressRole, RegistrationField, RegistrationInput, ValidationError,
};
