#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

//! Declarative end-to-end test harness for contract behavior on a live node.

mod case;
pub use case::{Action, Assertion, CaseValue, ContractHandle, TestCase, TransactionOutcome};

mod client;
pub use client::{LedgerClient, Receipt, RpcLedgerClient, TxIntent};

mod error;
pub use error::FatalError;

mod exec;

pub mod nonce;
pub use nonce::DeploymentTarget;

mod runner;
pub use runner::{DEFAULT_GAS_LIMIT, RunSummary, TestRunner};

pub mod signing;

pub mod smoke;

#[cfg(test)]
pub(crate) mod mock;
