//! Declarative test-case model consumed by the runner.

use std::fmt;

use alloy_primitives::{Address, Bytes, U256};
use eyre::Result;

use crate::client::Receipt;

/// Reference to a contract fixture, deployed or not yet deployed.
///
/// Carries the creation bytecode and, once deployed, the address. The harness
/// never mutates a handle; a successful deployment produces a new handle with
/// the address attached.
#[derive(Debug, Clone)]
pub struct ContractHandle {
    name: String,
    creation_code: Bytes,
    address: Option<Address>,
}

impl ContractHandle {
    /// A not-yet-deployed handle over the given creation bytecode.
    pub fn new(name: impl Into<String>, creation_code: impl Into<Bytes>) -> Self {
        Self { name: name.into(), creation_code: creation_code.into(), address: None }
    }

    /// Fixture name, used in diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Creation bytecode without constructor arguments.
    pub const fn creation_code(&self) -> &Bytes {
        &self.creation_code
    }

    /// Deployed address, if any.
    pub const fn address(&self) -> Option<Address> {
        self.address
    }

    /// Deployed address, or an error for a handle that was never deployed.
    pub fn require_address(&self) -> Result<Address> {
        self.address
            .ok_or_else(|| eyre::eyre!("Contract {} has no deployed address", self.name))
    }

    pub(crate) fn deployed_at(&self, address: Address) -> Self {
        Self { name: self.name.clone(), creation_code: self.creation_code.clone(), address: Some(address) }
    }
}

/// The interaction a test case performs.
///
/// Calldata and constructor arguments are ABI-encoded when the case is
/// constructed, so dispatch reduces to an exhaustive match.
#[derive(Debug, Clone)]
pub enum Action {
    /// Read-only invocation against current chain state.
    Call {
        /// Contract being called.
        target: Address,
        /// ABI-encoded method call.
        calldata: Bytes,
    },
    /// State-changing transaction, mined before the next case runs.
    Send {
        /// Contract being called.
        target: Address,
        /// ABI-encoded method call.
        calldata: Bytes,
    },
    /// Contract deployment.
    Deploy {
        /// Fixture to deploy.
        contract: ContractHandle,
        /// ABI-encoded constructor arguments, appended to the creation code.
        constructor_args: Bytes,
    },
}

/// Value handed to a case assertion once the interaction matched expectations.
#[derive(Debug)]
pub enum CaseValue<'a> {
    /// Raw return data of a read call.
    Returned(&'a Bytes),
    /// Receipt of a mined state-changing transaction.
    Mined(&'a Receipt),
    /// Address and receipt of a successful deployment.
    Deployed {
        /// Where the contract landed.
        address: Address,
        /// The deployment receipt.
        receipt: &'a Receipt,
    },
}

impl CaseValue<'_> {
    /// Return data of a read call, or an error for other interaction kinds.
    pub fn returned(&self) -> Result<&Bytes> {
        match self {
            Self::Returned(data) => Ok(data),
            _ => Err(eyre::eyre!("Interaction produced no return data")),
        }
    }

    /// Deployed contract address, or an error for other interaction kinds.
    pub fn deployed_address(&self) -> Result<Address> {
        match self {
            Self::Deployed { address, .. } => Ok(*address),
            _ => Err(eyre::eyre!("Interaction deployed no contract")),
        }
    }

    /// Receipt of a mined transaction, or an error for read calls.
    pub fn receipt(&self) -> Result<&Receipt> {
        match self {
            Self::Mined(receipt) | Self::Deployed { receipt, .. } => Ok(receipt),
            Self::Returned(_) => Err(eyre::eyre!("Read call produced no receipt")),
        }
    }
}

/// Result-returning predicate run over a successful interaction's value.
///
/// An `Err` demotes the case to a failure; it is logged and never propagated
/// past the executor boundary.
pub type Assertion = Box<dyn Fn(CaseValue<'_>) -> Result<()> + Send + Sync>;

/// Normalized outcome of a single ledger interaction, before classification.
#[derive(Debug)]
pub struct TransactionOutcome {
    /// Whether the interaction itself succeeded.
    pub succeeded: bool,
    /// Receipt, for mined transactions.
    pub receipt: Option<Receipt>,
    /// Return data, for read calls.
    pub return_value: Option<Bytes>,
    /// Underlying RPC error, kept for diagnosis.
    pub error: Option<String>,
}

impl TransactionOutcome {
    pub(crate) fn returned(value: Bytes) -> Self {
        Self { succeeded: true, receipt: None, return_value: Some(value), error: None }
    }

    pub(crate) fn mined(receipt: Receipt) -> Self {
        Self { succeeded: receipt.succeeded, receipt: Some(receipt), return_value: None, error: None }
    }

    pub(crate) fn errored(error: &eyre::Report) -> Self {
        Self { succeeded: false, receipt: None, return_value: None, error: Some(error.to_string()) }
    }

    /// Whether the outcome matches the case's expectation.
    pub fn matches(&self, expected_success: bool) -> bool {
        self.succeeded == expected_success
    }
}

/// One declarative ledger interaction plus the expectations around it.
///
/// Constructed with [`TestCase::call`], [`TestCase::send`] or
/// [`TestCase::deploy`]; optional fields default explicitly: success is
/// expected, the sender is the client's default account, no value is
/// transferred, and the gas budget is resolved by the runner.
pub struct TestCase {
    pub(crate) title: String,
    pub(crate) action: Action,
    pub(crate) expected_success: bool,
    pub(crate) from: Option<Address>,
    pub(crate) value: U256,
    pub(crate) gas: Option<u64>,
    pub(crate) assertion: Option<Assertion>,
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("title", &self.title)
            .field("action", &self.action)
            .field("expected_success", &self.expected_success)
            .field("from", &self.from)
            .field("value", &self.value)
            .field("gas", &self.gas)
            .field("assertion", &self.assertion.is_some())
            .finish()
    }
}

impl TestCase {
    fn new(title: impl Into<String>, action: Action) -> Self {
        Self {
            title: title.into(),
            action,
            expected_success: true,
            from: None,
            value: U256::ZERO,
            gas: None,
            assertion: None,
        }
    }

    /// A read-only call against a deployed contract.
    pub fn call(title: impl Into<String>, target: Address, calldata: impl Into<Bytes>) -> Self {
        Self::new(title, Action::Call { target, calldata: calldata.into() })
    }

    /// A state-changing transaction against a deployed contract.
    pub fn send(title: impl Into<String>, target: Address, calldata: impl Into<Bytes>) -> Self {
        Self::new(title, Action::Send { target, calldata: calldata.into() })
    }

    /// A contract deployment with ABI-encoded constructor arguments.
    pub fn deploy(
        title: impl Into<String>,
        contract: ContractHandle,
        constructor_args: impl Into<Bytes>,
    ) -> Self {
        Self::new(title, Action::Deploy { contract, constructor_args: constructor_args.into() })
    }

    /// Expect the interaction itself to fail.
    pub fn expect_failure(mut self) -> Self {
        self.expected_success = false;
        self
    }

    /// Send from a specific account instead of the client default.
    pub fn from_account(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }

    /// Transfer native value alongside the interaction.
    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    /// Set an explicit gas budget.
    pub fn with_gas(mut self, gas: u64) -> Self {
        self.gas = Some(gas);
        self
    }

    /// Attach an assertion over the interaction's value.
    pub fn with_assertion(
        mut self,
        assertion: impl Fn(CaseValue<'_>) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.assertion = Some(Box::new(assertion));
        self
    }

    /// Case title, as printed in the run report.
    pub fn title(&self) -> &str {
        &self.title
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_defaults() {
        let case = TestCase::send("transfer ownership", Address::ZERO, Bytes::new());
        assert!(case.expected_success);
        assert!(case.from.is_none());
        assert_eq!(case.value, U256::ZERO);
        assert!(case.gas.is_none());
        assert!(case.assertion.is_none());
    }

    #[test]
    fn test_case_builders() {
        let from = Address::repeat_byte(0x22);
        let case = TestCase::call("read owner", Address::ZERO, Bytes::new())
            .expect_failure()
            .from_account(from)
            .with_value(U256::from(7))
            .with_gas(50_000)
            .with_assertion(|_| Ok(()));

        assert!(!case.expected_success);
        assert_eq!(case.from, Some(from));
        assert_eq!(case.value, U256::from(7));
        assert_eq!(case.gas, Some(50_000));
        assert!(case.assertion.is_some());
    }

    #[test]
    fn test_handle_requires_deployment() {
        let handle = ContractHandle::new("Vault", Bytes::from(vec![0x60, 0x00]));
        assert!(handle.address().is_none());
        assert!(handle.require_address().is_err());

        let deployed = handle.deployed_at(Address::repeat_byte(0x33));
        assert_eq!(deployed.require_address().unwrap(), Address::repeat_byte(0x33));
        assert_eq!(deployed.name(), "Vault");
        // the original handle is untouched
        assert!(handle.address().is_none());
    }

    #[test]
    fn test_case_value_accessors() {
        let data = Bytes::from(vec![0x01]);
        let value = CaseValue::Returned(&data);
        assert_eq!(value.returned().unwrap(), &data);
        assert!(value.deployed_address().is_err());
        assert!(value.receipt().is_err());
    }
}
