//! Contract deployment executor.

use alloy_primitives::{Address, Bytes};
use eyre::Result;

use super::{ExecOutcome, check_assertion};
use crate::{
    case::{CaseValue, ContractHandle, TestCase, TransactionOutcome},
    client::{LedgerClient, TxIntent},
    error::FatalError,
};

/// Deploys a contract fixture and classifies the result.
///
/// Gas preconditions are enforced before anything is submitted: an estimate
/// above the block gas limit, or an explicit budget below the estimate, is a
/// fixture error that aborts the whole run. Everything past that point is
/// classified like any other transaction.
pub(crate) async fn run_deploy<C: LedgerClient>(
    client: &C,
    case: &TestCase,
    contract: &ContractHandle,
    constructor_args: &Bytes,
    from: Address,
) -> Result<ExecOutcome> {
    let mut code = contract.creation_code().to_vec();
    code.extend_from_slice(constructor_args);
    let intent = TxIntent::deploy(from, Bytes::from(code)).with_value(case.value);

    let block_limit = client.block_gas_limit().await?;

    let estimate = match client.estimate_gas(&intent).await {
        Ok(estimate) => estimate,
        Err(err) => {
            if case.expected_success {
                tracing::error!(
                    case = case.title(),
                    contract = contract.name(),
                    %err,
                    "Gas estimation failed, falling back to the block gas limit"
                );
            }
            block_limit
        }
    };

    if estimate > block_limit {
        return Err(FatalError::GasExceedsBlockLimit { estimate, block_limit }.into());
    }
    let gas = match case.gas {
        Some(budget) => {
            if budget < estimate {
                return Err(FatalError::GasBudgetBelowEstimate { budget, estimate }.into());
            }
            budget
        }
        None => estimate,
    };
    let intent = intent.with_gas(gas);

    let outcome = match client.send_transaction(&intent).await {
        Ok(receipt) => TransactionOutcome::mined(receipt),
        Err(err) => {
            if case.expected_success {
                tracing::error!(
                    case = case.title(),
                    contract = contract.name(),
                    %err,
                    "Deployment submission failed"
                );
            }
            TransactionOutcome::errored(&err)
        }
    };

    if !outcome.matches(case.expected_success) {
        tracing::error!(
            case = case.title(),
            contract = contract.name(),
            expected_success = case.expected_success,
            succeeded = outcome.succeeded,
            "Deployment outcome did not match expectation"
        );
        return Ok(ExecOutcome::failed());
    }

    let gas_used = outcome.receipt.as_ref().map(|receipt| receipt.gas_used);

    if !case.expected_success {
        tracing::info!(case = case.title(), contract = contract.name(), "deployment failed as expected");
        // hand back the un-deployed handle so scripting can continue
        return Ok(ExecOutcome { ok: true, handle: Some(contract.clone()), gas_used });
    }

    let Some(receipt) = &outcome.receipt else {
        // a matching successful outcome always carries a receipt
        return Ok(ExecOutcome::failed());
    };

    match receipt.contract_address {
        Some(address) => {
            tracing::info!(
                case = case.title(),
                contract = contract.name(),
                %address,
                gas_used = receipt.gas_used,
                "deployment successful"
            );
            let ok = check_assertion(
                case.title(),
                case.assertion.as_ref(),
                CaseValue::Deployed { address, receipt },
            );
            Ok(ExecOutcome { ok, handle: Some(contract.deployed_at(address)), gas_used })
        }
        None => {
            tracing::error!(
                case = case.title(),
                contract = contract.name(),
                "Successful deployment receipt carries no contract address"
            );
            Ok(ExecOutcome { ok: false, handle: Some(contract.clone()), gas_used })
        }
    }
}
