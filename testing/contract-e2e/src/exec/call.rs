//! Read-call executor.

use alloy_primitives::{Address, Bytes};

use super::{ExecOutcome, check_assertion};
use crate::{
    case::{CaseValue, TestCase, TransactionOutcome},
    client::{LedgerClient, TxIntent},
};

/// Invokes a method against current chain state without mutating it.
///
/// The call's success must match the case's expectation; on an expected
/// success the assertion runs over the returned bytes. Assertion failures are
/// demoted, never propagated.
pub(crate) async fn run_call<C: LedgerClient>(
    client: &C,
    case: &TestCase,
    target: Address,
    calldata: &Bytes,
    from: Address,
) -> ExecOutcome {
    let intent = TxIntent::call(from, target, calldata.clone()).with_value(case.value);

    let outcome = match client.call(&intent).await {
        Ok(returned) => TransactionOutcome::returned(returned),
        Err(err) => {
            if case.expected_success {
                tracing::error!(case = case.title(), %err, "Read call failed");
            }
            TransactionOutcome::errored(&err)
        }
    };

    if !outcome.matches(case.expected_success) {
        tracing::error!(
            case = case.title(),
            expected_success = case.expected_success,
            succeeded = outcome.succeeded,
            "Call outcome did not match expectation"
        );
        return ExecOutcome::failed();
    }

    // the interaction failed exactly as predicted; the assertion must not run
    if !case.expected_success {
        return ExecOutcome::passed();
    }

    let ok = match &outcome.return_value {
        Some(returned) => {
            check_assertion(case.title(), case.assertion.as_ref(), CaseValue::Returned(returned))
        }
        // a successful call always carries return data
        None => true,
    };

    ExecOutcome { ok, handle: None, gas_used: None }
}
