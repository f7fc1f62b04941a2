//! State-changing transaction executor.

use alloy_primitives::{Address, Bytes};

use super::{ExecOutcome, check_assertion};
use crate::{
    case::{CaseValue, TestCase, TransactionOutcome},
    client::{LedgerClient, TxIntent},
};

/// Submits a transaction and classifies the mined receipt.
///
/// Submission errors are caught and become a failed outcome, never a crash.
/// A receipt whose status matches an expected failure is an unconditional
/// pass; the assertion only runs when success was expected and delivered.
pub(crate) async fn run_send<C: LedgerClient>(
    client: &C,
    case: &TestCase,
    target: Address,
    calldata: &Bytes,
    from: Address,
    gas: u64,
) -> ExecOutcome {
    let intent = TxIntent::call(from, target, calldata.clone())
        .with_value(case.value)
        .with_gas(gas);

    let outcome = match client.send_transaction(&intent).await {
        Ok(receipt) => TransactionOutcome::mined(receipt),
        Err(err) => {
            if case.expected_success {
                tracing::error!(case = case.title(), %err, "Transaction submission failed");
            }
            TransactionOutcome::errored(&err)
        }
    };

    if !outcome.matches(case.expected_success) {
        tracing::error!(
            case = case.title(),
            expected_success = case.expected_success,
            succeeded = outcome.succeeded,
            "Receipt status did not match expectation"
        );
        return ExecOutcome::failed();
    }

    // the transaction failed exactly as predicted; the assertion must not run
    if !case.expected_success {
        return ExecOutcome::passed();
    }

    let ok = match &outcome.receipt {
        Some(receipt) => {
            check_assertion(case.title(), case.assertion.as_ref(), CaseValue::Mined(receipt))
        }
        // a matching successful outcome always carries a receipt
        None => true,
    };

    ExecOutcome { ok, handle: None, gas_used: None }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    };

    use super::*;
    use crate::mock::MockLedger;

    fn target() -> Address {
        Address::repeat_byte(0xc0)
    }

    async fn run(client: &MockLedger, case: TestCase) -> ExecOutcome {
        let from = client.default_account();
        let (target, calldata) = match &case.action {
            crate::case::Action::Send { target, calldata } => (*target, calldata.clone()),
            _ => unreachable!(),
        };
        run_send(client, &case, target, &calldata, from, 100_000).await
    }

    #[tokio::test]
    async fn test_mined_transaction_passes() {
        let client = MockLedger::new();
        let case = TestCase::send("set owner", target(), Bytes::new()).with_assertion(|value| {
            eyre::ensure!(value.receipt()?.succeeded, "receipt not successful");
            Ok(())
        });

        assert!(run(&client, case).await.ok);
    }

    #[tokio::test]
    async fn test_expected_revert_passes_without_assertion() {
        let invoked = Arc::new(AtomicBool::new(false));
        let seen = invoked.clone();

        let client = MockLedger::new().with_reverting_receipts();
        let case = TestCase::send("unauthorized write", target(), Bytes::new())
            .expect_failure()
            .with_assertion(move |_| {
                seen.store(true, Ordering::SeqCst);
                Ok(())
            });

        let outcome = run(&client, case).await;
        assert!(outcome.ok);
        assert!(!invoked.load(Ordering::SeqCst), "assertion must not run on expected failure");
    }

    #[tokio::test]
    async fn test_unexpected_revert_fails_case() {
        let client = MockLedger::new().with_reverting_receipts();
        let case = TestCase::send("should have worked", target(), Bytes::new());

        assert!(!run(&client, case).await.ok);
    }

    #[tokio::test]
    async fn test_rejected_submission_is_absorbed() {
        let client = MockLedger::new().with_rejected_submissions();
        let case = TestCase::send("nonce clash", target(), Bytes::new());

        // the error is converted into a failed outcome, not propagated
        let outcome = run(&client, case).await;
        assert!(!outcome.ok);
    }

    #[tokio::test]
    async fn test_rejected_submission_matches_expected_failure() {
        let client = MockLedger::new().with_rejected_submissions();
        let case = TestCase::send("underfunded sender", target(), Bytes::new()).expect_failure();

        assert!(run(&client, case).await.ok);
    }

    #[tokio::test]
    async fn test_failing_assertion_demotes_case() {
        let client = MockLedger::new();
        let case = TestCase::send("wrong event", target(), Bytes::new())
            .with_assertion(|_| Err(eyre::eyre!("log not found")));

        assert!(!run(&client, case).await.ok);
    }
}
