//! Test runner and pass/fail ledger.

use std::fmt;

use eyre::Result;

use crate::{
    case::{Action, ContractHandle, TestCase},
    client::LedgerClient,
    exec,
};

/// Gas ceiling applied to state-changing cases that do not name a budget.
///
/// Deployments resolve their own budget from the node's estimate instead.
pub const DEFAULT_GAS_LIMIT: u64 = 4_700_000;

/// Pass/fail counters for one run.
///
/// Owned by the runner and handed back to the caller; the process exit code
/// is derived from it exactly once, at the end of the run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Cases whose outcome matched their expectation.
    pub passed: u64,
    /// Cases whose outcome did not.
    pub failed: u64,
}

impl RunSummary {
    /// Total number of recorded cases.
    pub const fn total(&self) -> u64 {
        self.passed + self.failed
    }

    /// Whether every recorded case passed.
    pub const fn all_passed(&self) -> bool {
        self.failed == 0
    }

    fn record(&mut self, ok: bool) {
        if ok {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "completed {} tests with {} failures.", self.total(), self.failed)
    }
}

/// Drives declarative test cases against one ledger client.
///
/// Cases execute strictly sequentially: each interaction is awaited to
/// completion before the next case runs, because later cases assume the chain
/// state produced by earlier ones.
#[derive(Debug)]
pub struct TestRunner<C> {
    client: C,
    summary: RunSummary,
}

impl<C: LedgerClient> TestRunner<C> {
    /// A runner with zeroed counters.
    pub fn new(client: C) -> Self {
        Self { client, summary: RunSummary::default() }
    }

    /// The ledger client cases run against.
    pub const fn client(&self) -> &C {
        &self.client
    }

    /// Counters recorded so far.
    pub const fn summary(&self) -> RunSummary {
        self.summary
    }

    /// Executes one case, records its outcome, and prints the report line.
    ///
    /// Per-case failures land in the summary and are never returned as
    /// errors; `Err` is reserved for fatal configuration errors that must
    /// abort the whole run. Deployments hand back the deployed handle so
    /// scripts can chain further cases against it.
    pub async fn run_case(&mut self, case: TestCase) -> Result<Option<ContractHandle>> {
        let from = case.from.unwrap_or_else(|| self.client.default_account());

        let outcome = match &case.action {
            Action::Call { target, calldata } => {
                exec::run_call(&self.client, &case, *target, calldata, from).await
            }
            Action::Send { target, calldata } => {
                let gas = case.gas.unwrap_or(DEFAULT_GAS_LIMIT);
                exec::run_send(&self.client, &case, *target, calldata, from, gas).await
            }
            Action::Deploy { contract, constructor_args } => {
                exec::run_deploy(&self.client, &case, contract, constructor_args, from).await?
            }
        };

        self.summary.record(outcome.ok);
        report_case(outcome.ok, case.title(), outcome.gas_used);

        Ok(outcome.handle)
    }

    /// Prints the summary line and returns the final counters.
    pub fn finish(self) -> RunSummary {
        println!("{}", self.summary);
        self.summary
    }
}

fn report_case(ok: bool, title: &str, gas_used: Option<u64>) {
    let mark = if ok { '✓' } else { '✗' };
    match gas_used {
        Some(gas) => println!("  {mark} {title} ({gas} gas)"),
        None => println!("  {mark} {title}"),
    }
}
