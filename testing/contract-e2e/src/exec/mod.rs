//! Action executors: one strategy per interaction kind.
//!
//! All three share a result contract with the runner: did the outcome match
//! the case's expectation, an optional produced contract handle, and the gas
//! consumed (reported for deployments). Per-case errors are absorbed here and
//! converted into booleans; only fatal precondition violations escape.

mod call;
mod deploy;
mod send;

pub(crate) use call::run_call;
pub(crate) use deploy::run_deploy;
pub(crate) use send::run_send;

use crate::case::{Assertion, CaseValue, ContractHandle};

/// What an executor hands back to the runner.
#[derive(Debug)]
pub(crate) struct ExecOutcome {
    /// Whether the case passed.
    pub ok: bool,
    /// Contract handle produced by a deployment.
    pub handle: Option<ContractHandle>,
    /// Gas consumed, reported on the run line for deployments.
    pub gas_used: Option<u64>,
}

impl ExecOutcome {
    pub(crate) const fn passed() -> Self {
        Self { ok: true, handle: None, gas_used: None }
    }

    pub(crate) const fn failed() -> Self {
        Self { ok: false, handle: None, gas_used: None }
    }
}

/// Runs the caller-supplied assertion, demoting a failure instead of
/// propagating it.
pub(crate) fn check_assertion(
    title: &str,
    assertion: Option<&Assertion>,
    value: CaseValue<'_>,
) -> bool {
    match assertion {
        None => true,
        Some(assertion) => match assertion(value) {
            Ok(()) => true,
            Err(err) => {
                tracing::error!(case = title, %err, "Assertion failed");
                false
            }
        },
    }
}
