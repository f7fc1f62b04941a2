//! Fatal precondition errors that abort the whole run.

use alloy_primitives::Address;
use derive_more::{Display, Error};

/// Configuration and fixture errors that cannot be treated as test failures.
///
/// Per-case failures are absorbed into the run summary; these escape the
/// executor boundary, terminate the run with a non-zero exit status, and are
/// not tallied because no meaningful test outcome exists.
#[derive(Debug, Display, Error)]
pub enum FatalError {
    /// The deployment cannot fit in a block at all.
    #[display("deployment needs {estimate} gas but the block gas limit is {block_limit}")]
    GasExceedsBlockLimit {
        /// Gas the node estimates the deployment needs.
        estimate: u64,
        /// Gas limit of the latest block.
        block_limit: u64,
    },
    /// The caller supplied a gas budget below the node's estimate.
    #[display("supplied gas budget {budget} is below the estimated {estimate} gas")]
    GasBudgetBelowEstimate {
        /// Caller-supplied budget.
        budget: u64,
        /// Gas the node estimates the deployment needs.
        estimate: u64,
    },
    /// The pinned nonce would not place the deployment at the agreed address.
    #[display("nonce {nonce} of {sender} deploys to {actual}, expected {expected}")]
    DeploymentAddressMismatch {
        /// Deploying account.
        sender: Address,
        /// Nonce the deployment is pinned to.
        nonce: u64,
        /// Address that nonce actually yields.
        actual: Address,
        /// Address the fixtures expect.
        expected: Address,
    },
    /// The block gas limit never reached the requested threshold.
    #[display("block gas limit stuck below {required} after {filler_txs} filler transactions")]
    GasCeilingNotReached {
        /// Threshold the caller needs.
        required: u64,
        /// Filler transactions issued before giving up.
        filler_txs: usize,
    },
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::gas_exceeds(FatalError::GasExceedsBlockLimit { estimate: 9_000_000, block_limit: 8_000_000 })]
    #[case::budget_below(FatalError::GasBudgetBelowEstimate { budget: 50_000, estimate: 90_000 })]
    #[case::address_mismatch(FatalError::DeploymentAddressMismatch {
        sender: Address::ZERO,
        nonce: 5,
        actual: Address::repeat_byte(0x01),
        expected: Address::repeat_byte(0x02),
    })]
    #[case::ceiling_not_reached(FatalError::GasCeilingNotReached { required: 10_000_000, filler_txs: 64 })]
    fn test_fatal_error_display(#[case] error: FatalError) {
        let display = format!("{}", error);
        assert!(!display.is_empty());
    }
}
