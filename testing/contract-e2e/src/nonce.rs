//! Nonce sequencing for deterministic deployment addresses.
//!
//! Contract addresses are a deterministic function of the deploying account
//! and its nonce at deployment time. Fixtures pin deployments to hard-coded
//! addresses, so the account must be walked to the agreed nonce with no-op
//! transactions before the real deployment is submitted.

use alloy_primitives::{Address, U256};
use eyre::Result;

use crate::{
    client::{LedgerClient, TxIntent},
    error::FatalError,
};

/// Gas budget for a no-op self transfer.
const NOOP_GAS: u64 = 21_000;
/// Upper bound on filler transactions when nudging the block gas limit.
const MAX_FILLER_TXS: usize = 64;

/// Advances `account` to `target` by submitting one no-op transfer per
/// missing nonce. Returns the number of no-ops submitted.
///
/// An account already at or past the target is a no-op with a warning, never
/// an error; callers are responsible for requesting a reachable target.
pub async fn advance_to_nonce<C: LedgerClient>(
    client: &C,
    account: Address,
    target: u64,
) -> Result<u64> {
    let mut current = client.transaction_count(account).await?;
    if current >= target {
        tracing::warn!(%account, current, target, "Account nonce already at or past target");
        return Ok(0);
    }

    let mut submitted = 0u64;
    while current < target {
        let intent = TxIntent::transfer(account, account, U256::ZERO).with_gas(NOOP_GAS);
        let receipt = client.send_transaction(&intent).await?;
        eyre::ensure!(receipt.succeeded, "No-op transaction {} was reverted", receipt.tx_hash);

        submitted += 1;
        current = client.transaction_count(account).await?;
    }

    tracing::debug!(%account, target, submitted, "Account nonce advanced");
    Ok(submitted)
}

/// Pins a deployment to the address implied by a specific account nonce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeploymentTarget {
    /// Address the fixtures expect the contract to land at.
    pub expected_address: Address,
    /// Deploying account.
    pub from: Address,
    /// Nonce the deployment transaction must be mined at.
    pub target_nonce: u64,
}

impl DeploymentTarget {
    /// A target whose expected address is derived from the sender and nonce.
    pub fn new(from: Address, target_nonce: u64) -> Self {
        Self { expected_address: from.create(target_nonce), from, target_nonce }
    }

    /// A target against a fixture-supplied expected address.
    pub const fn with_expected_address(
        from: Address,
        target_nonce: u64,
        expected_address: Address,
    ) -> Self {
        Self { expected_address, from, target_nonce }
    }

    /// Checks the address arithmetic before any transaction is sent.
    ///
    /// A mismatch means the fixture's hard-coded address and the requested
    /// nonce disagree; no test outcome is meaningful past that point.
    pub fn verify(&self) -> Result<(), FatalError> {
        let actual = self.from.create(self.target_nonce);
        if actual != self.expected_address {
            return Err(FatalError::DeploymentAddressMismatch {
                sender: self.from,
                nonce: self.target_nonce,
                actual,
                expected: self.expected_address,
            });
        }
        Ok(())
    }

    /// Verifies the target and walks the account to the deployment nonce.
    ///
    /// Afterwards the account's next transaction is the deployment itself.
    /// Returns the number of no-op transactions submitted.
    pub async fn prepare<C: LedgerClient>(&self, client: &C) -> Result<u64> {
        self.verify()?;
        advance_to_nonce(client, self.from, self.target_nonce).await
    }
}

/// Nudges the chain's block gas limit toward `required`.
///
/// Some ledger implementations adjust the limit toward demand; issuing
/// trivial self-transfers moves it a step per block. The loop is bounded: if
/// the limit has not reached the threshold after [`MAX_FILLER_TXS`]
/// transactions, the run aborts. Returns the reached limit.
pub async fn raise_block_gas_limit<C: LedgerClient>(
    client: &C,
    account: Address,
    required: u64,
) -> Result<u64> {
    let mut limit = client.block_gas_limit().await?;
    let mut filler_txs = 0usize;

    while limit < required {
        if filler_txs >= MAX_FILLER_TXS {
            return Err(FatalError::GasCeilingNotReached { required, filler_txs }.into());
        }

        let intent = TxIntent::transfer(account, account, U256::ZERO).with_gas(NOOP_GAS);
        client.send_transaction(&intent).await?;
        filler_txs += 1;

        limit = client.block_gas_limit().await?;
    }

    if filler_txs > 0 {
        tracing::info!(required, limit, filler_txs, "Block gas limit raised");
    }
    Ok(limit)
}
