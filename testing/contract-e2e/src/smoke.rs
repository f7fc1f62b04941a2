//! Built-in smoke suite exercising the whole engine against a live node.
//!
//! Deploys a Counter fixture at a pinned nonce, reads and mutates its state,
//! and checks that an unknown selector reverts. Cases chain through the
//! handles the runner returns.

use alloy_primitives::{Bytes, U256};
use alloy_sol_types::SolCall;
use eyre::Result;

use crate::{
    case::{ContractHandle, TestCase},
    client::LedgerClient,
    nonce::{self, DeploymentTarget},
    runner::TestRunner,
};

// Define the Counter contract interface using sol! macro for ABI encoding.
// The bytecode is compiled separately with forge (solc 0.8.30).
//
// Source (src/Counter.sol):
// ```solidity
// // SPDX-License-Identifier: UNLICENSED
// pragma solidity ^0.8.20;
// contract Counter {
//     uint256 public count;
//     function increment() external { count++; }
//     function getCount() external view returns (uint256) { return count; }
// }
// ```
alloy_sol_macro::sol! {
    /// Increment the counter.
    function increment() external;
    /// Get the current count.
    function getCount() external view returns (uint256);
}

// Counter contract bytecode compiled with forge (solc 0.8.30)
// count is stored in slot 0, anyone can increment
const COUNTER_BYTECODE: &str = "6080604052348015600e575f5ffd5b506101898061001c5f395ff3fe608060405234801561000f575f5ffd5b506004361061003f575f3560e01c806306661abd14610043578063a87d942c14610061578063d09de08a1461007f575b5f5ffd5b61004b610089565b60405161005891906100c6565b60405180910390f35b61006961008e565b60405161007691906100c6565b60405180910390f35b610087610096565b005b5f5481565b5f5f54905090565b5f5f8154809291906100a79061010c565b9190505550565b5f819050919050565b6100c0816100ae565b82525050565b5f6020820190506100d95f8301846100b7565b92915050565b7f4e487b71000000000000000000000000000000000000000000000000000000005f52601160045260245ffd5b5f610116826100ae565b91507fffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff8203610148576101476100df565b5b60018201905091905056fea2646970667358221220f20d10175682bbbd1b6bb8f4176629c4124ad6a6532bcaf2cfaa2ed6771b941a64736f6c634300081e0033";

/// Gas headroom the Counter deployment needs from the block gas limit.
const COUNTER_DEPLOY_GAS: u64 = 500_000;

/// Creation-code handle for the Counter fixture.
pub fn counter_fixture() -> Result<ContractHandle> {
    let bytecode =
        hex::decode(COUNTER_BYTECODE).map_err(|e| eyre::eyre!("Failed to decode bytecode: {e}"))?;
    Ok(ContractHandle::new("Counter", bytecode))
}

/// Runs the smoke suite, recording every case in the runner's summary.
///
/// Returns an error only for fatal configuration problems; ordinary case
/// failures are visible in the summary afterwards.
pub async fn run_smoke_suite<C: LedgerClient>(runner: &mut TestRunner<C>) -> Result<()> {
    let from = runner.client().default_account();

    nonce::raise_block_gas_limit(runner.client(), from, COUNTER_DEPLOY_GAS).await?;

    // pin the deployment to the account's current nonce so the address is
    // known before the transaction is submitted
    let current_nonce = runner.client().transaction_count(from).await?;
    let target = DeploymentTarget::new(from, current_nonce);
    target.prepare(runner.client()).await?;
    let expected = target.expected_address;

    let handle = runner
        .run_case(TestCase::deploy("deploy counter", counter_fixture()?, Bytes::new())
            .with_assertion(move |value| {
                let address = value.deployed_address()?;
                eyre::ensure!(address == expected, "deployed to {address}, expected {expected}");
                Ok(())
            }))
        .await?
        .ok_or_else(|| eyre::eyre!("Deployment produced no handle"))?;
    let counter = handle.require_address()?;

    runner
        .run_case(
            TestCase::call("counter starts at zero", counter, getCountCall {}.abi_encode())
                .with_assertion(|value| {
                    let count = getCountCall::abi_decode_returns(value.returned()?)?;
                    eyre::ensure!(count == U256::ZERO, "count should start at 0, got {count}");
                    Ok(())
                }),
        )
        .await?;

    runner
        .run_case(TestCase::send("increment counter", counter, incrementCall {}.abi_encode()))
        .await?;

    runner
        .run_case(
            TestCase::call("counter reads back one", counter, getCountCall {}.abi_encode())
                .with_assertion(|value| {
                    let count = getCountCall::abi_decode_returns(value.returned()?)?;
                    eyre::ensure!(count == U256::from(1), "count should be 1, got {count}");
                    Ok(())
                }),
        )
        .await?;

    runner
        .run_case(
            TestCase::call(
                "unknown selector reverts",
                counter,
                Bytes::from(vec![0xde, 0xad, 0xbe, 0xef]),
            )
            .expect_failure(),
        )
        .await?;

    Ok(())
}
