#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

//! End-to-end test runner for contract behavior on a live node.

mod cli;

use alloy_signer_local::PrivateKeySigner;
use clap::Parser;
use cli::Args;
use contract_e2e_testing::{RpcLedgerClient, TestRunner, smoke};
use eyre::{Result, WrapErr};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (ignores errors if file doesn't exist)
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    cli::init_tracing(args.verbose);

    let private_key = std::env::var("PRIVATE_KEY")
        .wrap_err("PRIVATE_KEY must be set to a funded account's key")?;
    let signer: PrivateKeySigner = private_key.parse().wrap_err("Invalid PRIVATE_KEY")?;
    tracing::info!(address = ?signer.address(), "Signer configured");

    let client = RpcLedgerClient::connect(&args.rpc_url, vec![signer])
        .await
        .wrap_err("Failed to connect to the node")?;
    tracing::info!(rpc_url = %args.rpc_url, chain_id = client.chain_id(), "Connected");

    let mut runner = TestRunner::new(client);
    smoke::run_smoke_suite(&mut runner).await?;

    let summary = runner.finish();

    // Exit with error code if any tests failed
    if !summary.all_passed() {
        std::process::exit(1);
    }

    Ok(())
}
