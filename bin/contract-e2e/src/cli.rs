//! CLI argument parsing and configuration.

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// End-to-end test runner for contract behavior on a live node.
#[derive(Parser, Debug)]
#[command(name = "contract-e2e")]
#[command(about = "End-to-end test runner for contract behavior on a live node")]
pub(crate) struct Args {
    /// HTTP RPC endpoint URL for the node being tested.
    #[arg(long, default_value = "http://localhost:8545")]
    pub rpc_url: String,

    /// Verbose output (can be repeated for more verbosity).
    #[arg(long, short, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Initialize tracing with the specified verbosity level.
pub(crate) fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "contract_e2e=info,contract_e2e_testing=info",
        1 => "contract_e2e=debug,contract_e2e_testing=debug",
        _ => "contract_e2e=trace,contract_e2e_testing=trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();
}
