//! Ledger client capability interface and its HTTP JSON-RPC implementation.

use std::{collections::HashMap, time::Duration};

use alloy_consensus::SignableTransaction;
use alloy_eips::{BlockNumberOrTag, eip2718::Encodable2718};
use alloy_network::{Ethereum, TransactionBuilder};
use alloy_primitives::{Address, B256, Bytes, U256};
use alloy_provider::{Provider, RootProvider};
use alloy_rpc_client::RpcClient;
use alloy_rpc_types_eth::TransactionRequest;
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use eyre::{Result, WrapErr};
use tokio::time::sleep;

/// How long to wait for a submitted transaction to be mined.
const DEFAULT_RECEIPT_TIMEOUT: Duration = Duration::from_secs(60);
/// Receipt polling interval.
const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(1);
/// Fixed priority fee for submitted transactions, in wei.
const PRIORITY_FEE: u128 = 1_000_000;

/// One ledger interaction before it is signed and submitted.
///
/// `to == None` marks a contract deployment; `data` then carries the full
/// creation bytecode with constructor arguments already appended.
#[derive(Debug, Clone)]
pub struct TxIntent {
    /// Sending account.
    pub from: Address,
    /// Target account, or `None` for a deployment.
    pub to: Option<Address>,
    /// Native value transferred alongside the interaction.
    pub value: U256,
    /// Calldata or creation bytecode.
    pub data: Bytes,
    /// Gas budget. Must be resolved before a state-changing submission.
    pub gas: Option<u64>,
}

impl TxIntent {
    /// An intent targeting an existing account or contract.
    pub fn call(from: Address, to: Address, data: impl Into<Bytes>) -> Self {
        Self { from, to: Some(to), value: U256::ZERO, data: data.into(), gas: None }
    }

    /// A contract-creation intent carrying the full creation bytecode.
    pub fn deploy(from: Address, code: impl Into<Bytes>) -> Self {
        Self { from, to: None, value: U256::ZERO, data: code.into(), gas: None }
    }

    /// A plain value transfer with empty calldata.
    pub fn transfer(from: Address, to: Address, value: U256) -> Self {
        Self { from, to: Some(to), value, data: Bytes::new(), gas: None }
    }

    /// Sets the gas budget.
    pub fn with_gas(mut self, gas: u64) -> Self {
        self.gas = Some(gas);
        self
    }

    /// Sets the transferred value.
    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }
}

/// Normalized confirmation record for a mined transaction.
#[derive(Debug, Clone)]
pub struct Receipt {
    /// Hash of the mined transaction.
    pub tx_hash: B256,
    /// Execution status reported by the node.
    pub succeeded: bool,
    /// Gas consumed by the transaction.
    pub gas_used: u64,
    /// Address of the created contract, for deployments.
    pub contract_address: Option<Address>,
}

/// Capability interface over the ledger node.
///
/// Implementations sign and submit on behalf of the accounts they hold keys
/// for; the harness only ever describes interactions as [`TxIntent`]s.
#[allow(async_fn_in_trait)]
pub trait LedgerClient {
    /// Account used when a test case does not name a sender.
    fn default_account(&self) -> Address;

    /// Asks the node for the gas an interaction would consume.
    async fn estimate_gas(&self, intent: &TxIntent) -> Result<u64>;

    /// Signs and submits the interaction, waiting for the mined receipt.
    async fn send_transaction(&self, intent: &TxIntent) -> Result<Receipt>;

    /// Executes a read-only call against current chain state.
    async fn call(&self, intent: &TxIntent) -> Result<Bytes>;

    /// Current transaction count (nonce) of an account.
    async fn transaction_count(&self, account: Address) -> Result<u64>;

    /// Gas limit of the latest block.
    async fn block_gas_limit(&self) -> Result<u64>;
}

/// HTTP JSON-RPC ledger client backed by an alloy provider.
#[derive(Debug)]
pub struct RpcLedgerClient {
    provider: RootProvider<Ethereum>,
    signers: HashMap<Address, PrivateKeySigner>,
    default_account: Address,
    chain_id: u64,
    receipt_timeout: Duration,
}

impl RpcLedgerClient {
    /// Connects to a node and derives the account set from the given keys.
    ///
    /// The first key's address becomes the default account. The chain id is
    /// fetched from the node once, at connect time.
    pub async fn connect(rpc_url: &str, keys: Vec<PrivateKeySigner>) -> Result<Self> {
        eyre::ensure!(!keys.is_empty(), "at least one signing key is required");

        let url: url::Url = rpc_url.parse().wrap_err("Invalid RPC URL")?;
        let client = RpcClient::builder().http(url);
        let provider = RootProvider::<Ethereum>::new(client);

        let chain_id = provider.get_chain_id().await.wrap_err("Failed to fetch chain id")?;

        let default_account = keys[0].address();
        let signers = keys.into_iter().map(|key| (key.address(), key)).collect();

        Ok(Self {
            provider,
            signers,
            default_account,
            chain_id,
            receipt_timeout: DEFAULT_RECEIPT_TIMEOUT,
        })
    }

    /// Overrides how long to wait for a submitted transaction to be mined.
    pub fn with_receipt_timeout(mut self, timeout: Duration) -> Self {
        self.receipt_timeout = timeout;
        self
    }

    /// Chain id reported by the node at connect time.
    pub const fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// The underlying provider, for queries the harness does not wrap.
    pub const fn provider(&self) -> &RootProvider<Ethereum> {
        &self.provider
    }

    fn request(&self, intent: &TxIntent) -> TransactionRequest {
        let tx = TransactionRequest::default().from(intent.from).value(intent.value);
        match intent.to {
            Some(to) => tx.to(to).input(intent.data.clone().into()),
            None => tx.with_deploy_code(intent.data.clone()),
        }
    }

    fn signer_for(&self, account: Address) -> Result<&PrivateKeySigner> {
        self.signers
            .get(&account)
            .ok_or_else(|| eyre::eyre!("No signing key for account {account}"))
    }

    fn sign_request(&self, tx: TransactionRequest) -> Result<(Bytes, B256)> {
        let from = tx.from.unwrap_or(self.default_account);
        let signer = self.signer_for(from)?;

        let tx = tx
            .build_typed_tx()
            .map_err(|e| eyre::eyre!("Failed to build typed tx: {:?}", e))?;

        let signature = signer.sign_hash_sync(&tx.signature_hash())?;
        let signed_tx = tx.into_signed(signature);
        let tx_hash = *signed_tx.hash();
        let raw_tx: Bytes = signed_tx.encoded_2718().into();

        Ok((raw_tx, tx_hash))
    }

    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<Receipt> {
        let receipt = tokio::time::timeout(self.receipt_timeout, async {
            loop {
                if let Some(receipt) = self.provider.get_transaction_receipt(tx_hash).await? {
                    return Ok::<_, eyre::Error>(receipt);
                }
                sleep(RECEIPT_POLL_INTERVAL).await;
            }
        })
        .await
        .wrap_err("Receipt timed out")?
        .wrap_err("Failed to get receipt")?;

        Ok(Receipt {
            tx_hash,
            succeeded: receipt.status(),
            gas_used: receipt.gas_used,
            contract_address: receipt.contract_address,
        })
    }
}

impl LedgerClient for RpcLedgerClient {
    fn default_account(&self) -> Address {
        self.default_account
    }

    async fn estimate_gas(&self, intent: &TxIntent) -> Result<u64> {
        self.provider
            .estimate_gas(self.request(intent))
            .await
            .wrap_err("Gas estimation failed")
    }

    async fn send_transaction(&self, intent: &TxIntent) -> Result<Receipt> {
        let gas = intent
            .gas
            .ok_or_else(|| eyre::eyre!("Gas budget must be resolved before submission"))?;

        let nonce = self
            .provider
            .get_transaction_count(intent.from)
            .await
            .wrap_err("Failed to get nonce")?;
        let gas_price = self.provider.get_gas_price().await.wrap_err("Failed to get gas price")?;

        let mut tx = self
            .request(intent)
            .nonce(nonce)
            .gas_limit(gas)
            .max_fee_per_gas(gas_price * 2)
            .max_priority_fee_per_gas(PRIORITY_FEE);
        tx.set_chain_id(self.chain_id);

        let (raw_tx, tx_hash) = self.sign_request(tx)?;
        tracing::debug!(%tx_hash, nonce, gas, "Submitting transaction");

        let _ = self
            .provider
            .send_raw_transaction(&raw_tx)
            .await
            .wrap_err("Failed to send raw transaction")?;

        self.wait_for_receipt(tx_hash).await
    }

    async fn call(&self, intent: &TxIntent) -> Result<Bytes> {
        self.provider.call(self.request(intent)).await.wrap_err("Call failed")
    }

    async fn transaction_count(&self, account: Address) -> Result<u64> {
        self.provider
            .get_transaction_count(account)
            .await
            .wrap_err("Failed to get transaction count")
    }

    async fn block_gas_limit(&self) -> Result<u64> {
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Latest)
            .await
            .wrap_err("Failed to get latest block")?
            .ok_or_else(|| eyre::eyre!("Latest block not available"))?;
        Ok(block.header.gas_limit)
    }
}
