//! In-memory ledger client used by the unit tests.

use std::{
    collections::HashMap,
    sync::Mutex,
};

use alloy_primitives::{Address, B256, Bytes, keccak256};
use eyre::Result;

use crate::client::{LedgerClient, Receipt, TxIntent};

/// Programmable [`LedgerClient`] with deterministic, in-memory behavior.
///
/// Nonces advance by one per submitted transaction, deployments land at
/// `create(from, nonce)`, and every submitted intent is recorded in `sent`.
#[derive(Debug)]
pub(crate) struct MockLedger {
    default_account: Address,
    nonces: Mutex<HashMap<Address, u64>>,
    block_gas_limit: Mutex<u64>,
    ceiling_bump_per_tx: u64,
    estimate: Option<u64>,
    call_reverts: bool,
    call_return: Bytes,
    receipt_status: bool,
    reject_submissions: bool,
    /// Every intent that reached `send_transaction`, in submission order.
    pub sent: Mutex<Vec<TxIntent>>,
}

impl MockLedger {
    pub(crate) fn new() -> Self {
        Self {
            default_account: Address::repeat_byte(0x11),
            nonces: Mutex::new(HashMap::new()),
            block_gas_limit: Mutex::new(8_000_000),
            ceiling_bump_per_tx: 0,
            estimate: Some(90_000),
            call_reverts: false,
            call_return: Bytes::from(vec![0u8; 32]),
            receipt_status: true,
            reject_submissions: false,
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Fixes the bytes every read call returns.
    pub(crate) fn with_call_return(self, data: impl Into<Bytes>) -> Self {
        Self { call_return: data.into(), ..self }
    }

    /// Makes every read call fail.
    pub(crate) fn with_reverting_calls(self) -> Self {
        Self { call_reverts: true, ..self }
    }

    /// Makes every mined receipt report a reverted execution.
    pub(crate) fn with_reverting_receipts(self) -> Self {
        Self { receipt_status: false, ..self }
    }

    /// Makes every submission fail before mining.
    pub(crate) fn with_rejected_submissions(self) -> Self {
        Self { reject_submissions: true, ..self }
    }

    /// Sets the latest-block gas limit.
    pub(crate) fn with_block_gas_limit(self, limit: u64) -> Self {
        Self { block_gas_limit: Mutex::new(limit), ..self }
    }

    /// Raises the block gas limit by `bump` after each submitted transaction.
    pub(crate) fn with_ceiling_bump(self, bump: u64) -> Self {
        Self { ceiling_bump_per_tx: bump, ..self }
    }

    /// Fixes the gas estimate.
    pub(crate) fn with_estimate(self, estimate: u64) -> Self {
        Self { estimate: Some(estimate), ..self }
    }

    /// Makes gas estimation fail.
    pub(crate) fn with_failing_estimation(self) -> Self {
        Self { estimate: None, ..self }
    }

    /// Pins an account's starting nonce.
    pub(crate) fn with_nonce(self, account: Address, nonce: u64) -> Self {
        self.nonces.lock().unwrap().insert(account, nonce);
        self
    }

    /// Current block gas limit, for test expectations.
    pub(crate) fn block_gas_limit_now(&self) -> u64 {
        *self.block_gas_limit.lock().unwrap()
    }
}

impl LedgerClient for MockLedger {
    fn default_account(&self) -> Address {
        self.default_account
    }

    async fn estimate_gas(&self, _intent: &TxIntent) -> Result<u64> {
        self.estimate
            .ok_or_else(|| eyre::eyre!("execution reverted during estimation"))
    }

    async fn send_transaction(&self, intent: &TxIntent) -> Result<Receipt> {
        if self.reject_submissions {
            return Err(eyre::eyre!("submission rejected: nonce too low"));
        }

        let nonce = {
            let mut nonces = self.nonces.lock().unwrap();
            let nonce = *nonces.get(&intent.from).unwrap_or(&0);
            nonces.insert(intent.from, nonce + 1);
            nonce
        };

        *self.block_gas_limit.lock().unwrap() += self.ceiling_bump_per_tx;
        self.sent.lock().unwrap().push(intent.clone());

        let contract_address = intent.to.is_none().then(|| intent.from.create(nonce));

        let mut seed = intent.from.to_vec();
        seed.extend_from_slice(&nonce.to_be_bytes());
        let tx_hash: B256 = keccak256(&seed);

        Ok(Receipt {
            tx_hash,
            succeeded: self.receipt_status,
            gas_used: intent.gas.unwrap_or(21_000),
            contract_address,
        })
    }

    async fn call(&self, _intent: &TxIntent) -> Result<Bytes> {
        if self.call_reverts {
            return Err(eyre::eyre!("execution reverted"));
        }
        Ok(self.call_return.clone())
    }

    async fn transaction_count(&self, account: Address) -> Result<u64> {
        Ok(*self.nonces.lock().unwrap().get(&account).unwrap_or(&0))
    }

    async fn block_gas_limit(&self) -> Result<u64> {
        Ok(*self.block_gas_limit.lock().unwrap())
    }
}
