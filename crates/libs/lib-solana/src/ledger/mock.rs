//! In-memory [`LedgerClient`] with scripted answers and call accounting.

use super::{BroadcastOptions, LedgerClient, ObservedStatus, TransactionRecord};
use crate::client::Network;
use anyhow::anyhow;
use async_trait::async_trait;
use parking_lot::Mutex;
use solana_sdk::{hash::Hash, pubkey::Pubkey, signature::Signature, transaction::Transaction};
use std::collections::VecDeque;
use tokio::time::Instant;

/// One scripted answer to `get_status`.
#[derive(Debug, Clone)]
pub enum StatusStep {
    Status(ObservedStatus),
    TransportError,
}

/// Per-method call counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub sequence_position: usize,
    pub balance: usize,
    pub recency_token: usize,
    pub fee_samples: usize,
    pub broadcast: usize,
    pub status: usize,
    pub record: usize,
}

impl CallCounts {
    pub fn total(&self) -> usize {
        self.sequence_position
            + self.balance
            + self.recency_token
            + self.fee_samples
            + self.broadcast
            + self.status
            + self.record
    }
}

#[derive(Default)]
struct State {
    calls: CallCounts,
    statuses: VecDeque<StatusStep>,
    status_times: Vec<Instant>,
    broadcasts: Vec<Transaction>,
}

/// Scriptable ledger double.
pub struct MockLedger {
    network: Network,
    live: bool,
    balance: Option<u64>,
    blockhash: Hash,
    fee_samples: Option<Vec<u64>>,
    broadcast_error: Option<String>,
    fallback_status: ObservedStatus,
    record: Option<TransactionRecord>,
    record_hidden_for: usize,
    record_fails: bool,
    state: Mutex<State>,
}

impl MockLedger {
    /// A healthy ledger with 10 SOL in every account, no fee samples and a
    /// status cache that never learns about anything.
    pub fn new(network: Network) -> Self {
        Self {
            network,
            live: true,
            balance: Some(10_000_000_000),
            blockhash: Hash::new_from_array([7u8; 32]),
            fee_samples: Some(Vec::new()),
            broadcast_error: None,
            fallback_status: ObservedStatus::Unknown,
            record: None,
            record_hidden_for: 0,
            record_fails: false,
            state: Mutex::new(State::default()),
        }
    }

    pub fn unreachable(mut self) -> Self {
        self.live = false;
        self
    }

    pub fn with_balance(mut self, lamports: u64) -> Self {
        self.balance = Some(lamports);
        self
    }

    pub fn failing_balance(mut self) -> Self {
        self.balance = None;
        self
    }

    pub fn with_fee_samples(mut self, samples: Vec<u64>) -> Self {
        self.fee_samples = Some(samples);
        self
    }

    pub fn failing_fee_samples(mut self) -> Self {
        self.fee_samples = None;
        self
    }

    pub fn rejecting_broadcast(mut self, reason: &str) -> Self {
        self.broadcast_error = Some(reason.to_string());
        self
    }

    /// Answers for successive `get_status` calls; once exhausted, the
    /// fallback status is returned.
    pub fn with_statuses(self, steps: impl IntoIterator<Item = StatusStep>) -> Self {
        self.state.lock().statuses = steps.into_iter().collect();
        self
    }

    pub fn with_fallback_status(mut self, status: ObservedStatus) -> Self {
        self.fallback_status = status;
        self
    }

    pub fn with_record(mut self, record: TransactionRecord) -> Self {
        self.record = Some(record);
        self
    }

    /// The first `lookups` calls to `get_record` find nothing.
    pub fn record_hidden_for(mut self, lookups: usize) -> Self {
        self.record_hidden_for = lookups;
        self
    }

    pub fn failing_record(mut self) -> Self {
        self.record_fails = true;
        self
    }

    pub fn calls(&self) -> CallCounts {
        self.state.lock().calls.clone()
    }

    /// Instants at which `get_status` was called.
    pub fn status_times(&self) -> Vec<Instant> {
        self.state.lock().status_times.clone()
    }

    pub fn broadcasts(&self) -> Vec<Transaction> {
        self.state.lock().broadcasts.clone()
    }
}

#[async_trait]
impl LedgerClient for MockLedger {
    fn network(&self) -> Network {
        self.network
    }

    async fn get_sequence_position(&self) -> anyhow::Result<u64> {
        self.state.lock().calls.sequence_position += 1;
        if self.live {
            Ok(250_000_000)
        } else {
            Err(anyhow!("connection refused"))
        }
    }

    async fn get_balance(&self, _address: &Pubkey) -> anyhow::Result<u64> {
        self.state.lock().calls.balance += 1;
        self.balance.ok_or_else(|| anyhow!("getBalance timed out"))
    }

    async fn get_recency_token(&self) -> anyhow::Result<Hash> {
        self.state.lock().calls.recency_token += 1;
        Ok(self.blockhash)
    }

    async fn get_fee_samples(&self, _accounts: &[Pubkey]) -> anyhow::Result<Vec<u64>> {
        self.state.lock().calls.fee_samples += 1;
        self.fee_samples
            .clone()
            .ok_or_else(|| anyhow!("getRecentPrioritizationFees: method not found"))
    }

    async fn broadcast(
        &self,
        transaction: &Transaction,
        _options: &BroadcastOptions,
    ) -> anyhow::Result<Signature> {
        let mut state = self.state.lock();
        state.calls.broadcast += 1;
        if let Some(reason) = &self.broadcast_error {
            return Err(anyhow!("{}", reason));
        }
        state.broadcasts.push(transaction.clone());
        transaction
            .signatures
            .first()
            .copied()
            .ok_or_else(|| anyhow!("transaction has no signatures"))
    }

    async fn get_status(&self, _signature: &Signature) -> anyhow::Result<ObservedStatus> {
        let mut state = self.state.lock();
        state.calls.status += 1;
        state.status_times.push(Instant::now());
        match state.statuses.pop_front() {
            Some(StatusStep::Status(status)) => Ok(status),
            Some(StatusStep::TransportError) => Err(anyhow!("getSignatureStatuses: 503")),
            None => Ok(self.fallback_status.clone()),
        }
    }

    async fn get_record(&self, _signature: &Signature) -> anyhow::Result<Option<TransactionRecord>> {
        let mut state = self.state.lock();
        state.calls.record += 1;
        if self.record_fails {
            return Err(anyhow!("getTransaction: 429 Too Many Requests"));
        }
        if state.calls.record <= self.record_hidden_for {
            return Ok(None);
        }
        Ok(self.record.clone())
    }
}
