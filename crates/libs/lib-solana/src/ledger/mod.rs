//! # Ledger Capability
//!
//! The narrow read/write surface the transfer flow needs from a Solana node.
//! [`crate::client::SolanaClient`] implements it over JSON-RPC; tests use
//! [`mock::MockLedger`].
//!
//! Two independent sources report on a broadcast transaction:
//!
//! - [`LedgerClient::get_status`] reads the signature-status cache. It is cheap
//!   and fast but may report nothing for a while under load.
//! - [`LedgerClient::get_record`] fetches the stored transaction itself. It is
//!   slower and only answers once the transaction has been committed.

use crate::client::Network;
use async_trait::async_trait;
use solana_commitment_config::CommitmentLevel;
use solana_sdk::{hash::Hash, pubkey::Pubkey, signature::Signature, transaction::Transaction};
use std::fmt;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

/// Status of a signature as reported by the status cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObservedStatus {
    /// The node has no entry for the signature (yet).
    Unknown,
    /// Seen at `processed` commitment only.
    Pending,
    /// Reached `confirmed` commitment without an on-chain error.
    Confirmed,
    /// Reached `finalized` commitment without an on-chain error.
    Finalized,
    /// Reached `confirmed` or better but the transaction failed on-chain.
    Errored(String),
}

impl fmt::Display for ObservedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObservedStatus::Unknown => write!(f, "unknown"),
            ObservedStatus::Pending => write!(f, "pending"),
            ObservedStatus::Confirmed => write!(f, "confirmed"),
            ObservedStatus::Finalized => write!(f, "finalized"),
            ObservedStatus::Errored(detail) => write!(f, "errored ({})", detail),
        }
    }
}

/// A committed transaction as returned by a direct lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRecord {
    pub slot: u64,
    /// On-chain execution error, if the transaction failed.
    pub err: Option<String>,
}

/// Options passed to [`LedgerClient::broadcast`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastOptions {
    /// Skip the node's simulation of the transaction before forwarding it.
    pub skip_preflight: bool,
    /// Commitment level the preflight simulation runs against.
    pub preflight_commitment: CommitmentLevel,
    /// How many times the node re-forwards the transaction to the leader.
    pub max_retries: Option<usize>,
}

impl Default for BroadcastOptions {
    fn default() -> Self {
        Self {
            skip_preflight: false,
            preflight_commitment: CommitmentLevel::Confirmed,
            max_retries: Some(3),
        }
    }
}

/// Read/write access to a Solana network.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Network this client talks to.
    fn network(&self) -> Network;

    /// Current slot. Used as a liveness probe.
    async fn get_sequence_position(&self) -> anyhow::Result<u64>;

    /// Balance of `address` in lamports.
    async fn get_balance(&self, address: &Pubkey) -> anyhow::Result<u64>;

    /// Fresh blockhash to anchor a new transaction.
    async fn get_recency_token(&self) -> anyhow::Result<Hash>;

    /// Recent prioritization fees (micro-lamports per compute unit) paid by
    /// transactions that locked any of `accounts`.
    async fn get_fee_samples(&self, accounts: &[Pubkey]) -> anyhow::Result<Vec<u64>>;

    /// Submit a fully signed transaction.
    async fn broadcast(
        &self,
        transaction: &Transaction,
        options: &BroadcastOptions,
    ) -> anyhow::Result<Signature>;

    /// Status-cache view of `signature`.
    async fn get_status(&self, signature: &Signature) -> anyhow::Result<ObservedStatus>;

    /// Direct lookup of the committed transaction, `None` if not found.
    async fn get_record(&self, signature: &Signature) -> anyhow::Result<Option<TransactionRecord>>;
}
