//! Failure taxonomy of a transfer submission.

use solana_sdk::{pubkey::Pubkey, signature::Signature};
use thiserror::Error;

/// Why a transfer did not end in `Confirmed`.
///
/// Variants before `SubmissionRejected` are raised before anything is broadcast,
/// so no funds moved. From `SubmissionRejected` on, a signature may exist.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    /// Bad address, amount, network or disconnected signer. No network call was made.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The ledger could not be reached before broadcasting.
    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),

    /// The sender cannot cover the requested amount.
    #[error("Insufficient funds: balance is {balance} lamports, transfer needs {requested} lamports")]
    InsufficientFunds { balance: u64, requested: u64 },

    /// The signer or the node's preflight check refused the transaction.
    #[error("Submission rejected: {0}")]
    SubmissionRejected(String),

    /// The transaction was recorded but failed on-chain.
    #[error("Transaction {signature} failed on-chain: {detail}")]
    ExecutionError { signature: Signature, detail: String },

    /// No source confirmed the transaction within the attempt ceiling. It may
    /// still land.
    #[error("Could not confirm transaction {signature}; its outcome is unknown")]
    ConfirmationTimeout { signature: Signature },

    /// Polling was cancelled by the caller. The broadcast transaction may still land.
    #[error("Stopped waiting for transaction {signature}; its outcome is unknown")]
    Cancelled { signature: Signature },

    /// Another transfer for the same identity is still in flight.
    #[error("A transfer from {0} is already in progress")]
    AlreadyInFlight(Pubkey),
}

impl TransferError {
    /// Stable variant name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            TransferError::InvalidInput(_) => "InvalidInput",
            TransferError::NetworkUnavailable(_) => "NetworkUnavailable",
            TransferError::InsufficientFunds { .. } => "InsufficientFunds",
            TransferError::SubmissionRejected(_) => "SubmissionRejected",
            TransferError::ExecutionError { .. } => "ExecutionError",
            TransferError::ConfirmationTimeout { .. } => "ConfirmationTimeout",
            TransferError::Cancelled { .. } => "Cancelled",
            TransferError::AlreadyInFlight(_) => "AlreadyInFlight",
        }
    }

    /// Signature of the broadcast transaction, if it got that far.
    pub fn signature(&self) -> Option<&Signature> {
        match self {
            TransferError::ExecutionError { signature, .. }
            | TransferError::ConfirmationTimeout { signature }
            | TransferError::Cancelled { signature } => Some(signature),
            _ => None,
        }
    }

    /// True when the transaction may or may not have succeeded.
    pub fn is_outcome_unknown(&self) -> bool {
        matches!(
            self,
            TransferError::ConfirmationTimeout { .. } | TransferError::Cancelled { .. }
        )
    }
}
