//! # Transfer Submission
//!
//! Drives a single SOL transfer from user input to a settled outcome:
//!
//! 1. validate the request against the connected signer (no network calls)
//! 2. liveness check (current slot)
//! 3. balance check
//! 4. fresh blockhash
//! 5. best-effort priority fee
//! 6. sign and broadcast through the signing provider
//! 7. poll for confirmation, see [`confirm`]
//!
//! The entry point is [`TransferOrchestrator::submit`].

pub mod builder;
pub mod confirm;
pub mod error;
mod orchestrator;

#[cfg(test)]
mod tests;

use crate::client::Network;
use solana_sdk::{pubkey::Pubkey, signature::Signature};
use std::str::FromStr;

pub use confirm::{ConfirmationAttempt, ConfirmationPolicy, PollObservation};
pub use error::TransferError;
pub use orchestrator::TransferOrchestrator;

/// One user-initiated transfer. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    sender: Pubkey,
    recipient: String,
    lamports: u64,
    network: Network,
}

impl TransferRequest {
    /// The recipient is kept as entered and decoded at submission.
    pub fn new(sender: Pubkey, recipient: impl Into<String>, lamports: u64, network: Network) -> Self {
        Self {
            sender,
            recipient: recipient.into(),
            lamports,
            network,
        }
    }

    pub fn sender(&self) -> &Pubkey {
        &self.sender
    }

    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    pub fn lamports(&self) -> u64 {
        self.lamports
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// Decode the recipient address.
    pub fn recipient_pubkey(&self) -> Result<Pubkey, TransferError> {
        Pubkey::from_str(self.recipient.trim()).map_err(|_| {
            TransferError::InvalidInput(format!("'{}' is not a valid address", self.recipient))
        })
    }
}

/// Outcome of a submission. `submit` only returns `Confirmed` or `Failed`;
/// `Pending` is reported through [`TransferUpdate::Outcome`] right after broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionResult {
    Pending(Signature),
    Confirmed(Signature),
    Failed(TransferError),
}

impl SubmissionResult {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SubmissionResult::Pending(_))
    }

    /// Signature of the broadcast transaction, if there is one.
    pub fn signature(&self) -> Option<&Signature> {
        match self {
            SubmissionResult::Pending(sig) | SubmissionResult::Confirmed(sig) => Some(sig),
            SubmissionResult::Failed(err) => err.signature(),
        }
    }
}

/// Progress of a submission, for UI feedback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferUpdate {
    /// Preconditions passed.
    Validated,
    /// Handing the transaction to the signer.
    Broadcasting { priority_fee: Option<u64> },
    /// One confirmation poll.
    Polled(ConfirmationAttempt),
    /// `Pending` once after broadcast, then exactly one terminal result.
    Outcome(SubmissionResult),
}
