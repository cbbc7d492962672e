//! # Solana Library
//!
//! Ledger access, signing providers and the SOL transfer pipeline.

pub mod client;
pub mod ledger;
pub mod transfer;
pub mod wallet;

// Re-export commonly used types from root for convenience
pub use client::{Network, SolanaClient};
pub use ledger::{BroadcastOptions, LedgerClient, ObservedStatus};
pub use transfer::{SubmissionResult, TransferError, TransferOrchestrator, TransferRequest, TransferUpdate};
pub use wallet::{KeypairWallet, RemoteWallet, SigningProvider, WalletError};
