//! # Signing Providers
//!
//! A signing provider holds (or fronts) the user's key material and can authorize
//! and broadcast a transaction without handing the private key to its caller.
//!
//! Two backends implement [`SigningProvider`]:
//!
//! - [`KeypairWallet`]: a local Solana CLI keypair, signed in-process.
//! - [`RemoteWallet`]: an external signer reached over HTTP; the key never
//!   enters this process.
//!
//! The transfer orchestrator only ever sees `&dyn SigningProvider`.

use crate::ledger::{BroadcastOptions, LedgerClient};
use async_trait::async_trait;
use solana_sdk::{pubkey::Pubkey, signature::Signature, transaction::Transaction};
use thiserror::Error;

pub mod keypair;
pub mod remote;

pub use keypair::KeypairWallet;
pub use remote::RemoteWallet;

/// Wallet operation errors
#[derive(Debug, Error)]
pub enum WalletError {
    /// No identity is connected
    #[error("Wallet not connected")]
    NotConnected,

    /// Failed to load keypair from file
    #[error("Keypair load error: {0}")]
    KeypairLoad(String),

    /// Invalid keypair format
    #[error("Invalid keypair: {0}")]
    InvalidKeypair(String),

    /// Transaction signing error
    #[error("Signing error: {0}")]
    Signing(String),

    /// The signer declined to sign
    #[error("Signature request rejected: {0}")]
    Rejected(String),

    /// The signed transaction was not accepted by the ledger
    #[error("Broadcast failed: {0}")]
    Broadcast(String),

    /// Remote signer transport or protocol failure
    #[error("Remote signer error: {0}")]
    Remote(String),
}

/// Capability to authorize and broadcast transactions for one identity.
#[async_trait]
pub trait SigningProvider: Send + Sync {
    /// Backend name shown to the user.
    fn name(&self) -> &str;

    /// Public key of the connected identity.
    fn identity(&self) -> Option<Pubkey>;

    fn is_connected(&self) -> bool {
        self.identity().is_some()
    }

    /// Establish the connection and return the identity.
    async fn connect(&mut self) -> Result<Pubkey, WalletError>;

    /// Sign `transaction` as its fee payer and broadcast it through `ledger`.
    async fn sign_and_send(
        &self,
        transaction: Transaction,
        ledger: &dyn LedgerClient,
        options: &BroadcastOptions,
    ) -> Result<Signature, WalletError>;

    /// Forget the identity. Idempotent.
    fn disconnect(&mut self);
}

/// Broadcast a signed transaction, shared by both backends.
pub(crate) async fn broadcast_signed(
    transaction: &Transaction,
    ledger: &dyn LedgerClient,
    options: &BroadcastOptions,
) -> Result<Signature, WalletError> {
    ledger
        .broadcast(transaction, options)
        .await
        .map_err(|e| WalletError::Broadcast(e.to_string()))
}

/// Reject transactions whose fee payer is not the connected identity.
pub(crate) fn ensure_fee_payer(transaction: &Transaction, identity: &Pubkey) -> Result<(), WalletError> {
    match transaction.message.account_keys.first() {
        Some(payer) if payer == identity => Ok(()),
        Some(payer) => Err(WalletError::Signing(format!(
            "fee payer {} is not the connected wallet {}",
            payer, identity
        ))),
        None => Err(WalletError::Signing("transaction has no accounts".to_string())),
    }
}
