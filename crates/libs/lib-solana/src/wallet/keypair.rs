//! # Local Keypair Wallet
//!
//! Signs with a keypair held in process memory.
//!
//! Supported formats:
//! - Solana CLI keypair file: JSON array of 64 bytes (secret + public half)
//! - JSON array of 32 bytes (secret seed only)
//! - base58 encoded secret key, in a file or passed directly

use super::{broadcast_signed, ensure_fee_payer, SigningProvider, WalletError};
use crate::ledger::{BroadcastOptions, LedgerClient};
use async_trait::async_trait;
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    transaction::Transaction,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Wallet backed by a local keypair.
pub struct KeypairWallet {
    /// File the keypair is (re)loaded from on `connect`
    path: Option<PathBuf>,
    /// Loaded keypair, `None` while disconnected
    keypair: Option<Keypair>,
}

impl KeypairWallet {
    /// Wallet that loads `path` when connected.
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            keypair: None,
        }
    }

    /// Wallet around an already loaded keypair. It cannot reconnect after
    /// `disconnect`.
    pub fn from_keypair(keypair: Keypair) -> Self {
        Self {
            path: None,
            keypair: Some(keypair),
        }
    }

    /// Wallet around a base58 encoded secret key.
    pub fn from_base58(secret: &str) -> Result<Self, WalletError> {
        let keypair = parse_keypair(secret)?;
        Ok(Self::from_keypair(keypair))
    }

    fn load(path: &Path) -> Result<Keypair, WalletError> {
        let contents = fs::read_to_string(path).map_err(|e| {
            WalletError::KeypairLoad(format!("Failed to read {}: {}", path.display(), e))
        })?;
        parse_keypair(&contents)
    }
}

/// Parse a keypair from JSON byte-array or base58 text.
pub fn parse_keypair(contents: &str) -> Result<Keypair, WalletError> {
    let contents = contents.trim();
    let bytes = if contents.starts_with('[') {
        serde_json::from_str::<Vec<u8>>(contents)
            .map_err(|e| WalletError::InvalidKeypair(format!("Invalid JSON format: {}", e)))?
    } else {
        bs58::decode(contents)
            .into_vec()
            .map_err(|e| WalletError::InvalidKeypair(format!("Invalid base58: {}", e)))?
    };

    match bytes.len() {
        32 => {
            let mut seed = [0u8; 32];
            seed.copy_from_slice(&bytes);
            Ok(Keypair::new_from_array(seed))
        }
        64 => Keypair::try_from(bytes.as_slice())
            .map_err(|e| WalletError::InvalidKeypair(format!("Corrupt keypair bytes: {}", e))),
        n => Err(WalletError::InvalidKeypair(format!(
            "Expected 32 or 64 bytes, got {}",
            n
        ))),
    }
}

#[async_trait]
impl SigningProvider for KeypairWallet {
    fn name(&self) -> &str {
        "keypair"
    }

    fn identity(&self) -> Option<Pubkey> {
        self.keypair.as_ref().map(|k| k.pubkey())
    }

    async fn connect(&mut self) -> Result<Pubkey, WalletError> {
        if let Some(keypair) = &self.keypair {
            return Ok(keypair.pubkey());
        }
        let path = self
            .path
            .as_ref()
            .ok_or_else(|| WalletError::KeypairLoad("no keypair file configured".to_string()))?;

        let keypair = Self::load(path)?;
        let pubkey = keypair.pubkey();
        self.keypair = Some(keypair);
        info!(wallet = self.name(), %pubkey, "Wallet connected");
        Ok(pubkey)
    }

    async fn sign_and_send(
        &self,
        mut transaction: Transaction,
        ledger: &dyn LedgerClient,
        options: &BroadcastOptions,
    ) -> Result<Signature, WalletError> {
        let keypair = self.keypair.as_ref().ok_or(WalletError::NotConnected)?;
        ensure_fee_payer(&transaction, &keypair.pubkey())?;

        let blockhash = transaction.message.recent_blockhash;
        transaction
            .try_sign(&[keypair], blockhash)
            .map_err(|e| WalletError::Signing(e.to_string()))?;
        debug!(signature = %transaction.signatures[0], "Transaction signed locally");

        broadcast_signed(&transaction, ledger, options).await
    }

    fn disconnect(&mut self) {
        if self.keypair.take().is_some() {
            info!(wallet = self.name(), "Wallet disconnected");
        }
    }
}
