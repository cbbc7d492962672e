//! # Remote Signer Wallet
//!
//! Delegates signing to an external signer over HTTP, such as a hardware wallet
//! daemon or a custody service. The private key never enters this process.
//!
//! ## Protocol
//!
//! ```text
//! GET  {base}/pubkey  ->  { "pubkey": "<base58>" }
//! POST {base}/sign    <-  { "pubkey": "<base58>", "transaction": "<base64 bincode>" }
//!                     ->  { "signedTransaction": "<base64 bincode>" }
//!                      |  { "error": "<reason>" }
//! ```
//!
//! The returned transaction must carry the same message and a signature from the
//! connected identity. Broadcasting stays on this side, through the selected
//! ledger.

use super::{broadcast_signed, ensure_fee_payer, SigningProvider, WalletError};
use crate::ledger::{BroadcastOptions, LedgerClient};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use solana_sdk::{pubkey::Pubkey, signature::Signature, transaction::Transaction};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, instrument};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Deserialize)]
struct PubkeyResponse {
    pubkey: String,
}

#[derive(Debug, Serialize)]
struct SignRequest<'a> {
    pubkey: String,
    transaction: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignResponse {
    signed_transaction: Option<String>,
    error: Option<String>,
}

/// Wallet whose keys live in an external signer.
pub struct RemoteWallet {
    base_url: String,
    http: reqwest::Client,
    identity: Option<Pubkey>,
}

impl RemoteWallet {
    pub fn new(base_url: impl Into<String>) -> Result<Self, WalletError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| WalletError::Remote(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
            identity: None,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// bincode + standard base64, the wire form of a transaction.
pub fn encode_transaction(transaction: &Transaction) -> Result<String, WalletError> {
    let bytes = bincode::serialize(transaction)
        .map_err(|e| WalletError::Remote(format!("Failed to serialize transaction: {}", e)))?;
    Ok(general_purpose::STANDARD.encode(bytes))
}

pub fn decode_transaction(encoded: &str) -> Result<Transaction, WalletError> {
    let bytes = general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| WalletError::Remote(format!("Invalid base64 transaction: {}", e)))?;
    bincode::deserialize(&bytes)
        .map_err(|e| WalletError::Remote(format!("Invalid transaction format: {}", e)))
}

/// Check that `signed` is `original` signed by `identity`.
fn check_signed(original: &Transaction, signed: &Transaction, identity: &Pubkey) -> Result<(), WalletError> {
    if signed.message != original.message {
        return Err(WalletError::Remote(
            "signer returned a different transaction".to_string(),
        ));
    }
    ensure_fee_payer(signed, identity)?;
    match signed.signatures.first() {
        Some(sig) if *sig != Signature::default() => Ok(()),
        _ => Err(WalletError::Remote(
            "signer returned an unsigned transaction".to_string(),
        )),
    }
}

#[async_trait]
impl SigningProvider for RemoteWallet {
    fn name(&self) -> &str {
        "remote"
    }

    fn identity(&self) -> Option<Pubkey> {
        self.identity
    }

    async fn connect(&mut self) -> Result<Pubkey, WalletError> {
        let url = format!("{}/pubkey", self.base_url);
        let response: PubkeyResponse = self
            .http
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| WalletError::Remote(format!("GET {} failed: {}", url, e)))?
            .json()
            .await
            .map_err(|e| WalletError::Remote(format!("Invalid pubkey response: {}", e)))?;

        let pubkey = Pubkey::from_str(&response.pubkey)
            .map_err(|e| WalletError::Remote(format!("Invalid pubkey '{}': {}", response.pubkey, e)))?;
        self.identity = Some(pubkey);
        info!(wallet = self.name(), %pubkey, url = %self.base_url, "Wallet connected");
        Ok(pubkey)
    }

    #[instrument(skip_all, fields(wallet = "remote"))]
    async fn sign_and_send(
        &self,
        transaction: Transaction,
        ledger: &dyn LedgerClient,
        options: &BroadcastOptions,
    ) -> Result<Signature, WalletError> {
        let identity = self.identity.ok_or(WalletError::NotConnected)?;
        ensure_fee_payer(&transaction, &identity)?;

        let encoded = encode_transaction(&transaction)?;
        let url = format!("{}/sign", self.base_url);
        debug!(%url, "Requesting remote signature");

        let response: SignResponse = self
            .http
            .post(&url)
            .json(&SignRequest {
                pubkey: identity.to_string(),
                transaction: &encoded,
            })
            .send()
            .await
            .map_err(|e| WalletError::Remote(format!("POST {} failed: {}", url, e)))?
            .json()
            .await
            .map_err(|e| WalletError::Remote(format!("Invalid sign response: {}", e)))?;

        let signed = match (response.signed_transaction, response.error) {
            (_, Some(reason)) => return Err(WalletError::Rejected(reason)),
            (Some(signed), None) => decode_transaction(&signed)?,
            (None, None) => {
                return Err(WalletError::Remote(
                    "sign response carried neither a transaction nor an error".to_string(),
                ))
            }
        };
        check_signed(&transaction, &signed, &identity)?;

        broadcast_signed(&signed, ledger, options).await
    }

    fn disconnect(&mut self) {
        if self.identity.take().is_some() {
            info!(wallet = self.name(), "Wallet disconnected");
        }
    }
}
