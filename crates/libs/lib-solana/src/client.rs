//! # Solana RPC Client
//!
//! Provides a high-level wrapper around the non-blocking Solana RPC client with
//! network management, and implements [`LedgerClient`] on top of it.
//!
//! ## Features
//!
//! - **Network Selection**: Switching between Devnet (test) and Mainnet (production)
//! - **Helius Integration**: Support for premium RPC endpoints with API keys
//! - **Liveness & Balances**: Current slot and account balances
//! - **Transaction Submission**: Broadcast with preflight and bounded node retries
//! - **Status Tracking**: Signature status cache and direct transaction lookup
//!
//! ## RPC Endpoints
//!
//! ### Mainnet (with Helius API key)
//! - URL: `https://mainnet.helius-rpc.com/?api-key={key}`
//! - Rate Limit: 100+ req/sec (depends on plan)
//!
//! ### Mainnet (without API key)
//! - URL: `https://api.mainnet-beta.solana.com`
//! - Rate Limit: ~10 req/sec
//!
//! ### Devnet
//! - URL: `https://api.devnet.solana.com`
//! - Rate Limit: ~10 req/sec
//!
//! ## Example
//!
//! ```rust,no_run
//! use lib_solana::client::{Network, SolanaClient};
//! use lib_solana::ledger::LedgerClient;
//! use solana_sdk::pubkey::Pubkey;
//! use std::str::FromStr;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = SolanaClient::builder().network(Network::Devnet).build();
//!
//! let pubkey = Pubkey::from_str("So11111111111111111111111111111111111111112")?;
//! let lamports = client.get_balance(&pubkey).await?;
//! println!("Balance: {} lamports", lamports);
//! # Ok(())
//! # }
//! ```

use crate::ledger::{BroadcastOptions, LedgerClient, ObservedStatus, TransactionRecord};
use anyhow::Context;
use async_trait::async_trait;
use lib_core::Config;
use serde_json::json;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::RpcSendTransactionConfig;
use solana_client::rpc_request::RpcRequest;
use solana_commitment_config::CommitmentConfig;
use solana_sdk::{hash::Hash, pubkey::Pubkey, signature::Signature, transaction::Transaction};
use solana_transaction_status_client_types::{
    EncodedConfirmedTransactionWithStatusMeta, TransactionConfirmationStatus,
};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

const DEVNET_RPC_URL: &str = "https://api.devnet.solana.com";
const MAINNET_RPC_URL: &str = "https://api.mainnet-beta.solana.com";
const EXPLORER_URL: &str = "https://explorer.solana.com";

/// Solana network selection.
///
/// - **Devnet**: the test environment, free test tokens
/// - **Mainnet**: the production environment, real economic value
///
/// # Example
///
/// ```rust
/// use lib_solana::client::Network;
///
/// let network: Network = "mainnet-beta".parse().unwrap();
/// assert_eq!(network, Network::Mainnet);
/// assert_eq!(network.toggle(), Network::Devnet);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Network {
    /// Solana mainnet-beta (production network)
    Mainnet,
    /// Solana devnet (test network)
    #[default]
    Devnet,
}

impl Network {
    /// The other network.
    pub fn toggle(self) -> Self {
        match self {
            Network::Mainnet => Network::Devnet,
            Network::Devnet => Network::Mainnet,
        }
    }

    /// Human readable label for prompts and notices.
    pub fn label(self) -> &'static str {
        match self {
            Network::Mainnet => "Mainnet",
            Network::Devnet => "Devnet",
        }
    }

    /// Public RPC endpoint for the network.
    pub fn default_rpc_url(self) -> &'static str {
        match self {
            Network::Mainnet => MAINNET_RPC_URL,
            Network::Devnet => DEVNET_RPC_URL,
        }
    }

    /// Block explorer link for a transaction signature.
    pub fn explorer_url(self, signature: &Signature) -> String {
        match self {
            Network::Mainnet => format!("{}/tx/{}", EXPLORER_URL, signature),
            Network::Devnet => format!("{}/tx/{}?cluster=devnet", EXPLORER_URL, signature),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Mainnet => write!(f, "mainnet-beta"),
            Network::Devnet => write!(f, "devnet"),
        }
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "devnet" | "test" => Ok(Network::Devnet),
            "mainnet" | "mainnet-beta" | "production" => Ok(Network::Mainnet),
            other => Err(format!(
                "unknown network '{}', expected devnet or mainnet",
                other
            )),
        }
    }
}

/// High-level Solana RPC client wrapper.
///
/// Wraps the official non-blocking `RpcClient` at `confirmed` commitment. The
/// connection is lazy: no request is made until a method is called.
pub struct SolanaClient {
    rpc: Arc<RpcClient>,
    network: Network,
}

/// Builder for configuring SolanaClient.
///
/// Allows fluent configuration of client settings before building.
#[derive(Debug, Clone)]
pub struct SolanaClientBuilder {
    network: Option<Network>,
    helius_api_key: Option<String>,
    custom_rpc_url: Option<String>,
}

impl Default for SolanaClientBuilder {
    fn default() -> Self {
        Self {
            network: Some(Network::Devnet),
            helius_api_key: None,
            custom_rpc_url: None,
        }
    }
}

impl SolanaClientBuilder {
    /// Set the Solana network.
    pub fn network(mut self, network: Network) -> Self {
        self.network = Some(network);
        self
    }

    /// Set the Helius API key for premium RPC access (mainnet only).
    pub fn helius_api_key(mut self, key: String) -> Self {
        self.helius_api_key = Some(key);
        self
    }

    /// Set a custom RPC URL (overrides network-based URL).
    pub fn custom_rpc_url(mut self, url: String) -> Self {
        self.custom_rpc_url = Some(url);
        self
    }

    /// Resolve the endpoint the built client will talk to.
    pub fn rpc_url(&self) -> String {
        let network = self.network.unwrap_or_default();
        if let Some(custom_url) = &self.custom_rpc_url {
            return custom_url.clone();
        }
        match (network, &self.helius_api_key) {
            (Network::Mainnet, Some(key)) => {
                format!("https://mainnet.helius-rpc.com/?api-key={}", key)
            }
            _ => network.default_rpc_url().to_string(),
        }
    }

    /// Build the SolanaClient with configured settings.
    pub fn build(self) -> SolanaClient {
        let network = self.network.unwrap_or_default();
        let rpc_url = self.rpc_url();

        // Never log the Helius key.
        info!(network = %network, custom = self.custom_rpc_url.is_some(), "Connecting to Solana RPC");

        let rpc = Arc::new(RpcClient::new_with_commitment(
            rpc_url,
            CommitmentConfig::confirmed(),
        ));
        SolanaClient { rpc, network }
    }
}

impl SolanaClient {
    /// Create a new Solana RPC client using a builder for configuration.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use lib_solana::client::{SolanaClient, Network};
    ///
    /// let client = SolanaClient::builder()
    ///     .network(Network::Mainnet)
    ///     .helius_api_key("your-api-key".to_string())
    ///     .build();
    /// ```
    pub fn builder() -> SolanaClientBuilder {
        SolanaClientBuilder::default()
    }

    /// Build a client for `network` from the application configuration.
    ///
    /// Custom URLs from the config take precedence; the Helius key only applies
    /// to mainnet.
    pub fn from_config(config: &Config, network: Network) -> Self {
        let mut builder = Self::builder().network(network);
        let custom = match network {
            Network::Devnet => config.devnet_rpc_url.clone(),
            Network::Mainnet => config.mainnet_rpc_url.clone(),
        };
        if let Some(url) = custom {
            builder = builder.custom_rpc_url(url);
        }
        if let Some(key) = config.helius_api_key.clone() {
            builder = builder.helius_api_key(key);
        }
        builder.build()
    }
}

/// Map a status-cache entry onto [`ObservedStatus`].
///
/// Errors observed at `processed` commitment are not final (the slot may still be
/// skipped), so they stay `Pending`.
pub fn observe_status(
    confirmation: Option<TransactionConfirmationStatus>,
    err: Option<String>,
) -> ObservedStatus {
    match (confirmation, err) {
        (None, _) | (Some(TransactionConfirmationStatus::Processed), _) => ObservedStatus::Pending,
        (Some(_), Some(detail)) => ObservedStatus::Errored(detail),
        (Some(TransactionConfirmationStatus::Confirmed), None) => ObservedStatus::Confirmed,
        (Some(TransactionConfirmationStatus::Finalized), None) => ObservedStatus::Finalized,
    }
}

#[async_trait]
impl LedgerClient for SolanaClient {
    fn network(&self) -> Network {
        self.network
    }

    async fn get_sequence_position(&self) -> anyhow::Result<u64> {
        self.rpc
            .get_slot()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to get slot: {}", e))
    }

    async fn get_balance(&self, address: &Pubkey) -> anyhow::Result<u64> {
        self.rpc
            .get_balance(address)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to get balance of {}: {}", address, e))
    }

    async fn get_recency_token(&self) -> anyhow::Result<Hash> {
        self.rpc
            .get_latest_blockhash()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to get latest blockhash: {}", e))
    }

    async fn get_fee_samples(&self, accounts: &[Pubkey]) -> anyhow::Result<Vec<u64>> {
        let fees = self
            .rpc
            .get_recent_prioritization_fees(accounts)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to get prioritization fees: {}", e))?;
        Ok(fees.into_iter().map(|f| f.prioritization_fee).collect())
    }

    async fn broadcast(
        &self,
        transaction: &Transaction,
        options: &BroadcastOptions,
    ) -> anyhow::Result<Signature> {
        let config = RpcSendTransactionConfig {
            skip_preflight: options.skip_preflight,
            preflight_commitment: Some(options.preflight_commitment),
            max_retries: options.max_retries,
            ..RpcSendTransactionConfig::default()
        };
        let signature = self
            .rpc
            .send_transaction_with_config(transaction, config)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to send transaction: {}", e))?;
        debug!(%signature, "Transaction accepted by RPC node");
        Ok(signature)
    }

    async fn get_status(&self, signature: &Signature) -> anyhow::Result<ObservedStatus> {
        let response = self
            .rpc
            .get_signature_statuses(&[*signature])
            .await
            .map_err(|e| anyhow::anyhow!("Failed to get signature status: {}", e))?;

        let status = match response.value.into_iter().next().flatten() {
            Some(status) => status,
            None => return Ok(ObservedStatus::Unknown),
        };
        let err = status.err.as_ref().map(|e| format!("{:?}", e));
        Ok(observe_status(status.confirmation_status, err))
    }

    async fn get_record(&self, signature: &Signature) -> anyhow::Result<Option<TransactionRecord>> {
        let params = json!([
            signature.to_string(),
            {
                "encoding": "json",
                "commitment": "confirmed",
                "maxSupportedTransactionVersion": 0
            }
        ]);
        let record: Option<EncodedConfirmedTransactionWithStatusMeta> = self
            .rpc
            .send(RpcRequest::GetTransaction, params)
            .await
            .context("Failed to get transaction")?;

        Ok(record.map(|tx| TransactionRecord {
            slot: tx.slot,
            err: tx
                .transaction
                .meta
                .and_then(|meta| meta.err)
                .map(|e| format!("{:?}", e)),
        }))
    }
}
