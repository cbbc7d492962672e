//! # Wallet App State
//!
//! Everything the send screen needs between user actions: the selected network
//! and its ledger connection, the connected signer, the transfer form and the
//! last confirmed signature.
//!
//! Switching networks invalidates the signer connection, so the signer is
//! disconnected and must be connected again on the new network.

use crate::form::TransferForm;
use lib_core::Config;
use lib_solana::client::{Network, SolanaClient};
use lib_solana::ledger::LedgerClient;
use lib_solana::transfer::{SubmissionResult, TransferError, TransferOrchestrator};
use lib_solana::wallet::{SigningProvider, WalletError};
use solana_sdk::{pubkey::Pubkey, signature::Signature};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Builds the ledger connection for a network.
pub type LedgerFactory = Box<dyn Fn(Network) -> Arc<dyn LedgerClient> + Send + Sync>;

/// Ledger factory backed by JSON-RPC endpoints from the configuration.
pub fn rpc_ledger_factory(config: &Config) -> LedgerFactory {
    let config = config.clone();
    Box::new(move |network| Arc::new(SolanaClient::from_config(&config, network)) as Arc<dyn LedgerClient>)
}

pub struct WalletApp {
    network: Network,
    ledgers: LedgerFactory,
    ledger: Arc<dyn LedgerClient>,
    signer: Option<Box<dyn SigningProvider>>,
    form: TransferForm,
    orchestrator: Arc<TransferOrchestrator>,
    last_signature: Option<Signature>,
}

impl WalletApp {
    pub fn new(network: Network, ledgers: LedgerFactory, orchestrator: Arc<TransferOrchestrator>) -> Self {
        let ledger = ledgers(network);
        Self {
            network,
            ledgers,
            ledger,
            signer: None,
            form: TransferForm::new(),
            orchestrator,
            last_signature: None,
        }
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn ledger(&self) -> &Arc<dyn LedgerClient> {
        &self.ledger
    }

    pub fn form(&self) -> &TransferForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut TransferForm {
        &mut self.form
    }

    pub fn last_signature(&self) -> Option<&Signature> {
        self.last_signature.as_ref()
    }

    /// Identity of the connected signer.
    pub fn identity(&self) -> Option<Pubkey> {
        self.signer.as_ref().and_then(|s| s.identity())
    }

    pub fn signer_name(&self) -> Option<&str> {
        self.signer.as_deref().map(|s| s.name())
    }

    /// Connect `signer` and make it the active one.
    pub async fn connect(&mut self, mut signer: Box<dyn SigningProvider>) -> Result<Pubkey, WalletError> {
        self.disconnect();
        let identity = signer.connect().await?;
        self.signer = Some(signer);
        Ok(identity)
    }

    pub fn disconnect(&mut self) {
        if let Some(mut signer) = self.signer.take() {
            signer.disconnect();
        }
    }

    /// Move to `network`: new ledger connection, signer disconnected, form cleared.
    pub fn switch_network(&mut self, network: Network) {
        if network == self.network {
            return;
        }
        info!(from = %self.network, to = %network, "Switching network");
        self.network = network;
        self.ledger = (self.ledgers)(network);
        self.disconnect();
        self.form.reset();
    }

    pub fn toggle_network(&mut self) {
        self.switch_network(self.network.toggle());
    }

    /// Whether a transfer from the connected identity is running.
    pub fn is_processing(&self) -> bool {
        self.identity()
            .map(|id| self.orchestrator.is_in_flight(&id))
            .unwrap_or(false)
    }

    pub fn can_submit(&self) -> bool {
        !self.is_processing() && self.form.is_submittable(self.identity().is_some())
    }

    /// Balance of `address`, or of the connected identity.
    pub async fn balance(&self, address: Option<Pubkey>) -> anyhow::Result<u64> {
        let address = address
            .or_else(|| self.identity())
            .ok_or_else(|| anyhow::anyhow!("No address given and no wallet connected"))?;
        self.ledger.get_balance(&address).await
    }

    /// Submit the form as a transfer and wait for the outcome.
    pub async fn send(&mut self, cancel: &CancellationToken) -> SubmissionResult {
        let Some(signer) = self.signer.as_deref() else {
            return SubmissionResult::Failed(TransferError::InvalidInput(
                "wallet not connected".to_string(),
            ));
        };
        let Some(sender) = signer.identity() else {
            return SubmissionResult::Failed(TransferError::InvalidInput(
                "wallet not connected".to_string(),
            ));
        };

        let request = self.form.to_request(sender, self.network);
        let result = self
            .orchestrator
            .submit_with_cancel(&request, signer, self.ledger.as_ref(), cancel)
            .await;

        if let SubmissionResult::Confirmed(signature) = &result {
            self.last_signature = Some(*signature);
            self.form.reset();
        }
        result
    }
}
