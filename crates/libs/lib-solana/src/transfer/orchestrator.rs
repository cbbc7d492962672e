//! # Transfer Orchestrator
//!
//! Runs the submission pipeline against a [`SigningProvider`] and a [`LedgerClient`].
//! Only depends on those two capabilities, never on a concrete backend.

use super::builder::{build_transfer, estimate_priority_fee};
use super::confirm::{await_confirmation, lookup_record, ConfirmationPolicy, PollOutcome, RecordVerdict};
use super::{SubmissionResult, TransferError, TransferRequest, TransferUpdate};
use crate::ledger::{BroadcastOptions, LedgerClient};
use crate::wallet::SigningProvider;
use lib_core::Config;
use parking_lot::Mutex;
use solana_sdk::{pubkey::Pubkey, signature::Signature};
use std::collections::HashSet;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Submits transfers and tracks them to a settled outcome.
///
/// At most one submission per sender identity runs at a time; a second one is
/// refused with [`TransferError::AlreadyInFlight`].
///
/// # Example
///
/// ```rust,no_run
/// use lib_solana::client::{Network, SolanaClient};
/// use lib_solana::transfer::{SubmissionResult, TransferOrchestrator, TransferRequest};
/// use lib_solana::wallet::{KeypairWallet, SigningProvider};
///
/// # async fn example() -> anyhow::Result<()> {
/// let ledger = SolanaClient::builder().network(Network::Devnet).build();
/// let mut wallet = KeypairWallet::from_file("id.json");
/// let sender = wallet.connect().await?;
///
/// let orchestrator = TransferOrchestrator::default();
/// let request = TransferRequest::new(sender, "4xKp...", 2_000_000, Network::Devnet);
/// match orchestrator.submit(&request, &wallet, &ledger).await {
///     SubmissionResult::Confirmed(sig) => println!("confirmed {}", sig),
///     other => println!("{:?}", other),
/// }
/// # Ok(())
/// # }
/// ```
pub struct TransferOrchestrator {
    policy: ConfirmationPolicy,
    broadcast: BroadcastOptions,
    in_flight: Mutex<HashSet<Pubkey>>,
    updates: Option<UnboundedSender<TransferUpdate>>,
}

impl Default for TransferOrchestrator {
    fn default() -> Self {
        Self::new(ConfirmationPolicy::default(), BroadcastOptions::default())
    }
}

/// Releases an in-flight slot on drop.
struct InFlightGuard<'a> {
    slots: &'a Mutex<HashSet<Pubkey>>,
    sender: Pubkey,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.slots.lock().remove(&self.sender);
    }
}

impl TransferOrchestrator {
    pub fn new(policy: ConfirmationPolicy, broadcast: BroadcastOptions) -> Self {
        Self {
            policy,
            broadcast,
            in_flight: Mutex::new(HashSet::new()),
            updates: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let broadcast = BroadcastOptions {
            max_retries: Some(config.broadcast_max_retries),
            ..BroadcastOptions::default()
        };
        Self::new(ConfirmationPolicy::from_config(config), broadcast)
    }

    /// Send progress updates to `updates`.
    pub fn with_updates(mut self, updates: UnboundedSender<TransferUpdate>) -> Self {
        self.updates = Some(updates);
        self
    }

    pub fn policy(&self) -> &ConfirmationPolicy {
        &self.policy
    }

    /// Whether a submission from `sender` is currently running.
    pub fn is_in_flight(&self, sender: &Pubkey) -> bool {
        self.in_flight.lock().contains(sender)
    }

    /// Submit without a way to stop polling early.
    pub async fn submit(
        &self,
        request: &TransferRequest,
        signer: &dyn SigningProvider,
        ledger: &dyn LedgerClient,
    ) -> SubmissionResult {
        self.submit_with_cancel(request, signer, ledger, &CancellationToken::new())
            .await
    }

    /// Submit, stopping confirmation polling after the current attempt once
    /// `cancel` fires. A transaction already broadcast is not affected.
    #[instrument(
        skip_all,
        fields(
            sender = %request.sender(),
            lamports = request.lamports(),
            network = %request.network(),
            wallet = signer.name(),
        )
    )]
    pub async fn submit_with_cancel(
        &self,
        request: &TransferRequest,
        signer: &dyn SigningProvider,
        ledger: &dyn LedgerClient,
        cancel: &CancellationToken,
    ) -> SubmissionResult {
        let result = match self.run(request, signer, ledger, cancel).await {
            Ok(signature) => SubmissionResult::Confirmed(signature),
            Err(err) => SubmissionResult::Failed(err),
        };

        match &result {
            SubmissionResult::Confirmed(signature) => info!(%signature, "Transfer confirmed"),
            SubmissionResult::Failed(err) if err.is_outcome_unknown() => {
                warn!(kind = err.kind(), error = %err, "Transfer outcome unknown")
            }
            SubmissionResult::Failed(err) => warn!(kind = err.kind(), error = %err, "Transfer failed"),
            SubmissionResult::Pending(_) => {}
        }
        self.emit(TransferUpdate::Outcome(result.clone()));
        result
    }

    async fn run(
        &self,
        request: &TransferRequest,
        signer: &dyn SigningProvider,
        ledger: &dyn LedgerClient,
        cancel: &CancellationToken,
    ) -> Result<Signature, TransferError> {
        let recipient = validate(request, signer, ledger)?;
        let sender = *request.sender();
        let _slot = self.claim(sender)?;
        self.emit(TransferUpdate::Validated);

        let slot = ledger
            .get_sequence_position()
            .await
            .map_err(|e| TransferError::NetworkUnavailable(e.to_string()))?;
        debug!(slot, "Ledger is live");

        let balance = ledger
            .get_balance(&sender)
            .await
            .map_err(|e| TransferError::NetworkUnavailable(e.to_string()))?;
        if request.lamports() > balance {
            return Err(TransferError::InsufficientFunds {
                balance,
                requested: request.lamports(),
            });
        }

        let blockhash = ledger
            .get_recency_token()
            .await
            .map_err(|e| TransferError::NetworkUnavailable(e.to_string()))?;
        let priority_fee = estimate_priority_fee(ledger, &[sender, recipient]).await;
        let transaction = build_transfer(&sender, &recipient, request.lamports(), blockhash, priority_fee);

        self.emit(TransferUpdate::Broadcasting { priority_fee });
        let signature = signer
            .sign_and_send(transaction, ledger, &self.broadcast)
            .await
            .map_err(|e| TransferError::SubmissionRejected(e.to_string()))?;
        info!(%signature, "Transfer broadcast, awaiting confirmation");
        self.emit(TransferUpdate::Outcome(SubmissionResult::Pending(signature)));

        let state = await_confirmation(ledger, &signature, &self.policy, cancel, |attempt| {
            self.emit(TransferUpdate::Polled(attempt))
        })
        .await;

        match state {
            PollOutcome::Confirmed(source) => {
                debug!(?source, "Confirmation source");
                Ok(signature)
            }
            PollOutcome::Errored(detail) => Err(TransferError::ExecutionError { signature, detail }),
            PollOutcome::Cancelled => Err(TransferError::Cancelled { signature }),
            PollOutcome::TimedOut => {
                match lookup_record(ledger, &signature).await {
                    RecordVerdict::Landed { slot } => {
                        info!(%signature, slot, "Status cache silent but transaction is recorded");
                        Ok(signature)
                    }
                    RecordVerdict::Failed(detail) => Err(TransferError::ExecutionError { signature, detail }),
                    RecordVerdict::Missing => Err(TransferError::ConfirmationTimeout { signature }),
                }
            }
        }
    }

    fn claim(&self, sender: Pubkey) -> Result<InFlightGuard<'_>, TransferError> {
        if !self.in_flight.lock().insert(sender) {
            return Err(TransferError::AlreadyInFlight(sender));
        }
        Ok(InFlightGuard {
            slots: &self.in_flight,
            sender,
        })
    }

    fn emit(&self, update: TransferUpdate) {
        if let Some(updates) = &self.updates {
            // A dropped receiver only means nobody is watching.
            let _ = updates.send(update);
        }
    }
}

/// Preconditions checked before any ledger call. Returns the decoded recipient.
fn validate(
    request: &TransferRequest,
    signer: &dyn SigningProvider,
    ledger: &dyn LedgerClient,
) -> Result<Pubkey, TransferError> {
    let identity = signer
        .identity()
        .ok_or_else(|| TransferError::InvalidInput("wallet not connected".to_string()))?;
    if identity != *request.sender() {
        return Err(TransferError::InvalidInput(format!(
            "connected wallet {} does not match sender {}",
            identity,
            request.sender()
        )));
    }
    if request.lamports() == 0 {
        return Err(TransferError::InvalidInput(
            "amount must be greater than zero".to_string(),
        ));
    }
    let recipient = request.recipient_pubkey()?;
    if ledger.network() != request.network() {
        return Err(TransferError::InvalidInput(format!(
            "request targets {} but the connection is on {}",
            request.network(),
            ledger.network()
        )));
    }
    Ok(recipient)
}
