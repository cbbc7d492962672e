//! # Confirmation Polling
//!
//! After broadcast the only handle on a transaction is its signature. This module
//! polls the status cache with backoff until the outcome settles, and consults the
//! direct transaction lookup when the status cache stays silent.
//!
//! ```text
//!              ┌───────────── retry (backoff) ─────────────┐
//!              ▼                                           │
//!   Polling(0) ──► Polling(n) ── status confirmed ──► Confirmed
//!                      │     ── status errored   ──► Errored
//!                      │     ── unknown, n > 10, record landed ──► Confirmed
//!                      │     ── n + 1 == ceiling ──► TimedOut
//!                      └──── cancelled ──► Cancelled
//! ```
//!
//! The two sources are reconciled by one rule: the transfer is confirmed if either
//! source says so and neither reports an on-chain error.

use crate::ledger::{LedgerClient, ObservedStatus, TransactionRecord};
use lib_core::Config;
use solana_sdk::signature::Signature;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Timing and ceiling of the polling loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationPolicy {
    /// Status polls before giving up.
    pub max_attempts: u32,
    /// An `Unknown` status on an attempt past this index triggers a record lookup.
    pub record_lookup_after: u32,
    /// Delay after attempt 0.
    pub base_delay: Duration,
    /// Added per attempt.
    pub delay_step: Duration,
    /// Cap on the backoff delay.
    pub max_delay: Duration,
    /// Flat delay after a failed status query.
    pub transport_retry_delay: Duration,
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 30,
            record_lookup_after: 10,
            base_delay: Duration::from_millis(1_000),
            delay_step: Duration::from_millis(200),
            max_delay: Duration::from_millis(3_000),
            transport_retry_delay: Duration::from_millis(1_000),
        }
    }
}

impl ConfirmationPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_attempts: config.confirm_max_attempts,
            ..Self::default()
        }
    }

    /// `min(base + step * attempt, max)`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_add(self.delay_step.saturating_mul(attempt))
            .min(self.max_delay)
    }

    fn needs_record_lookup(&self, attempt: u32, observation: &PollObservation) -> bool {
        matches!(observation, PollObservation::Status(ObservedStatus::Unknown))
            && attempt > self.record_lookup_after
    }

    /// Transition out of `Polling(attempt)`.
    ///
    /// `record` is the verdict of a record lookup made during this attempt, if any.
    pub fn next(
        &self,
        attempt: u32,
        observation: &PollObservation,
        record: Option<&RecordVerdict>,
    ) -> Transition {
        let delay = match observation {
            PollObservation::Status(ObservedStatus::Confirmed | ObservedStatus::Finalized) => {
                return Transition::Resolve(PollOutcome::Confirmed(ConfirmationSource::StatusCache));
            }
            PollObservation::Status(ObservedStatus::Errored(detail)) => {
                return Transition::Resolve(PollOutcome::Errored(detail.clone()));
            }
            PollObservation::Status(ObservedStatus::Unknown)
                if matches!(record, Some(RecordVerdict::Landed { .. })) =>
            {
                return Transition::Resolve(PollOutcome::Confirmed(ConfirmationSource::RecordLookup));
            }
            PollObservation::Status(_) => self.backoff_delay(attempt),
            PollObservation::TransportError(_) => self.transport_retry_delay,
        };

        let next = attempt + 1;
        if next >= self.max_attempts {
            Transition::Resolve(PollOutcome::TimedOut)
        } else {
            Transition::Retry { next, delay }
        }
    }
}

/// Which source settled a confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationSource {
    StatusCache,
    RecordLookup,
}

/// Terminal states of the polling loop.
///
/// The non-terminal `Polling(attempt)` state is the loop's attempt counter
/// and never escapes [`await_confirmation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Confirmed(ConfirmationSource),
    Errored(String),
    TimedOut,
    Cancelled,
}

/// Result of deciding on one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Resolve(PollOutcome),
    Retry { next: u32, delay: Duration },
}

/// What one status query returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollObservation {
    Status(ObservedStatus),
    TransportError(String),
}

/// Progress report for a single poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationAttempt {
    pub attempt: u32,
    /// Time since polling started.
    pub elapsed: Duration,
    pub observed: PollObservation,
}

/// What the direct record lookup says.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordVerdict {
    /// Committed without error.
    Landed { slot: u64 },
    /// Committed, failed on-chain.
    Failed(String),
    /// Not found, or the lookup itself failed.
    Missing,
}

impl RecordVerdict {
    pub fn from_lookup(lookup: anyhow::Result<Option<TransactionRecord>>) -> Self {
        match lookup {
            Ok(Some(TransactionRecord { slot, err: None })) => RecordVerdict::Landed { slot },
            Ok(Some(TransactionRecord { err: Some(detail), .. })) => RecordVerdict::Failed(detail),
            Ok(None) => RecordVerdict::Missing,
            Err(e) => {
                warn!(error = %e, "Transaction lookup failed");
                RecordVerdict::Missing
            }
        }
    }
}

/// Look the transaction up directly.
pub async fn lookup_record(ledger: &dyn LedgerClient, signature: &Signature) -> RecordVerdict {
    let verdict = RecordVerdict::from_lookup(ledger.get_record(signature).await);
    debug!(%signature, ?verdict, "Transaction record lookup");
    verdict
}

/// Poll until the outcome settles, the ceiling is hit, or `cancel` fires.
///
/// Returns a terminal [`PollOutcome`]. `on_attempt` sees every poll.
pub async fn await_confirmation(
    ledger: &dyn LedgerClient,
    signature: &Signature,
    policy: &ConfirmationPolicy,
    cancel: &CancellationToken,
    mut on_attempt: impl FnMut(ConfirmationAttempt),
) -> PollOutcome {
    let started = Instant::now();
    let mut attempt = 0;

    let outcome = loop {
        if cancel.is_cancelled() {
            break PollOutcome::Cancelled;
        }

        let observation = match ledger.get_status(signature).await {
            Ok(status) => PollObservation::Status(status),
            Err(e) => {
                debug!(attempt, error = %e, "Status query failed");
                PollObservation::TransportError(e.to_string())
            }
        };

        let record = if policy.needs_record_lookup(attempt, &observation) {
            Some(lookup_record(ledger, signature).await)
        } else {
            None
        };

        on_attempt(ConfirmationAttempt {
            attempt,
            elapsed: started.elapsed(),
            observed: observation.clone(),
        });

        match policy.next(attempt, &observation, record.as_ref()) {
            Transition::Resolve(terminal) => break terminal,
            Transition::Retry { next, delay } => {
                tokio::select! {
                    _ = tokio::time::sleep(delay) => attempt = next,
                    _ = cancel.cancelled() => break PollOutcome::Cancelled,
                }
            }
        }
    };

    debug!(%signature, ?outcome, elapsed_ms = started.elapsed().as_millis() as u64, "Polling finished");
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(s: ObservedStatus) -> PollObservation {
        PollObservation::Status(s)
    }

    #[test]
    fn backoff_grows_linearly_then_caps() {
        let policy = ConfirmationPolicy::default();
        for n in 0..40u32 {
            let expected = (1_000 + 200 * n as u64).min(3_000);
            assert_eq!(policy.backoff_delay(n), Duration::from_millis(expected), "attempt {}", n);
        }
        assert_eq!(policy.backoff_delay(10), Duration::from_millis(3_000));
        assert_eq!(policy.backoff_delay(9), Duration::from_millis(2_800));
    }

    #[test]
    fn confirmed_and_finalized_resolve() {
        let policy = ConfirmationPolicy::default();
        for s in [ObservedStatus::Confirmed, ObservedStatus::Finalized] {
            assert_eq!(
                policy.next(3, &status(s), None),
                Transition::Resolve(PollOutcome::Confirmed(ConfirmationSource::StatusCache))
            );
        }
    }

    #[test]
    fn on_chain_error_resolves_to_errored() {
        let policy = ConfirmationPolicy::default();
        assert_eq!(
            policy.next(0, &status(ObservedStatus::Errored("Custom(1)".into())), None),
            Transition::Resolve(PollOutcome::Errored("Custom(1)".into()))
        );
    }

    #[test]
    fn pending_retries_with_backoff() {
        let policy = ConfirmationPolicy::default();
        assert_eq!(
            policy.next(2, &status(ObservedStatus::Pending), None),
            Transition::Retry {
                next: 3,
                delay: Duration::from_millis(1_400)
            }
        );
    }

    #[test]
    fn transport_error_retries_flat() {
        let policy = ConfirmationPolicy::default();
        assert_eq!(
            policy.next(12, &PollObservation::TransportError("503".into()), None),
            Transition::Retry {
                next: 13,
                delay: Duration::from_millis(1_000)
            }
        );
    }

    #[test]
    fn record_lookup_only_past_threshold() {
        let policy = ConfirmationPolicy::default();
        let unknown = status(ObservedStatus::Unknown);
        assert!(!policy.needs_record_lookup(10, &unknown));
        assert!(policy.needs_record_lookup(11, &unknown));
        assert!(!policy.needs_record_lookup(11, &status(ObservedStatus::Pending)));
    }

    #[test]
    fn landed_record_confirms_unknown_status() {
        let policy = ConfirmationPolicy::default();
        let unknown = status(ObservedStatus::Unknown);
        assert_eq!(
            policy.next(11, &unknown, Some(&RecordVerdict::Landed { slot: 7 })),
            Transition::Resolve(PollOutcome::Confirmed(ConfirmationSource::RecordLookup))
        );
        // A failed or missing record keeps polling.
        assert!(matches!(
            policy.next(11, &unknown, Some(&RecordVerdict::Failed("x".into()))),
            Transition::Retry { next: 12, .. }
        ));
        assert!(matches!(
            policy.next(11, &unknown, Some(&RecordVerdict::Missing)),
            Transition::Retry { next: 12, .. }
        ));
    }

    #[test]
    fn ceiling_times_out() {
        let policy = ConfirmationPolicy::default();
        assert!(matches!(
            policy.next(28, &status(ObservedStatus::Unknown), None),
            Transition::Retry { next: 29, .. }
        ));
        assert_eq!(
            policy.next(29, &status(ObservedStatus::Unknown), None),
            Transition::Resolve(PollOutcome::TimedOut)
        );
    }

    #[test]
    fn record_verdicts() {
        assert_eq!(
            RecordVerdict::from_lookup(Ok(Some(TransactionRecord { slot: 5, err: None }))),
            RecordVerdict::Landed { slot: 5 }
        );
        assert_eq!(
            RecordVerdict::from_lookup(Ok(Some(TransactionRecord {
                slot: 5,
                err: Some("InsufficientFundsForFee".into())
            }))),
            RecordVerdict::Failed("InsufficientFundsForFee".into())
        );
        assert_eq!(RecordVerdict::from_lookup(Ok(None)), RecordVerdict::Missing);
        assert_eq!(
            RecordVerdict::from_lookup(Err(anyhow::anyhow!("timeout"))),
            RecordVerdict::Missing
        );
    }

    #[tokio::test(start_paused = true)]
    async fn loop_ends_in_timed_out_at_ceiling() {
        use crate::client::Network;
        use crate::ledger::mock::MockLedger;

        let ledger = MockLedger::new(Network::Devnet).with_fallback_status(ObservedStatus::Pending);
        let policy = ConfirmationPolicy {
            max_attempts: 4,
            ..ConfirmationPolicy::default()
        };
        let mut seen = Vec::new();

        let outcome = await_confirmation(
            &ledger,
            &Signature::default(),
            &policy,
            &CancellationToken::new(),
            |a| seen.push(a.attempt),
        )
        .await;

        assert_eq!(outcome, PollOutcome::TimedOut);
        assert_eq!(seen, vec![0, 1, 2, 3]);
        assert_eq!(ledger.calls().status, 4);
        assert_eq!(ledger.calls().record, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_before_first_poll() {
        use crate::client::Network;
        use crate::ledger::mock::MockLedger;

        let ledger = MockLedger::new(Network::Devnet);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = await_confirmation(
            &ledger,
            &Signature::default(),
            &ConfirmationPolicy::default(),
            &cancel,
            |_| {},
        )
        .await;

        assert_eq!(outcome, PollOutcome::Cancelled);
        assert_eq!(ledger.calls().status, 0);
    }
}
