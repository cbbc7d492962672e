use super::*;
use crate::client::Network;
use crate::ledger::mock::{MockLedger, StatusStep};
use crate::ledger::{ObservedStatus, TransactionRecord};
use crate::wallet::{KeypairWallet, SigningProvider};
use solana_sdk::signature::{Keypair, Signer};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

fn wallet() -> (KeypairWallet, Pubkey) {
    let keypair = Keypair::new();
    let sender = keypair.pubkey();
    (KeypairWallet::from_keypair(keypair), sender)
}

fn request(sender: Pubkey, lamports: u64) -> TransferRequest {
    TransferRequest::new(sender, Pubkey::new_unique().to_string(), lamports, Network::Devnet)
}

fn pending(n: usize) -> impl Iterator<Item = StatusStep> {
    std::iter::repeat(StatusStep::Status(ObservedStatus::Pending)).take(n)
}

fn confirmed() -> StatusStep {
    StatusStep::Status(ObservedStatus::Confirmed)
}

fn gaps(ledger: &MockLedger) -> Vec<Duration> {
    ledger
        .status_times()
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .collect()
}

fn broadcast_signature(ledger: &MockLedger) -> Signature {
    ledger.broadcasts()[0].signatures[0]
}

#[tokio::test(start_paused = true)]
async fn confirms_when_status_reports_confirmed() {
    let (wallet, sender) = wallet();
    let ledger = MockLedger::new(Network::Devnet)
        .with_balance(5_000_000)
        .with_statuses(pending(2).chain([confirmed()]));

    let result = TransferOrchestrator::default()
        .submit(&request(sender, 2_000_000), &wallet, &ledger)
        .await;

    assert_eq!(result, SubmissionResult::Confirmed(broadcast_signature(&ledger)));
    let calls = ledger.calls();
    assert_eq!(calls.sequence_position, 1);
    assert_eq!(calls.balance, 1);
    assert_eq!(calls.recency_token, 1);
    assert_eq!(calls.broadcast, 1);
    assert_eq!(calls.status, 3);
    assert_eq!(calls.record, 0);
}

#[tokio::test]
async fn zero_amount_makes_no_ledger_calls() {
    let (wallet, sender) = wallet();
    let ledger = MockLedger::new(Network::Devnet);

    let result = TransferOrchestrator::default()
        .submit(&request(sender, 0), &wallet, &ledger)
        .await;

    assert!(matches!(result, SubmissionResult::Failed(TransferError::InvalidInput(_))));
    assert_eq!(ledger.calls().total(), 0);
}

#[tokio::test]
async fn insufficient_funds_never_broadcasts() {
    let (wallet, sender) = wallet();
    let ledger = MockLedger::new(Network::Devnet).with_balance(1_000);

    let result = TransferOrchestrator::default()
        .submit(&request(sender, 5_000), &wallet, &ledger)
        .await;

    assert_eq!(
        result,
        SubmissionResult::Failed(TransferError::InsufficientFunds {
            balance: 1_000,
            requested: 5_000
        })
    );
    assert_eq!(ledger.calls().broadcast, 0);
    assert_eq!(ledger.calls().status, 0);
}

#[tokio::test]
async fn amount_equal_to_balance_is_allowed() {
    let (wallet, sender) = wallet();
    let ledger = MockLedger::new(Network::Devnet)
        .with_balance(5_000)
        .with_statuses([confirmed()]);

    let result = TransferOrchestrator::default()
        .submit(&request(sender, 5_000), &wallet, &ledger)
        .await;

    assert!(matches!(result, SubmissionResult::Confirmed(_)));
}

#[tokio::test]
async fn malformed_input_makes_no_ledger_calls() {
    let (wallet, sender) = wallet();
    let ledger = MockLedger::new(Network::Devnet);
    let orchestrator = TransferOrchestrator::default();

    let bad_recipient = TransferRequest::new(sender, "4xKp...", 2_000_000, Network::Devnet);
    let wrong_sender = request(Pubkey::new_unique(), 2_000_000);
    let wrong_network = TransferRequest::new(
        sender,
        Pubkey::new_unique().to_string(),
        2_000_000,
        Network::Mainnet,
    );

    for req in [bad_recipient, wrong_sender, wrong_network] {
        let result = orchestrator.submit(&req, &wallet, &ledger).await;
        assert!(
            matches!(result, SubmissionResult::Failed(TransferError::InvalidInput(_))),
            "{:?}",
            req
        );
    }
    assert_eq!(ledger.calls().total(), 0);
}

#[tokio::test]
async fn disconnected_signer_is_invalid_input() {
    let (mut wallet, sender) = wallet();
    wallet.disconnect();
    let ledger = MockLedger::new(Network::Devnet);

    let result = TransferOrchestrator::default()
        .submit(&request(sender, 10), &wallet, &ledger)
        .await;

    assert!(matches!(result, SubmissionResult::Failed(TransferError::InvalidInput(_))));
    assert_eq!(ledger.calls().total(), 0);
}

#[tokio::test(start_paused = true)]
async fn silent_status_cache_falls_back_to_record_after_ceiling() {
    let (wallet, sender) = wallet();
    // Mid-loop lookups run on attempts 11..=29 and all miss; the final one lands.
    let ledger = MockLedger::new(Network::Devnet)
        .with_record(TransactionRecord { slot: 42, err: None })
        .record_hidden_for(19);

    let result = TransferOrchestrator::default()
        .submit(&request(sender, 2_000_000), &wallet, &ledger)
        .await;

    assert_eq!(result, SubmissionResult::Confirmed(broadcast_signature(&ledger)));
    assert_eq!(ledger.calls().status, 30);
    assert_eq!(ledger.calls().record, 20);
}

#[tokio::test(start_paused = true)]
async fn record_lookup_confirms_mid_loop() {
    let (wallet, sender) = wallet();
    let ledger = MockLedger::new(Network::Devnet).with_record(TransactionRecord { slot: 42, err: None });

    let result = TransferOrchestrator::default()
        .submit(&request(sender, 2_000_000), &wallet, &ledger)
        .await;

    assert!(matches!(result, SubmissionResult::Confirmed(_)));
    // Attempts 0..=10 never consult the record; attempt 11 does and settles.
    assert_eq!(ledger.calls().status, 12);
    assert_eq!(ledger.calls().record, 1);
}

#[tokio::test(start_paused = true)]
async fn no_status_and_no_record_is_a_timeout() {
    let (wallet, sender) = wallet();
    let ledger = MockLedger::new(Network::Devnet);

    let result = TransferOrchestrator::default()
        .submit(&request(sender, 2_000_000), &wallet, &ledger)
        .await;

    let signature = broadcast_signature(&ledger);
    assert_eq!(
        result,
        SubmissionResult::Failed(TransferError::ConfirmationTimeout { signature })
    );
    assert_eq!(ledger.calls().status, 30);
    assert_eq!(ledger.calls().record, 20);
}

#[tokio::test(start_paused = true)]
async fn failing_record_lookups_keep_polling() {
    let (wallet, sender) = wallet();
    let ledger = MockLedger::new(Network::Devnet).failing_record();

    let result = TransferOrchestrator::default()
        .submit(&request(sender, 2_000_000), &wallet, &ledger)
        .await;

    assert!(matches!(
        result,
        SubmissionResult::Failed(TransferError::ConfirmationTimeout { .. })
    ));
    assert_eq!(ledger.calls().status, 30);
}

#[tokio::test(start_paused = true)]
async fn final_record_with_error_is_execution_error() {
    let (wallet, sender) = wallet();
    let ledger = MockLedger::new(Network::Devnet)
        .with_statuses(pending(30))
        .with_record(TransactionRecord {
            slot: 9,
            err: Some("InstructionError(0, Custom(1))".into()),
        });

    let result = TransferOrchestrator::default()
        .submit(&request(sender, 2_000_000), &wallet, &ledger)
        .await;

    // Pending statuses never trigger mid-loop lookups, only the final one.
    assert_eq!(ledger.calls().record, 1);
    match result {
        SubmissionResult::Failed(TransferError::ExecutionError { detail, .. }) => {
            assert!(detail.contains("Custom(1)"))
        }
        other => panic!("unexpected result {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn polling_stops_at_the_confirming_attempt() {
    for k in [0usize, 5, 29] {
        let (wallet, sender) = wallet();
        let ledger = MockLedger::new(Network::Devnet).with_statuses(pending(k).chain([confirmed()]));

        let result = TransferOrchestrator::default()
            .submit(&request(sender, 1), &wallet, &ledger)
            .await;

        assert!(matches!(result, SubmissionResult::Confirmed(_)), "k = {}", k);
        assert_eq!(ledger.calls().status, k + 1, "k = {}", k);
        assert_eq!(ledger.calls().record, 0, "k = {}", k);
    }
}

#[tokio::test(start_paused = true)]
async fn finalized_counts_as_confirmed() {
    let (wallet, sender) = wallet();
    let ledger = MockLedger::new(Network::Devnet)
        .with_statuses([StatusStep::Status(ObservedStatus::Finalized)]);

    let result = TransferOrchestrator::default()
        .submit(&request(sender, 1), &wallet, &ledger)
        .await;

    assert!(matches!(result, SubmissionResult::Confirmed(_)));
}

#[tokio::test(start_paused = true)]
async fn backoff_follows_schedule_and_transport_errors_wait_flat() {
    let (wallet, sender) = wallet();
    let ledger = MockLedger::new(Network::Devnet).with_statuses(
        pending(5)
            .chain([StatusStep::TransportError])
            .chain(pending(1))
            .chain([confirmed()]),
    );

    let result = TransferOrchestrator::default()
        .submit(&request(sender, 1), &wallet, &ledger)
        .await;
    assert!(matches!(result, SubmissionResult::Confirmed(_)));

    let ms = |v: u64| Duration::from_millis(v);
    assert_eq!(
        gaps(&ledger),
        vec![ms(1_000), ms(1_200), ms(1_400), ms(1_600), ms(1_800), ms(1_000), ms(2_200)]
    );
}

#[tokio::test(start_paused = true)]
async fn backoff_caps_at_three_seconds() {
    let (wallet, sender) = wallet();
    let ledger = MockLedger::new(Network::Devnet).with_statuses(pending(14).chain([confirmed()]));

    TransferOrchestrator::default()
        .submit(&request(sender, 1), &wallet, &ledger)
        .await;

    let gaps = gaps(&ledger);
    assert_eq!(gaps.len(), 14);
    for (n, gap) in gaps.iter().enumerate() {
        let expected = (1_000 + 200 * n as u64).min(3_000);
        assert_eq!(*gap, Duration::from_millis(expected), "attempt {}", n);
    }
}

#[tokio::test(start_paused = true)]
async fn fee_lookup_failure_still_sends_plain_transfer() {
    let (wallet, sender) = wallet();
    let ledger = MockLedger::new(Network::Devnet)
        .failing_fee_samples()
        .with_statuses([confirmed()]);

    let result = TransferOrchestrator::default()
        .submit(&request(sender, 2_000_000), &wallet, &ledger)
        .await;

    assert!(matches!(result, SubmissionResult::Confirmed(_)));
    let sent = ledger.broadcasts();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].message.instructions.len(), 1);
    let program = sent[0].message.account_keys[sent[0].message.instructions[0].program_id_index as usize];
    assert_eq!(program, solana_system_interface::program::ID);
}

#[tokio::test(start_paused = true)]
async fn fee_samples_add_compute_unit_price() {
    let (wallet, sender) = wallet();
    let ledger = MockLedger::new(Network::Devnet)
        .with_fee_samples(vec![0, 2_500, 100])
        .with_statuses([confirmed()]);

    TransferOrchestrator::default()
        .submit(&request(sender, 2_000_000), &wallet, &ledger)
        .await;

    let sent = ledger.broadcasts();
    assert_eq!(sent[0].message.instructions.len(), 2);
    let program = sent[0].message.account_keys[sent[0].message.instructions[0].program_id_index as usize];
    assert_eq!(program, solana_compute_budget_interface::ID);
}

#[tokio::test(start_paused = true)]
async fn errored_status_is_execution_error() {
    let (wallet, sender) = wallet();
    let ledger = MockLedger::new(Network::Devnet).with_statuses(
        pending(1).chain([StatusStep::Status(ObservedStatus::Errored(
            "InsufficientFundsForRent".into(),
        ))]),
    );

    let result = TransferOrchestrator::default()
        .submit(&request(sender, 1), &wallet, &ledger)
        .await;

    let signature = broadcast_signature(&ledger);
    assert_eq!(
        result,
        SubmissionResult::Failed(TransferError::ExecutionError {
            signature,
            detail: "InsufficientFundsForRent".into()
        })
    );
    assert_eq!(ledger.calls().status, 2);
    assert_eq!(ledger.calls().record, 0);
}

#[tokio::test]
async fn rejected_broadcast_is_not_polled() {
    let (wallet, sender) = wallet();
    let ledger = MockLedger::new(Network::Devnet).rejecting_broadcast("Blockhash not found");

    let result = TransferOrchestrator::default()
        .submit(&request(sender, 1), &wallet, &ledger)
        .await;

    match result {
        SubmissionResult::Failed(TransferError::SubmissionRejected(reason)) => {
            assert!(reason.contains("Blockhash not found"))
        }
        other => panic!("unexpected result {:?}", other),
    }
    assert_eq!(ledger.calls().status, 0);
}

#[tokio::test]
async fn dead_ledger_is_network_unavailable() {
    let (wallet, sender) = wallet();

    let unreachable = MockLedger::new(Network::Devnet).unreachable();
    let result = TransferOrchestrator::default()
        .submit(&request(sender, 1), &wallet, &unreachable)
        .await;
    assert!(matches!(
        result,
        SubmissionResult::Failed(TransferError::NetworkUnavailable(_))
    ));
    assert_eq!(unreachable.calls().balance, 0);

    let no_balance = MockLedger::new(Network::Devnet).failing_balance();
    let result = TransferOrchestrator::default()
        .submit(&request(sender, 1), &wallet, &no_balance)
        .await;
    assert!(matches!(
        result,
        SubmissionResult::Failed(TransferError::NetworkUnavailable(_))
    ));
    assert_eq!(no_balance.calls().broadcast, 0);
}

#[tokio::test(start_paused = true)]
async fn cancel_stops_polling_with_unknown_outcome() {
    let (wallet, sender) = wallet();
    let ledger = MockLedger::new(Network::Devnet).with_fallback_status(ObservedStatus::Pending);
    let orchestrator = TransferOrchestrator::default();
    let cancel = CancellationToken::new();

    let req = request(sender, 1);
    let (result, _) = tokio::join!(
        orchestrator.submit_with_cancel(&req, &wallet, &ledger, &cancel),
        async {
            tokio::time::sleep(Duration::from_millis(2_500)).await;
            cancel.cancel();
        }
    );

    let signature = broadcast_signature(&ledger);
    assert_eq!(result, SubmissionResult::Failed(TransferError::Cancelled { signature }));
    // Polls at 0ms, 1000ms and 2200ms; cancelled during the next wait.
    assert_eq!(ledger.calls().status, 3);
    assert_eq!(ledger.calls().record, 0);
    assert!(!orchestrator.is_in_flight(&sender));
}

#[tokio::test(start_paused = true)]
async fn second_submission_for_same_sender_is_refused() {
    let (wallet, sender) = wallet();
    let ledger = MockLedger::new(Network::Devnet).with_statuses(pending(2).chain([confirmed()]));
    let orchestrator = TransferOrchestrator::default();

    let first = request(sender, 1);
    let second = request(sender, 2);
    let (a, b) = tokio::join!(
        orchestrator.submit(&first, &wallet, &ledger),
        orchestrator.submit(&second, &wallet, &ledger)
    );

    assert!(matches!(a, SubmissionResult::Confirmed(_)));
    assert_eq!(b, SubmissionResult::Failed(TransferError::AlreadyInFlight(sender)));
    assert_eq!(ledger.calls().broadcast, 1);

    // The slot is released once the first one settles.
    assert!(!orchestrator.is_in_flight(&sender));
    let ledger = MockLedger::new(Network::Devnet).with_statuses([confirmed()]);
    let again = orchestrator.submit(&second, &wallet, &ledger).await;
    assert!(matches!(again, SubmissionResult::Confirmed(_)));
}

#[tokio::test(start_paused = true)]
async fn updates_report_one_pending_and_one_outcome() {
    let (wallet, sender) = wallet();
    let ledger = MockLedger::new(Network::Devnet).with_statuses(pending(1).chain([confirmed()]));
    let (tx, mut rx) = mpsc::unbounded_channel();
    let orchestrator = TransferOrchestrator::default().with_updates(tx);

    let result = orchestrator.submit(&request(sender, 1), &wallet, &ledger).await;
    let signature = broadcast_signature(&ledger);

    let mut updates = Vec::new();
    while let Ok(update) = rx.try_recv() {
        updates.push(update);
    }

    assert_eq!(updates[0], TransferUpdate::Validated);
    assert_eq!(updates[1], TransferUpdate::Broadcasting { priority_fee: None });
    assert_eq!(
        updates[2],
        TransferUpdate::Outcome(SubmissionResult::Pending(signature))
    );
    let polled: Vec<u32> = updates
        .iter()
        .filter_map(|u| match u {
            TransferUpdate::Polled(attempt) => Some(attempt.attempt),
            _ => None,
        })
        .collect();
    assert_eq!(polled, vec![0, 1]);
    assert_eq!(updates.last(), Some(&TransferUpdate::Outcome(result)));
    let outcomes = updates
        .iter()
        .filter(|u| matches!(u, TransferUpdate::Outcome(_)))
        .count();
    assert_eq!(outcomes, 2);
}

#[tokio::test]
async fn rejected_input_still_reports_one_outcome() {
    let (wallet, sender) = wallet();
    let ledger = MockLedger::new(Network::Devnet);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let orchestrator = TransferOrchestrator::default().with_updates(tx);

    orchestrator.submit(&request(sender, 0), &wallet, &ledger).await;

    let update = rx.try_recv().unwrap();
    assert!(matches!(
        update,
        TransferUpdate::Outcome(SubmissionResult::Failed(TransferError::InvalidInput(_)))
    ));
    assert!(rx.try_recv().is_err());
}

#[test]
fn result_helpers() {
    let signature = Signature::default();
    assert!(!SubmissionResult::Pending(signature).is_terminal());
    assert!(SubmissionResult::Confirmed(signature).is_terminal());
    assert_eq!(SubmissionResult::Confirmed(signature).signature(), Some(&signature));
    assert_eq!(
        SubmissionResult::Failed(TransferError::InvalidInput("x".into())).signature(),
        None
    );
}
