//! # Transfer Transaction Builder
//!
//! Builds the system-program transfer, with an optional compute-unit price
//! instruction in front of it.

use crate::ledger::LedgerClient;
use solana_compute_budget_interface::ComputeBudgetInstruction;
use solana_sdk::{hash::Hash, instruction::Instruction, pubkey::Pubkey, transaction::Transaction};
use solana_system_interface::instruction as system_instruction;
use tracing::{debug, warn};

/// Highest positive sample, or `None` when nobody paid a priority fee.
pub fn priority_fee_from_samples(samples: &[u64]) -> Option<u64> {
    samples.iter().copied().max().filter(|fee| *fee > 0)
}

/// Best-effort priority fee (micro-lamports per compute unit).
///
/// Never fails: a failed sample query just means no priority fee.
pub async fn estimate_priority_fee(ledger: &dyn LedgerClient, accounts: &[Pubkey]) -> Option<u64> {
    match ledger.get_fee_samples(accounts).await {
        Ok(samples) => {
            let fee = priority_fee_from_samples(&samples);
            debug!(samples = samples.len(), ?fee, "Priority fee estimated");
            fee
        }
        Err(e) => {
            warn!(error = %e, "Priority fee lookup failed, sending without priority fee");
            None
        }
    }
}

/// Instructions for a transfer, compute-unit price first when present.
pub fn transfer_instructions(
    sender: &Pubkey,
    recipient: &Pubkey,
    lamports: u64,
    priority_fee: Option<u64>,
) -> Vec<Instruction> {
    let mut instructions = Vec::with_capacity(2);
    if let Some(micro_lamports) = priority_fee {
        instructions.push(ComputeBudgetInstruction::set_compute_unit_price(micro_lamports));
    }
    instructions.push(system_instruction::transfer(sender, recipient, lamports));
    instructions
}

/// Unsigned transfer paid by `sender` and anchored to `blockhash`.
pub fn build_transfer(
    sender: &Pubkey,
    recipient: &Pubkey,
    lamports: u64,
    blockhash: Hash,
    priority_fee: Option<u64>,
) -> Transaction {
    let instructions = transfer_instructions(sender, recipient, lamports, priority_fee);
    let mut transaction = Transaction::new_with_payer(&instructions, Some(sender));
    transaction.message.recent_blockhash = blockhash;
    transaction
}
