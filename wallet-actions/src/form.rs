//! # Transfer Form
//!
//! Holds the raw recipient text and amount while the user fills them in.
//! The recipient is decoded on every change so submittability is always current.

use lib_solana::client::Network;
use lib_solana::transfer::TransferRequest;
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferForm {
    recipient_input: String,
    recipient: Option<Pubkey>,
    lamports: u64,
}

impl TransferForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the recipient text and try to decode it.
    pub fn set_recipient(&mut self, input: &str) {
        self.recipient_input = input.to_string();
        self.recipient = Pubkey::from_str(input.trim()).ok();
    }

    pub fn set_lamports(&mut self, lamports: u64) {
        self.lamports = lamports;
    }

    pub fn recipient_input(&self) -> &str {
        &self.recipient_input
    }

    /// Decoded recipient, `None` while the text is not a valid address.
    pub fn recipient(&self) -> Option<&Pubkey> {
        self.recipient.as_ref()
    }

    pub fn lamports(&self) -> u64 {
        self.lamports
    }

    /// A decoded address, a positive amount and a connected signer.
    pub fn is_submittable(&self, signer_connected: bool) -> bool {
        signer_connected && self.recipient.is_some() && self.lamports > 0
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Request for the current input. The orchestrator validates it again.
    pub fn to_request(&self, sender: Pubkey, network: Network) -> TransferRequest {
        TransferRequest::new(sender, self.recipient_input.trim(), self.lamports, network)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recipient_is_decoded_on_each_change() {
        let address = Pubkey::new_unique();
        let mut form = TransferForm::new();

        form.set_recipient("4xKp");
        assert_eq!(form.recipient(), None);

        form.set_recipient(&format!(" {} ", address));
        assert_eq!(form.recipient(), Some(&address));

        form.set_recipient(&address.to_string()[..10]);
        assert_eq!(form.recipient(), None);
    }

    #[test]
    fn submittable_needs_all_three() {
        let mut form = TransferForm::new();
        form.set_recipient(&Pubkey::new_unique().to_string());
        assert!(!form.is_submittable(true));

        form.set_lamports(2_000_000);
        assert!(form.is_submittable(true));
        assert!(!form.is_submittable(false));

        form.set_recipient("not an address");
        assert!(!form.is_submittable(true));
    }

    #[test]
    fn reset_clears_input() {
        let mut form = TransferForm::new();
        form.set_recipient(&Pubkey::new_unique().to_string());
        form.set_lamports(5);
        form.reset();
        assert_eq!(form, TransferForm::default());
    }

    #[test]
    fn request_carries_form_values() {
        let sender = Pubkey::new_unique();
        let recipient = Pubkey::new_unique();
        let mut form = TransferForm::new();
        form.set_recipient(&recipient.to_string());
        form.set_lamports(42);

        let request = form.to_request(sender, Network::Mainnet);
        assert_eq!(request.sender(), &sender);
        assert_eq!(request.recipient_pubkey().unwrap(), recipient);
        assert_eq!(request.lamports(), 42);
        assert_eq!(request.network(), Network::Mainnet);
    }
}
