//! # Wallet Actions
//!
//! Application layer around the transfer pipeline in `lib-solana`: the send
//! form, network switching, screen routing, notices and the command line.

pub mod app;
pub mod cli;
pub mod form;
pub mod gate;
pub mod logging;
pub mod notify;

pub use app::WalletApp;
pub use cli::Cli;
