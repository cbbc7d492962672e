//! # Command Line Interface
//!
//! ```text
//! wallet-actions signup --username alice
//! wallet-actions balance
//! wallet-actions --network devnet send --to <ADDRESS> --lamports 2000000
//! wallet-actions --wallet remote --signer-url http://127.0.0.1:8899 send ...
//! wallet-actions logout
//! ```

use crate::app::{rpc_ledger_factory, WalletApp};
use crate::gate::{self, GateDecision, Screen};
use crate::notify::Notifier;
use clap::{Args, Parser, Subcommand, ValueEnum};
use lib_core::{Config, Session, SessionStore};
use lib_solana::client::Network;
use lib_solana::transfer::{SubmissionResult, TransferOrchestrator, TransferUpdate};
use lib_solana::wallet::{KeypairWallet, RemoteWallet, SigningProvider, WalletError};
use lib_utils::format_time;
use solana_sdk::pubkey::Pubkey;
use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

#[derive(Parser, Debug)]
#[command(name = "wallet-actions")]
#[command(version, about = "Send SOL from a connected wallet and follow it to confirmation")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Network to use: devnet or mainnet [default: WALLET_NETWORK or devnet]
    #[arg(long, global = true, value_parser = Network::from_str)]
    pub network: Option<Network>,

    #[command(flatten)]
    pub wallet: WalletArgs,
}

#[derive(Args, Debug, Clone)]
pub struct WalletArgs {
    /// Signing backend
    #[arg(long = "wallet", global = true, value_enum, default_value_t = WalletKind::Keypair)]
    pub kind: WalletKind,

    /// Solana CLI keypair file [default: KEYPAIR_PATH]
    #[arg(long, global = true)]
    pub keypair: Option<PathBuf>,

    /// Remote signer base URL [default: REMOTE_SIGNER_URL]
    #[arg(long, global = true)]
    pub signer_url: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletKind {
    /// Local keypair file
    Keypair,
    /// External HTTP signer
    Remote,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the local session
    Signup {
        #[arg(long)]
        username: String,
    },

    /// Remove the local session
    Logout,

    /// Show the local session
    Whoami,

    /// Show the SOL balance of an address or of the connected wallet
    Balance {
        #[arg(long)]
        address: Option<String>,
    },

    /// Send SOL to an address
    Send {
        /// Recipient address
        #[arg(long)]
        to: String,

        /// Amount in lamports
        #[arg(long)]
        lamports: u64,
    },
}

impl Command {
    pub fn screen(&self) -> Screen {
        match self {
            Command::Signup { .. } => Screen::Signup,
            _ => Screen::Home,
        }
    }
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Not signed up. Run `wallet-actions signup --username <name>` first")]
    SignupRequired,

    #[error("Already signed up. Run `wallet-actions logout` to start over")]
    AlreadySignedUp,

    #[error("No keypair file. Pass --keypair or set KEYPAIR_PATH")]
    MissingKeypair,

    #[error("No remote signer. Pass --signer-url or set REMOTE_SIGNER_URL")]
    MissingSignerUrl,

    #[error("Invalid address '{0}'")]
    InvalidAddress(String),

    #[error(transparent)]
    Wallet(#[from] WalletError),

    /// The outcome notice has already been printed.
    #[error("Transfer did not complete")]
    TransferFailed,
}

/// True when the user has already seen this error as a transfer notice.
pub fn already_reported(err: &anyhow::Error) -> bool {
    matches!(err.downcast_ref::<CliError>(), Some(CliError::TransferFailed))
}

/// `12.5 SOL`-style rendering without going through floats.
pub fn format_sol(lamports: u64) -> String {
    let whole = lamports / LAMPORTS_PER_SOL;
    let fraction = lamports % LAMPORTS_PER_SOL;
    if fraction == 0 {
        return format!("{} SOL", whole);
    }
    let digits = format!("{:09}", fraction);
    format!("{}.{} SOL", whole, digits.trim_end_matches('0'))
}

/// Build the signing provider selected on the command line.
pub fn build_signer(args: &WalletArgs, config: &Config) -> Result<Box<dyn SigningProvider>, CliError> {
    match args.kind {
        WalletKind::Keypair => {
            let path = args
                .keypair
                .clone()
                .or_else(|| config.keypair_path.clone())
                .ok_or(CliError::MissingKeypair)?;
            Ok(Box::new(KeypairWallet::from_file(path)))
        }
        WalletKind::Remote => {
            let url = args
                .signer_url
                .clone()
                .or_else(|| config.remote_signer_url.clone())
                .ok_or(CliError::MissingSignerUrl)?;
            Ok(Box::new(RemoteWallet::new(url)?))
        }
    }
}

pub async fn run(cli: Cli, config: &Config) -> anyhow::Result<()> {
    let store = SessionStore::new(&config.session_file);
    let session = store.load()?;

    if let GateDecision::Redirect(target) = gate::route(cli.command.screen(), session.as_ref()) {
        debug!(to = %target, "Redirected");
        return Err(match target {
            Screen::Signup => CliError::SignupRequired,
            Screen::Home => CliError::AlreadySignedUp,
        }
        .into());
    }

    let network = match cli.network {
        Some(network) => network,
        None => Network::from_str(&config.network).map_err(anyhow::Error::msg)?,
    };

    match cli.command {
        Command::Signup { username } => {
            let session = Session::new(&username)?;
            store.save(&session)?;
            info!(user_id = %session.user_id, "Signed up");
            println!("Signed up as {}", session.username);
        }
        Command::Logout => {
            store.clear()?;
            println!("Signed out");
        }
        Command::Whoami => {
            if let Some(session) = &session {
                println!("{} ({})", session.username, session.user_id);
                println!("Signed up at {}", format_time(session.created_at));
            }
        }
        Command::Balance { address } => {
            let address = address
                .map(|a| Pubkey::from_str(a.trim()).map_err(|_| CliError::InvalidAddress(a)))
                .transpose()?;
            balance(network, address, &cli.wallet, config).await?;
        }
        Command::Send { to, lamports } => {
            send(network, &to, lamports, &cli.wallet, config).await?;
        }
    }
    Ok(())
}

async fn balance(
    network: Network,
    address: Option<Pubkey>,
    wallet: &WalletArgs,
    config: &Config,
) -> anyhow::Result<()> {
    let orchestrator = Arc::new(TransferOrchestrator::from_config(config));
    let mut app = WalletApp::new(network, rpc_ledger_factory(config), orchestrator);

    let address = match address {
        Some(address) => address,
        None => app.connect(build_signer(wallet, config)?).await?,
    };
    let lamports = app.balance(Some(address)).await?;
    println!("{} on {}: {} ({} lamports)", address, network.label(), format_sol(lamports), lamports);
    Ok(())
}

async fn send(
    network: Network,
    to: &str,
    lamports: u64,
    wallet: &WalletArgs,
    config: &Config,
) -> anyhow::Result<()> {
    let (updates, rx) = mpsc::unbounded_channel();
    let orchestrator = Arc::new(TransferOrchestrator::from_config(config).with_updates(updates));
    let mut app = WalletApp::new(network, rpc_ledger_factory(config), orchestrator);

    let sender = app.connect(build_signer(wallet, config)?).await?;
    app.form_mut().set_recipient(to);
    app.form_mut().set_lamports(lamports);
    if network == Network::Mainnet {
        warn!("Sending on mainnet, this moves real funds");
    }
    println!(
        "Sending {} from {} to {} on {}",
        format_sol(lamports),
        sender,
        to,
        network.label()
    );

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let reported = send_and_report(app, rx, &cancel, std::io::stdout()).await;
    interrupt.abort();
    let (result, _) = reported?;

    match result {
        SubmissionResult::Failed(_) => Err(CliError::TransferFailed.into()),
        _ => Ok(()),
    }
}

/// Run the send and write one line per notice to `out`.
///
/// Returns once the outcome is known and every notice has been written.
pub async fn send_and_report<W>(
    mut app: WalletApp,
    mut updates: UnboundedReceiver<TransferUpdate>,
    cancel: &CancellationToken,
    mut out: W,
) -> anyhow::Result<(SubmissionResult, W)>
where
    W: Write + Send + 'static,
{
    let network = app.network();
    let printer = tokio::spawn(async move {
        let mut notifier = Notifier::new(network);
        while let Some(update) = updates.recv().await {
            if let Some(notice) = notifier.observe(&update) {
                writeln!(out, "{}", notice)?;
            }
        }
        out.flush()?;
        Ok::<W, std::io::Error>(out)
    });

    let result = app.send(cancel).await;
    // Closes the update channel so the printer drains and exits.
    drop(app);
    let out = printer.await??;
    Ok((result, out))
}
