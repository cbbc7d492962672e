//! # Application Configuration
//!
//! This module manages application configuration loaded from environment variables
//! (and an optional `.env` file). All configuration is validated on startup to fail
//! fast if misconfigured.
//!
//! ## Variables
//!
//! | Variable                | Default                                   |
//! |-------------------------|-------------------------------------------|
//! | `WALLET_NETWORK`        | `devnet`                                  |
//! | `HELIUS_API_KEY`        | unset                                     |
//! | `DEVNET_RPC_URL`        | unset (public devnet endpoint)            |
//! | `MAINNET_RPC_URL`       | unset (Helius or public mainnet endpoint) |
//! | `KEYPAIR_PATH`          | unset                                     |
//! | `REMOTE_SIGNER_URL`     | unset                                     |
//! | `SESSION_FILE`          | `.wallet-actions/session`                 |
//! | `WALLET_LOG_DIR`        | `logs`                                    |
//! | `RUST_LOG`              | `wallet_actions=info,lib_solana=info,warn`|
//! | `CONFIRM_MAX_ATTEMPTS`  | `30`                                      |
//! | `BROADCAST_MAX_RETRIES` | `3`                                       |
//!
//! ## Global Config Access
//!
//! Use [`core_config()`] to access the global configuration instance:
//!
//! ```rust,no_run
//! use lib_core::config::{core_config, init_config};
//!
//! init_config().unwrap();
//! let config = core_config();
//! println!("network: {}", config.network);
//! ```

use lib_utils::envs::{get_env_opt, get_env_parse_or};
use lib_utils::validation::{validate_not_empty, validate_range};
use std::path::PathBuf;
use std::sync::OnceLock;

/// Application configuration loaded from environment variables.
#[derive(Clone, Debug)]
pub struct Config {
    /// Network selected at startup (`devnet` or `mainnet`).
    pub network: String,

    /// Helius API key, used for the mainnet endpoint when no custom URL is set.
    pub helius_api_key: Option<String>,

    /// Custom devnet RPC endpoint.
    pub devnet_rpc_url: Option<String>,

    /// Custom mainnet RPC endpoint.
    pub mainnet_rpc_url: Option<String>,

    /// Default Solana CLI keypair file for the local wallet backend.
    pub keypair_path: Option<PathBuf>,

    /// Default base URL of the remote signer backend.
    pub remote_signer_url: Option<String>,

    /// File holding the session token.
    pub session_file: PathBuf,

    /// Directory for rotated log files.
    pub log_dir: PathBuf,

    /// Fallback log filter when `RUST_LOG` is not set.
    pub log_level: String,

    /// Ceiling on confirmation status polls per transfer.
    ///
    /// Valid range: 1-100
    pub confirm_max_attempts: u32,

    /// Retries the RPC node performs when forwarding a broadcast transaction.
    ///
    /// Valid range: 0-10
    pub broadcast_max_retries: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: "devnet".to_string(),
            helius_api_key: None,
            devnet_rpc_url: None,
            mainnet_rpc_url: None,
            keypair_path: None,
            remote_signer_url: None,
            session_file: PathBuf::from(".wallet-actions/session"),
            log_dir: PathBuf::from("logs"),
            log_level: "wallet_actions=info,lib_solana=info,warn".to_string(),
            confirm_max_attempts: 30,
            broadcast_max_retries: 3,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is loaded first if present.
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let confirm_max_attempts = get_env_parse_or("CONFIRM_MAX_ATTEMPTS", defaults.confirm_max_attempts)
            .map_err(|e| format!("CONFIRM_MAX_ATTEMPTS must be a valid number: {}", e))?;

        let broadcast_max_retries = get_env_parse_or("BROADCAST_MAX_RETRIES", defaults.broadcast_max_retries)
            .map_err(|e| format!("BROADCAST_MAX_RETRIES must be a valid number: {}", e))?;

        Ok(Self {
            network: get_env_opt("WALLET_NETWORK").unwrap_or(defaults.network),
            helius_api_key: get_env_opt("HELIUS_API_KEY"),
            devnet_rpc_url: get_env_opt("DEVNET_RPC_URL"),
            mainnet_rpc_url: get_env_opt("MAINNET_RPC_URL"),
            keypair_path: get_env_opt("KEYPAIR_PATH").map(PathBuf::from),
            remote_signer_url: get_env_opt("REMOTE_SIGNER_URL"),
            session_file: get_env_opt("SESSION_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.session_file),
            log_dir: get_env_opt("WALLET_LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_dir),
            log_level: get_env_opt("RUST_LOG").unwrap_or(defaults.log_level),
            confirm_max_attempts,
            broadcast_max_retries,
        })
    }

    /// Validate configuration values against operational limits.
    pub fn validate(&self) -> Result<(), String> {
        validate_not_empty(&self.network, "WALLET_NETWORK")?;
        validate_range(self.confirm_max_attempts, 1, 100, "CONFIRM_MAX_ATTEMPTS")?;
        validate_range(self.broadcast_max_retries, 0, 10, "BROADCAST_MAX_RETRIES")?;

        for (name, url) in [
            ("DEVNET_RPC_URL", &self.devnet_rpc_url),
            ("MAINNET_RPC_URL", &self.mainnet_rpc_url),
            ("REMOTE_SIGNER_URL", &self.remote_signer_url),
        ] {
            if let Some(url) = url {
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(format!("{} must be an http(s) URL", name));
                }
            }
        }

        Ok(())
    }
}

/// Global configuration instance (initialized once at startup).
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Initialize the global configuration.
///
/// # Errors
///
/// Returns an error if:
/// - Environment variables are invalid
/// - Configuration validation fails
/// - Config has already been initialized
pub fn init_config() -> Result<(), String> {
    let config = Config::from_env()?;
    config.validate()?;

    CONFIG
        .set(config)
        .map_err(|_| "Config has already been initialized".to_string())
}

/// Get a reference to the global configuration.
///
/// # Panics
///
/// Panics if [`init_config()`] has not been called yet.
pub fn core_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Config must be initialized with init_config() before use")
}
