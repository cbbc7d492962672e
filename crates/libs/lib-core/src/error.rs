//! # Centralized Error Handling
//!
//! This module defines the application-wide error type [`AppError`] used by the
//! configuration and session layers and by the CLI when it reports failures.
//! It follows the `thiserror` pattern for ergonomic error handling.
//!
//! Transfer outcomes use `SubmissionResult` from `lib-solana` instead.
//!
//! ## Error Categories
//!
//! 1. **Client Errors** - User/input issues
//!    - [`InvalidInput`](AppError::InvalidInput)
//!    - [`Session`](AppError::Session)
//!
//! 2. **System Errors** - Internal/environment issues
//!    - [`Config`](AppError::Config)
//!    - [`Io`](AppError::Io)
//!    - [`Internal`](AppError::Internal)
//!
//! 3. **Data Errors**
//!    - [`Encoding`](AppError::Encoding) / [`Decoding`](AppError::Decoding)
//!
//! ## Usage Example
//!
//! ```rust
//! use lib_core::error::{AppError, Result};
//!
//! fn parse_lamports(raw: &str) -> Result<u64> {
//!     raw.parse()
//!         .map_err(|_| AppError::InvalidInput(format!("'{}' is not a lamport amount", raw)))
//! }
//! ```

use thiserror::Error;

/// Convenience type alias for `Result<T, AppError>`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application-wide error type.
///
/// Each variant includes a descriptive `String` for context. The `#[error]` attribute
/// from `thiserror` provides automatic `Display` implementation.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration error during startup or environment loading.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Session marker missing, malformed or unreadable.
    #[error("Session error: {0}")]
    Session(String),

    /// Data encoding error (base64, JSON serialization).
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Data decoding error (base64, JSON deserialization).
    #[error("Decoding error: {0}")]
    Decoding(String),

    /// Invalid user input validation error.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Filesystem error while reading or writing local state.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error (unexpected failures).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Short machine-readable name of the variant.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "Config",
            AppError::Session(_) => "Session",
            AppError::Encoding(_) => "Encoding",
            AppError::Decoding(_) => "Decoding",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::Io(_) => "Io",
            AppError::Internal(_) => "Internal",
        }
    }

    /// Get a user-friendly error message.
    ///
    /// For internal errors, returns a generic message to avoid exposing implementation details.
    pub fn user_message(&self) -> String {
        match self {
            AppError::InvalidInput(msg) | AppError::Session(msg) | AppError::Config(msg) => msg.clone(),
            AppError::Io(_) | AppError::Internal(_) | AppError::Encoding(_) | AppError::Decoding(_) => {
                "An internal error occurred".to_string()
            }
        }
    }
}

/// Convert `anyhow::Error` to `AppError`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Convert `serde_json::Error` to `AppError`.
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Decoding(format!("JSON error: {}", err))
    }
}
