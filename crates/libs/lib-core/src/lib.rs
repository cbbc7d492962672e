//! # Core Library
//!
//! Configuration, the shared error type, and the injected session marker.

pub mod config;
pub mod error;
pub mod session;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, Result};
pub use session::{Session, SessionStore};
