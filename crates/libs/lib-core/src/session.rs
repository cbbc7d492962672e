//! # Session Marker
//!
//! A placeholder identity for the local user: a generated id, a display name and a
//! creation timestamp, serialised as camelCase JSON and wrapped in standard base64.
//!
//! This is **not** an authentication mechanism. Anyone who can write the session
//! file can impersonate any name; the marker only decides which screen the CLI
//! shows. It is passed explicitly to whatever needs it instead of being read from
//! ambient storage.
//!
//! ```rust
//! use lib_core::session::Session;
//!
//! let session = Session::new("alice").unwrap();
//! let token = session.to_token().unwrap();
//! assert_eq!(Session::from_token(&token).unwrap(), session);
//! ```

use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use lib_utils::{b64_decode_to_string, b64_encode, now_utc, validate_not_empty};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Local session marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_id: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Create a fresh session for `username` (trimmed, must not be blank).
    pub fn new(username: &str) -> Result<Self> {
        validate_not_empty(username, "username").map_err(AppError::InvalidInput)?;

        Ok(Self {
            user_id: uuid::Uuid::new_v4().to_string(),
            username: username.trim().to_string(),
            created_at: now_utc(),
        })
    }

    /// Encode as base64(JSON).
    pub fn to_token(&self) -> Result<String> {
        let json = serde_json::to_string(self)
            .map_err(|e| AppError::Encoding(format!("session JSON: {}", e)))?;
        Ok(b64_encode(json))
    }

    /// Decode a token produced by [`Session::to_token`].
    pub fn from_token(token: &str) -> Result<Self> {
        let json = b64_decode_to_string(token)
            .map_err(|_| AppError::Session("session token is not valid base64".to_string()))?;
        let session: Session = serde_json::from_str(&json)?;
        validate_not_empty(&session.username, "username").map_err(AppError::Session)?;
        Ok(session)
    }
}

/// File-backed storage for a single session token.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored session, `None` if no token has been saved.
    pub fn load(&self) -> Result<Option<Session>> {
        let token = match fs::read_to_string(&self.path) {
            Ok(token) => token,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if token.trim().is_empty() {
            return Ok(None);
        }
        Session::from_token(token.trim()).map(Some)
    }

    /// Overwrite the stored token.
    pub fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, session.to_token()?)?;
        debug!(path = %self.path.display(), "session saved");
        Ok(())
    }

    /// Remove the stored token. Clearing an absent session is not an error.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
