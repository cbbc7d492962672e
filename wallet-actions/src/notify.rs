//! # Notifications
//!
//! Turns transfer progress into user-facing notices. A submission produces at
//! most two: one "submitted, confirming" notice after broadcast and one for the
//! terminal outcome. Individual polls stay silent.

use lib_solana::client::Network;
use lib_solana::transfer::{SubmissionResult, TransferError, TransferUpdate};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    /// Explorer link for the transaction, when one was broadcast.
    pub link: Option<String>,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.level {
            NoticeLevel::Info => "info",
            NoticeLevel::Success => "success",
            NoticeLevel::Warning => "warning",
            NoticeLevel::Error => "error",
        };
        write!(f, "[{}] {}", tag, self.message)?;
        if let Some(link) = &self.link {
            write!(f, "\n  {}", link)?;
        }
        Ok(())
    }
}

/// Notification manager for one submission.
pub struct Notifier {
    network: Network,
    announced: bool,
    finished: bool,
}

impl Notifier {
    pub fn new(network: Network) -> Self {
        Self {
            network,
            announced: false,
            finished: false,
        }
    }

    /// Notice for `update`, if it deserves one.
    pub fn observe(&mut self, update: &TransferUpdate) -> Option<Notice> {
        let TransferUpdate::Outcome(result) = update else {
            return None;
        };

        match result {
            SubmissionResult::Pending(signature) if !self.announced && !self.finished => {
                self.announced = true;
                Some(Notice {
                    level: NoticeLevel::Info,
                    message: "Transaction submitted, confirming...".to_string(),
                    link: Some(self.network.explorer_url(signature)),
                })
            }
            SubmissionResult::Pending(_) => None,
            _ if self.finished => None,
            SubmissionResult::Confirmed(signature) => {
                self.finished = true;
                Some(Notice {
                    level: NoticeLevel::Success,
                    message: format!("Transfer confirmed: {}", signature),
                    link: Some(self.network.explorer_url(signature)),
                })
            }
            SubmissionResult::Failed(err) => {
                self.finished = true;
                Some(self.failure(err))
            }
        }
    }

    fn failure(&self, err: &TransferError) -> Notice {
        let level = if err.is_outcome_unknown() {
            NoticeLevel::Warning
        } else {
            NoticeLevel::Error
        };
        let message = if err.is_outcome_unknown() {
            format!("{}. Check the explorer before retrying.", err)
        } else {
            format!("Transfer failed: {}", err)
        };
        Notice {
            level,
            message,
            link: err.signature().map(|sig| self.network.explorer_url(sig)),
        }
    }
}
