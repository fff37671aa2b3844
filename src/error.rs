//! Error types.
//!
//! The blocking primitives fail only because the caller's context fired
//! first. Spawning fails when the OS refuses a thread. Configuration and
//! logging setup can fail at start-up.

use crate::types::CancelReason;

/// Errors returned by `corral` operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The caller's cancel token fired before the awaited condition held.
    #[error("cancelled: {0}")]
    Cancelled(CancelReason),
    /// The caller's deadline passed before the awaited condition held.
    #[error("deadline exceeded")]
    DeadlineExceeded,
    /// The OS refused to start a thread for a task.
    #[error("task could not be started: {0}")]
    Spawn(String),
    /// A configuration source could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// The global log subscriber could not be installed.
    #[error("logging setup failed: {0}")]
    Logging(String),
}

impl Error {
    /// Returns true for the two "gave up waiting" variants.
    ///
    /// Callers usually treat these as ordinary control flow.
    #[must_use]
    pub const fn is_cancelled_or_timed_out(&self) -> bool {
        matches!(self, Self::Cancelled(_) | Self::DeadlineExceeded)
    }

    /// Returns the cancel reason, with deadline expiry reported as a timeout.
    #[must_use]
    pub fn cancel_reason(&self) -> Option<CancelReason> {
        match self {
            Self::Cancelled(reason) => Some(reason.clone()),
            Self::DeadlineExceeded => Some(CancelReason::timeout()),
            Self::Spawn(_) | Self::Config(_) | Self::Logging(_) => None,
        }
    }
}

/// Result alias for `corral` operations.
pub type Result<T> = std::result::Result<T, Error>;
