//! Why a blocking call gave up.

use core::fmt;

/// What fired a caller's context.
///
/// Variants are declared from least to most severe; the derived ordering is
/// the severity ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CancelKind {
    /// Someone called [`CancelToken::cancel`](crate::CancelToken::cancel).
    User,
    /// The caller's deadline passed.
    Timeout,
    /// A parent token was cancelled.
    ParentCancelled,
    /// The process is going down.
    Shutdown,
}

impl CancelKind {
    /// Rank used when two cancellations race; larger wins.
    #[must_use]
    pub const fn severity(self) -> u8 {
        self as u8
    }

    /// Short lowercase name used in messages and log fields.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Timeout => "timeout",
            Self::ParentCancelled => "parent cancelled",
            Self::Shutdown => "shutdown",
        }
    }
}

impl fmt::Display for CancelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A [`CancelKind`] plus an optional static note from whoever cancelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelReason {
    /// What fired.
    pub kind: CancelKind,
    /// Free-form note, e.g. `"client disconnected"`.
    pub message: Option<&'static str>,
}

impl CancelReason {
    /// A reason of `kind` with no note.
    #[must_use]
    pub const fn new(kind: CancelKind) -> Self {
        Self {
            kind,
            message: None,
        }
    }

    /// An explicit cancellation with a note.
    #[must_use]
    pub const fn user(message: &'static str) -> Self {
        Self {
            kind: CancelKind::User,
            message: Some(message),
        }
    }

    /// Deadline expiry.
    #[must_use]
    pub const fn timeout() -> Self {
        Self::new(CancelKind::Timeout)
    }

    /// Propagated from a parent token.
    #[must_use]
    pub const fn parent_cancelled() -> Self {
        Self::new(CancelKind::ParentCancelled)
    }

    /// Process shutdown.
    #[must_use]
    pub const fn shutdown() -> Self {
        Self::new(CancelKind::Shutdown)
    }

    /// Merges a later cancellation into this one.
    ///
    /// The more severe kind wins. Between equal kinds a note beats no note,
    /// and of two notes the smaller string is kept, so the outcome is the same
    /// whichever canceller got there first. Returns `true` if `self` changed.
    pub fn strengthen(&mut self, other: &Self) -> bool {
        let replace = match other.kind.cmp(&self.kind) {
            core::cmp::Ordering::Greater => true,
            core::cmp::Ordering::Less => false,
            core::cmp::Ordering::Equal => match (self.message, other.message) {
                (None, Some(_)) => true,
                (Some(ours), Some(theirs)) => theirs < ours,
                (_, None) => false,
            },
        };
        if replace {
            *self = other.clone();
        }
        replace
    }

    /// True for [`CancelKind::Shutdown`].
    #[must_use]
    pub const fn is_shutdown(&self) -> bool {
        matches!(self.kind, CancelKind::Shutdown)
    }

    /// Returns [`kind`](Self::kind).
    #[must_use]
    pub const fn kind(&self) -> CancelKind {
        self.kind
    }
}

impl Default for CancelReason {
    fn default() -> Self {
        Self::new(CancelKind::User)
    }
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message {
            Some(note) => write!(f, "{}: {note}", self.kind),
            None => fmt::Display::fmt(&self.kind, f),
        }
    }
}
