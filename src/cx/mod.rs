//! Cancellation context for blocking calls.
//!
//! A [`Cx`] bundles everything a blocking call needs to know about *when to
//! give up*: an optional deadline and an optional [`CancelToken`]. It also
//! carries the diagnostic labels (`scope`, `log_id`) that task fault reports
//! are attributed to.
//!
//! # Example
//!
//! ```
//! use corral::{AdmissionGate, CancelToken, Cx};
//! use std::time::Duration;
//!
//! let gate = AdmissionGate::new(1);
//! let token = CancelToken::new();
//! let cx = Cx::background()
//!     .with_timeout(Duration::from_millis(50))
//!     .with_cancel_token(token.clone());
//!
//! gate.acquire(&cx).unwrap();
//! // The only slot is held, so a second acquire gives up at the deadline.
//! assert!(gate.acquire(&cx).unwrap_err().is_cancelled_or_timed_out());
//! gate.release();
//! ```

mod token;

pub use token::{CancelRegistration, CancelToken};

use crate::error::{Error, Result};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Deadline, cancellation and diagnostic labels for one logical operation.
///
/// `Cx` is cheap to clone; clones share the same cancel token.
#[derive(Clone, Default)]
pub struct Cx {
    deadline: Option<Instant>,
    token: Option<CancelToken>,
    scope: Option<Arc<str>>,
    log_id: Option<Arc<str>>,
}

impl Cx {
    /// A context that never cancels and never expires.
    #[must_use]
    pub fn background() -> Self {
        Self::default()
    }

    /// Sets the deadline, keeping the earlier one if a deadline is already set.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    /// Sets the deadline to `timeout` from now.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        // An overflowing deadline is as good as none.
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    /// Attaches a cancel token, replacing any previous one.
    #[must_use]
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.token = Some(token);
        self
    }

    /// Labels the logical scope the work belongs to.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<Arc<str>>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Labels the request or trace id the work belongs to.
    #[must_use]
    pub fn with_log_id(mut self, log_id: impl Into<Arc<str>>) -> Self {
        self.log_id = Some(log_id.into());
        self
    }

    /// Returns the deadline, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns the cancel token, if any.
    #[must_use]
    pub fn cancel_token(&self) -> Option<&CancelToken> {
        self.token.as_ref()
    }

    /// Returns the scope label, if any.
    #[must_use]
    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    /// Returns the log id label, if any.
    #[must_use]
    pub fn log_id(&self) -> Option<&str> {
        self.log_id.as_deref()
    }

    /// Returns true if the token has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.as_ref().is_some_and(CancelToken::is_cancelled)
    }

    /// Returns true if the deadline has passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Fails if the context has fired.
    ///
    /// Explicit cancellation is reported ahead of deadline expiry.
    pub fn checkpoint(&self) -> Result<()> {
        if let Some(reason) = self.token.as_ref().and_then(CancelToken::reason) {
            return Err(Error::Cancelled(reason));
        }
        if self.is_expired() {
            return Err(Error::DeadlineExceeded);
        }
        Ok(())
    }
}

impl fmt::Debug for Cx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cx")
            .field("deadline", &self.deadline)
            .field("cancelled", &self.is_cancelled())
            .field("scope", &self.scope)
            .field("log_id", &self.log_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CancelKind, CancelReason};

    #[test]
    fn background_never_fires() {
        let cx = Cx::background();
        assert!(cx.checkpoint().is_ok());
        assert!(!cx.is_cancelled());
        assert!(!cx.is_expired());
        assert!(cx.deadline().is_none());
    }

    #[test]
    fn expired_deadline_reports_deadline_exceeded() {
        let cx = Cx::background().with_deadline(Instant::now());
        assert_eq!(cx.checkpoint(), Err(Error::DeadlineExceeded));
    }

    #[test]
    fn earlier_deadline_wins() {
        let now = Instant::now();
        let early = now + Duration::from_secs(1);
        let late = now + Duration::from_secs(10);
        let cx = Cx::background().with_deadline(late).with_deadline(early);
        assert_eq!(cx.deadline(), Some(early));
        let cx = Cx::background().with_deadline(early).with_deadline(late);
        assert_eq!(cx.deadline(), Some(early));
    }

    #[test]
    fn cancellation_is_reported_before_expiry() {
        let token = CancelToken::new();
        let cx = Cx::background()
            .with_deadline(Instant::now())
            .with_cancel_token(token.clone());
        token.cancel(CancelReason::shutdown());
        match cx.checkpoint() {
            Err(Error::Cancelled(reason)) => assert_eq!(reason.kind, CancelKind::Shutdown),
            other => panic!("expected cancellation, got {other:?}"),
        }
    }

    #[test]
    fn labels_are_carried_by_clones() {
        let cx = Cx::background().with_scope("billing").with_log_id("req-7");
        let cloned = cx.clone();
        assert_eq!(cloned.scope(), Some("billing"));
        assert_eq!(cloned.log_id(), Some("req-7"));
    }
}
