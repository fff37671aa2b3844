//! Shared cancellation flag with wake-up listeners.

use crate::types::CancelReason;
use parking_lot::Mutex;
use slab::Slab;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

type Listener = Box<dyn FnOnce() + Send>;

/// A cloneable handle that cancels every [`Cx`](super::Cx) it is attached to.
///
/// Cancellation is one-way. Repeated cancels only strengthen the recorded
/// reason (see [`CancelReason::strengthen`]).
#[derive(Clone)]
pub struct CancelToken {
    inner: Arc<TokenInner>,
}

struct TokenInner {
    cancelled: AtomicBool,
    state: Mutex<TokenState>,
}

#[derive(Default)]
struct TokenState {
    reason: Option<CancelReason>,
    listeners: Slab<Listener>,
    // Keeps the link to a parent token alive for as long as this one lives.
    parent: Option<CancelRegistration>,
}

impl CancelToken {
    /// Creates a token that has not been cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(TokenInner {
                cancelled: AtomicBool::new(false),
                state: Mutex::new(TokenState::default()),
            }),
        }
    }

    /// Creates a token that is cancelled whenever `self` is.
    ///
    /// Cancelling the child does not affect the parent.
    #[must_use]
    pub fn child(&self) -> Self {
        let child = Self::new();
        let weak: Weak<TokenInner> = Arc::downgrade(&child.inner);
        let registration = self.on_cancel(move || {
            if let Some(inner) = weak.upgrade() {
                Self { inner }.cancel(CancelReason::parent_cancelled());
            }
        });
        match registration {
            Some(registration) => child.inner.state.lock().parent = Some(registration),
            None => {
                child.cancel(CancelReason::parent_cancelled());
            }
        }
        child
    }

    /// Cancels the token and wakes every registered listener.
    ///
    /// Returns `true` if this call performed the cancellation, `false` if the
    /// token was already cancelled.
    pub fn cancel(&self, reason: CancelReason) -> bool {
        let listeners = {
            let mut state = self.inner.state.lock();
            if let Some(existing) = state.reason.as_mut() {
                existing.strengthen(&reason);
                return false;
            }
            state.reason = Some(reason);
            self.inner.cancelled.store(true, Ordering::Release);
            std::mem::take(&mut state.listeners)
        };
        // Listeners run outside the lock so they may take their own locks.
        for (_, listener) in listeners {
            listener();
        }
        true
    }

    /// Returns true once the token has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Returns the cancellation reason, or `None` if not cancelled.
    #[must_use]
    pub fn reason(&self) -> Option<CancelReason> {
        if !self.is_cancelled() {
            return None;
        }
        self.inner.state.lock().reason.clone()
    }

    /// Registers `listener` to run once when the token is cancelled.
    ///
    /// Returns `None` without running the listener if the token is already
    /// cancelled; callers re-check [`is_cancelled`](Self::is_cancelled) under
    /// their own lock instead. Dropping the registration unregisters it.
    #[must_use = "dropping the registration unregisters the listener"]
    pub fn on_cancel<F>(&self, listener: F) -> Option<CancelRegistration>
    where
        F: FnOnce() + Send + 'static,
    {
        let mut state = self.inner.state.lock();
        if state.reason.is_some() {
            return None;
        }
        let key = state.listeners.insert(Box::new(listener));
        Some(CancelRegistration {
            token: Arc::downgrade(&self.inner),
            key,
        })
    }

    #[cfg(test)]
    fn listener_count(&self) -> usize {
        self.inner.state.lock().listeners.len()
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish_non_exhaustive()
    }
}

/// Handle for a listener registered with [`CancelToken::on_cancel`].
pub struct CancelRegistration {
    token: Weak<TokenInner>,
    key: usize,
}

impl Drop for CancelRegistration {
    fn drop(&mut self) {
        if let Some(inner) = self.token.upgrade() {
            // After cancellation the slab is empty, so a stale key is a no-op.
            let _ = inner.state.lock().listeners.try_remove(self.key);
        }
    }
}

impl fmt::Debug for CancelRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelRegistration")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}
