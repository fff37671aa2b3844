//! Mutex + condvar pair with context-aware waiting.

use crate::cx::Cx;
use crate::error::Result;
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::sync::Arc;

/// State guarded by a mutex, plus the condvar its waiters park on.
///
/// Waiters registered through [`wait_while`](Self::wait_while) are woken by
/// explicit notifications *and* by cancellation of the waiter's context.
#[derive(Debug)]
pub(crate) struct Monitor<T> {
    state: Mutex<T>,
    cond: Condvar,
}

impl<T: Send + 'static> Monitor<T> {
    pub(crate) fn new(state: T) -> Self {
        Self {
            state: Mutex::new(state),
            cond: Condvar::new(),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, T> {
        self.state.lock()
    }

    pub(crate) fn notify_one(&self) {
        self.cond.notify_one();
    }

    pub(crate) fn notify_all(&self) {
        self.cond.notify_all();
    }

    /// Blocks while `blocked` holds, or until `cx` fires.
    ///
    /// On success the guard is returned with `blocked` false, so the caller
    /// can act on the state without releasing the lock. On failure the state
    /// is untouched.
    pub(crate) fn wait_while<F>(
        self: &Arc<Self>,
        cx: &Cx,
        mut blocked: F,
    ) -> Result<MutexGuard<'_, T>>
    where
        F: FnMut(&mut T) -> bool,
    {
        // The listener takes the state lock before notifying, so a waiter that
        // saw the token live under the lock is already parked when it fires.
        let _registration = cx.cancel_token().and_then(|token| {
            let monitor = Arc::downgrade(self);
            token.on_cancel(move || {
                if let Some(monitor) = monitor.upgrade() {
                    let _state = monitor.state.lock();
                    monitor.cond.notify_all();
                }
            })
        });

        let mut state = self.state.lock();
        loop {
            if let Err(err) = cx.checkpoint() {
                // A notify_one aimed at us must not be lost to other waiters.
                if !blocked(&mut state) {
                    self.cond.notify_one();
                }
                return Err(err);
            }
            if !blocked(&mut state) {
                return Ok(state);
            }
            match cx.deadline() {
                Some(deadline) => {
                    self.cond.wait_until(&mut state, deadline);
                }
                None => self.cond.wait(&mut state),
            }
        }
    }
}
