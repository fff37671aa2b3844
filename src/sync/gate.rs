//! Admission gate: a counting semaphore with cancellable acquire.
//!
//! The gate bounds how many operations may be in flight at once. A capacity
//! of zero disables limiting entirely: every acquire succeeds immediately and
//! the shared counter is never touched.
//!
//! # Example
//!
//! ```
//! use corral::{AdmissionGate, Cx};
//!
//! let gate = AdmissionGate::new(2);
//! let cx = Cx::background();
//!
//! let permit = gate.permit(&cx).unwrap();
//! assert_eq!(gate.outstanding(), 1);
//! drop(permit);
//! assert_eq!(gate.outstanding(), 0);
//! ```

use crate::cx::Cx;
use crate::error::Result;
use crate::sync::monitor::Monitor;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;

/// Configuration for an [`AdmissionGate`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GateConfig {
    /// Maximum concurrent holders; 0 means unlimited.
    pub capacity: usize,
}

/// Bounded admission gate.
///
/// The number of outstanding slots never exceeds [`capacity`](Self::capacity).
/// Waiters are not served in any particular order.
pub struct AdmissionGate {
    capacity: usize,
    outstanding: Arc<Monitor<usize>>,
}

impl AdmissionGate {
    /// Creates a gate admitting at most `capacity` holders (0 = unlimited).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            outstanding: Arc::new(Monitor::new(0)),
        }
    }

    /// Creates a gate from configuration.
    #[must_use]
    pub fn from_config(config: &GateConfig) -> Self {
        Self::new(config.capacity)
    }

    /// Returns the fixed capacity (0 = unlimited).
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns true if this gate never blocks.
    #[must_use]
    pub fn is_unlimited(&self) -> bool {
        self.capacity == 0
    }

    /// Returns the number of currently held slots.
    ///
    /// Always 0 for an unlimited gate.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        if self.is_unlimited() {
            return 0;
        }
        *self.outstanding.lock()
    }

    /// Takes a slot, blocking until one is free or `cx` fires.
    ///
    /// Fails with [`Error::Cancelled`](crate::Error::Cancelled) or
    /// [`Error::DeadlineExceeded`](crate::Error::DeadlineExceeded); on failure
    /// no slot is taken. A context that has already fired fails even if a slot
    /// is free.
    pub fn acquire(&self, cx: &Cx) -> Result<()> {
        if self.is_unlimited() {
            return Ok(());
        }
        let capacity = self.capacity;
        let mut held = self
            .outstanding
            .wait_while(cx, |held| *held >= capacity)?;
        *held += 1;
        Ok(())
    }

    /// Takes a slot if one is free right now.
    pub fn try_acquire(&self) -> bool {
        if self.is_unlimited() {
            return true;
        }
        let mut held = self.outstanding.lock();
        if *held >= self.capacity {
            return false;
        }
        *held += 1;
        true
    }

    /// Gives a slot back.
    ///
    /// Releasing when nothing is held is a no-op.
    pub fn release(&self) {
        if self.is_unlimited() {
            return;
        }
        let mut held = self.outstanding.lock();
        if *held == 0 {
            return;
        }
        *held -= 1;
        drop(held);
        self.outstanding.notify_one();
    }

    /// Takes a slot and returns a guard that releases it on drop.
    pub fn permit(&self, cx: &Cx) -> Result<GatePermit<'_>> {
        self.acquire(cx)?;
        Ok(GatePermit { gate: self })
    }
}

impl fmt::Debug for AdmissionGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdmissionGate")
            .field("capacity", &self.capacity)
            .field("outstanding", &self.outstanding())
            .finish()
    }
}

/// A held gate slot, released on drop.
#[must_use = "permit will be immediately released if not held"]
pub struct GatePermit<'a> {
    gate: &'a AdmissionGate,
}

impl GatePermit<'_> {
    /// Keeps the slot held without a guard; pair with a manual
    /// [`AdmissionGate::release`].
    pub fn forget(self) {
        std::mem::forget(self);
    }
}

impl Drop for GatePermit<'_> {
    fn drop(&mut self) {
        self.gate.release();
    }
}

impl fmt::Debug for GatePermit<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatePermit").finish_non_exhaustive()
    }
}
