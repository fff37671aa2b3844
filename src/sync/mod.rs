//! Synchronization primitives.
//!
//! - [`AdmissionGate`]: counting semaphore with cancellable acquire
//! - [`ConcurrentMap`]: string-keyed map tuned for write-heavy access

pub mod gate;
pub mod map;
pub(crate) mod monitor;

pub use gate::{AdmissionGate, GateConfig, GatePermit};
pub use map::{ConcurrentMap, DEFAULT_MAP_CAPACITY, MapConfig};
