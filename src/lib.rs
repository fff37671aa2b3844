//! Corral: small concurrency building blocks for threaded services.
//!
//! # Overview
//!
//! Corral collects the handful of primitives a request-handling service keeps
//! reinventing: a bounded admission gate, a task group that survives panicking
//! tasks, a reader/writer-locked string map, pooled byte buffers, and
//! roughly time-ordered 64-bit ids. Blocking operations take a [`Cx`] carrying
//! an optional deadline and cancel token, and give up cleanly when either
//! fires.
//!
//! # Core Guarantees
//!
//! - **Bounded admission**: an [`AdmissionGate`] never has more than `capacity`
//!   outstanding holders
//! - **Panic isolation**: a panicking task is recovered, reported once, and
//!   still counted as finished by its [`TaskGroup`]
//! - **Atomic batches**: [`ConcurrentMap::set_many`] is never observed half
//!   applied
//! - **Reuse without aliasing**: a released [`Buffer`] can no longer be used
//!   by the code that released it
//! - **Unique ids**: one process never issues the same [`Id`] twice within a
//!   time bucket (up to 4096 ids per bucket)
//!
//! # Module Structure
//!
//! - [`cx`]: Deadline and cancellation context
//! - [`sync`]: Admission gate and concurrent map
//! - [`runtime`]: Task group and fault reporting
//! - [`bytes`]: Buffer arena and buffers
//! - [`types`]: Identifiers and cancel reasons
//! - [`util`]: Clock and entropy sources
//! - [`observability`]: Log subscriber setup
//! - [`config`]: Aggregate configuration
//! - [`error`](mod@error): Error types
//!
//! # Example
//!
//! ```
//! use corral::{AdmissionGate, Cx, TaskGroup};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # fn main() -> corral::Result<()> {
//! let gate = Arc::new(AdmissionGate::new(2));
//! let group = TaskGroup::new();
//! for _ in 0..8 {
//!     let gate = Arc::clone(&gate);
//!     group.spawn(move || {
//!         let cx = Cx::background().with_timeout(Duration::from_secs(5));
//!         if let Ok(_permit) = gate.permit(&cx) {
//!             // at most two tasks run this section at once
//!         }
//!     })?;
//! }
//! group.wait();
//! assert_eq!(gate.outstanding(), 0);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::module_inception)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_possible_truncation)]

pub mod bytes;
pub mod config;
pub mod cx;
pub mod error;
pub mod observability;
pub mod runtime;
pub mod sync;
pub mod types;
pub mod util;

pub use bytes::{ArenaConfig, Buffer, BufferArena};
pub use config::Config;
pub use cx::{CancelToken, Cx};
pub use error::{Error, Result};
pub use observability::{LogConfig, LogFormat, LogLevel, init_logging};
pub use runtime::{FaultReporter, TaskGroup, TracingReporter};
pub use sync::{AdmissionGate, ConcurrentMap, GateConfig, GatePermit, MapConfig};
pub use types::{CancelKind, CancelReason, Id, IdGenerator, ParseIdError, new_id};
