//! Core value types.
//!
//! - [`cancel`]: why a wait was abandoned
//! - [`id`]: snowflake-style identifiers and their generator

pub mod cancel;
pub mod id;

pub use cancel::{CancelKind, CancelReason};
pub use id::{Id, IdGenerator, ParseIdError, new_id};
