//! Task supervision.
//!
//! - [`TaskGroup`]: spawns supervised tasks and waits for them as a group
//! - [`FaultReporter`]: where trapped task panics are reported

pub mod fault;
pub mod task_group;

pub use fault::{FaultReporter, TracingReporter};
pub use task_group::TaskGroup;
