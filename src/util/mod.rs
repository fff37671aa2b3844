//! Clock and entropy sources.
//!
//! Both are injected into the id generator so tests can pin them.

pub mod clock;
pub mod entropy;

pub use clock::{Clock, ManualClock, SystemClock};
pub use entropy::{EntropySource, FixedEntropy, OsEntropy};
