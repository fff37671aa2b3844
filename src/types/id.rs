//! Snowflake-style 64-bit identifiers.
//!
//! An [`Id`] packs three fields, most significant first:
//!
//! ```text
//!  63                          22 21          12 11           0
//! +------------------------------+--------------+--------------+
//! |   time bucket (ns delta)     | process tag  |   sequence   |
//! +------------------------------+--------------+--------------+
//! ```
//!
//! - the nanosecond delta from [`EPOCH_SEED_NANOS`] with its low 22 bits
//!   cleared, giving buckets of about 4.2 ms;
//! - the low 10 bits of the OS process id;
//! - a 12-bit rolling counter shared by the whole process.
//!
//! Ids from one process are unique as long as fewer than 4096 are drawn in a
//! single bucket. Ids from different runs of the same process id can collide
//! if they land in the same bucket with the same counter value; the counter
//! starts at a random value to make that unlikely.

use crate::bytes::BufferArena;
use crate::util::{Clock, EntropySource, OsEntropy, SystemClock};
use core::fmt;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

/// Nanoseconds since the Unix epoch that ids count from (2020-05-19).
pub const EPOCH_SEED_NANOS: u64 = 1_589_858_037_028_322_000;

/// Width of the sequence field.
pub const SEQUENCE_BITS: u32 = 12;
/// Width of the process tag field.
pub const TAG_BITS: u32 = 10;
/// Low bits of the time delta that are discarded.
pub const BUCKET_SHIFT: u32 = SEQUENCE_BITS + TAG_BITS;

const SEQUENCE_MASK: u64 = (1 << SEQUENCE_BITS) - 1;
const TAG_MASK: u64 = (1 << TAG_BITS) - 1;
const BUCKET_MASK: u64 = !((1 << BUCKET_SHIFT) - 1);

/// A 64-bit unique identifier.
///
/// Renders as lowercase base 36.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id(u64);

impl Id {
    /// Wraps a raw value.
    #[must_use]
    pub const fn from_u64(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns the time bucket, in units of `2^22` ns since the epoch seed.
    #[must_use]
    pub const fn bucket(self) -> u64 {
        self.0 >> BUCKET_SHIFT
    }

    /// Returns the process tag.
    #[must_use]
    pub const fn tag(self) -> u16 {
        ((self.0 >> SEQUENCE_BITS) & TAG_MASK) as u16
    }

    /// Returns the rolling sequence value.
    #[must_use]
    pub const fn sequence(self) -> u16 {
        (self.0 & SEQUENCE_MASK) as u16
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.0)
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = BufferArena::global().acquire();
        buf.write_u64_radix(self.0, 36);
        // Base-36 digits are ASCII.
        f.write_str(buf.as_str().unwrap_or_default())
    }
}

/// Why text is not the canonical form of an [`Id`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseIdError {
    /// The text is empty.
    #[error("empty id")]
    Empty,
    /// The text holds something other than `0-9` and `a-z`.
    #[error("invalid id digit {0:?}")]
    InvalidDigit(char),
    /// A zero digit precedes other digits.
    #[error("id has a leading zero")]
    LeadingZero,
    /// The value does not fit in 64 bits.
    #[error("id out of range")]
    Overflow,
}

impl FromStr for Id {
    type Err = ParseIdError;

    /// Parses the exact text [`Display`](fmt::Display) produces, so every id
    /// has a single accepted spelling.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ParseIdError::Empty);
        }
        if s.len() > 1 && s.starts_with('0') {
            return Err(ParseIdError::LeadingZero);
        }
        let mut value: u64 = 0;
        for ch in s.chars() {
            let digit = match ch {
                '0'..='9' | 'a'..='z' => ch.to_digit(36),
                _ => None,
            }
            .ok_or(ParseIdError::InvalidDigit(ch))?;
            value = value
                .checked_mul(36)
                .and_then(|value| value.checked_add(u64::from(digit)))
                .ok_or(ParseIdError::Overflow)?;
        }
        Ok(Self(value))
    }
}

impl From<Id> for u64 {
    fn from(id: Id) -> Self {
        id.0
    }
}

impl Serialize for Id {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Issues [`Id`]s.
///
/// Use [`IdGenerator::global`] (or [`new_id`]) in production: it is created
/// once per process and only its counter changes afterwards. Separate
/// generators in one process share a process tag, so their ids may collide.
pub struct IdGenerator {
    tag: u64,
    counter: AtomicU64,
    clock: Arc<dyn Clock>,
}

impl IdGenerator {
    /// Creates a generator from the system clock, the OS process id and OS
    /// entropy.
    #[must_use]
    pub fn new() -> Self {
        Self::with_sources(Arc::new(SystemClock), std::process::id(), &OsEntropy)
    }

    /// Creates a generator reading `clock`, otherwise like [`new`](Self::new).
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self::with_sources(clock, std::process::id(), &OsEntropy)
    }

    /// Creates a generator from explicit sources.
    #[must_use]
    pub fn with_sources(
        clock: Arc<dyn Clock>,
        process_id: u32,
        entropy: &dyn EntropySource,
    ) -> Self {
        Self {
            tag: (u64::from(process_id) & TAG_MASK) << SEQUENCE_BITS,
            counter: AtomicU64::new(entropy.next_u64()),
            clock,
        }
    }

    /// Returns the process-wide generator, creating it on first use.
    pub fn global() -> &'static Self {
        static GLOBAL: OnceLock<IdGenerator> = OnceLock::new();
        GLOBAL.get_or_init(Self::new)
    }

    /// Returns the process tag stamped into every id.
    #[must_use]
    pub fn tag(&self) -> u16 {
        (self.tag >> SEQUENCE_BITS) as u16
    }

    /// Issues the next id. Never fails; the sequence wraps every 4096 calls.
    pub fn next_id(&self) -> Id {
        let delta = self
            .clock
            .now_unix_nanos()
            .saturating_sub(EPOCH_SEED_NANOS);
        let sequence = self
            .counter
            .fetch_add(1, Ordering::Relaxed)
            .wrapping_add(1)
            & SEQUENCE_MASK;
        Id((delta & BUCKET_MASK) | self.tag | sequence)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for IdGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdGenerator")
            .field("tag", &self.tag())
            .finish_non_exhaustive()
    }
}

/// Issues an id from the process-wide generator.
pub fn new_id() -> Id {
    IdGenerator::global().next_id()
}
