//! Entropy sources for start-up seeding.
//!
//! Production code seeds from the OS; tests substitute a fixed source so
//! seeded state is reproducible.

use std::time::{SystemTime, UNIX_EPOCH};

/// Core trait for entropy providers.
pub trait EntropySource: Send + Sync + 'static {
    /// Return the next random `u64`.
    fn next_u64(&self) -> u64;
}

/// OS-backed entropy source.
///
/// If the OS source is unavailable the value is derived from the wall clock
/// and process id instead; seeding must not fail.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn next_u64(&self) -> u64 {
        let mut buf = [0u8; 8];
        match getrandom::fill(&mut buf) {
            Ok(()) => u64::from_le_bytes(buf),
            Err(_) => {
                let nanos = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map_or(0, |elapsed| elapsed.as_nanos() as u64);
                mix_seed(nanos ^ u64::from(std::process::id()).rotate_left(32))
            }
        }
    }
}

/// Entropy source that always yields the same value.
#[derive(Debug, Clone, Copy)]
pub struct FixedEntropy(pub u64);

impl EntropySource for FixedEntropy {
    fn next_u64(&self) -> u64 {
        self.0
    }
}

/// SplitMix64 finalizer.
pub(crate) fn mix_seed(mut seed: u64) -> u64 {
    seed ^= seed >> 30;
    seed = seed.wrapping_mul(0xbf58_476d_1ce4_e5b9);
    seed ^= seed >> 27;
    seed = seed.wrapping_mul(0x94d0_49bb_1331_11eb);
    seed ^= seed >> 31;
    seed
}
