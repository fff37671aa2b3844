//! Pool of reusable byte buffers.

use crate::bytes::Buffer;
use parking_lot::Mutex;
use serde::Deserialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

/// Capacity of a freshly allocated buffer.
pub const DEFAULT_BUFFER_CAPACITY: usize = 256;

/// Configuration for a [`BufferArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArenaConfig {
    /// Capacity given to buffers allocated on a pool miss.
    pub default_capacity: usize,
    /// Maximum number of idle buffers kept for reuse.
    pub max_pooled: usize,
    /// Buffers that grew beyond this capacity are freed instead of pooled.
    pub max_retained_capacity: usize,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            default_capacity: DEFAULT_BUFFER_CAPACITY,
            max_pooled: 1024,
            max_retained_capacity: 1 << 20,
        }
    }
}

/// Point-in-time counters for a [`BufferArena`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArenaStats {
    /// Buffers handed out.
    pub acquired: u64,
    /// Acquisitions that had to allocate.
    pub allocated: u64,
    /// Buffers returned to the pool.
    pub recycled: u64,
    /// Returned buffers that were freed instead of pooled.
    pub discarded: u64,
    /// Buffers currently idle in the pool.
    pub pooled: usize,
}

/// A shared pool of growable byte buffers.
///
/// [`acquire`](Self::acquire) never blocks and never fails: on a pool miss a
/// new buffer is allocated. Returned buffers keep their capacity, so later
/// acquisitions benefit from earlier growth. Clones share the same pool.
#[derive(Clone, Default)]
pub struct BufferArena {
    inner: Arc<ArenaInner>,
}

#[derive(Default)]
pub(crate) struct ArenaInner {
    pool: Mutex<Vec<Vec<u8>>>,
    config: ArenaConfig,
    acquired: AtomicU64,
    allocated: AtomicU64,
    recycled: AtomicU64,
    discarded: AtomicU64,
}

impl BufferArena {
    /// Creates an arena with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an arena with `config`.
    #[must_use]
    pub fn with_config(config: ArenaConfig) -> Self {
        Self {
            inner: Arc::new(ArenaInner {
                config,
                ..ArenaInner::default()
            }),
        }
    }

    /// Creates an arena from a configuration section.
    #[must_use]
    pub fn from_config(config: &ArenaConfig) -> Self {
        Self::with_config(*config)
    }

    /// Returns the process-wide arena, creating it on first use.
    pub fn global() -> &'static Self {
        static GLOBAL: OnceLock<BufferArena> = OnceLock::new();
        GLOBAL.get_or_init(Self::new)
    }

    /// Returns this arena's configuration.
    #[must_use]
    pub fn config(&self) -> &ArenaConfig {
        &self.inner.config
    }

    /// Hands out an empty buffer, reusing a pooled one when available.
    pub fn acquire(&self) -> Buffer {
        self.inner.acquired.fetch_add(1, Ordering::Relaxed);
        let pooled = self.inner.pool.lock().pop();
        let bytes = pooled.unwrap_or_else(|| {
            self.inner.allocated.fetch_add(1, Ordering::Relaxed);
            Vec::with_capacity(self.inner.config.default_capacity)
        });
        Buffer::pooled(bytes, Arc::downgrade(&self.inner))
    }

    /// Returns `buffer` to the pool it was acquired from.
    ///
    /// Equivalent to dropping it or calling [`Buffer::release`].
    pub fn release(&self, buffer: Buffer) {
        buffer.release();
    }

    /// Frees every idle buffer, returning how many were dropped.
    pub fn shrink(&self) -> usize {
        let drained = std::mem::take(&mut *self.inner.pool.lock());
        drained.len()
    }

    /// Returns a snapshot of the arena's counters.
    #[must_use]
    pub fn stats(&self) -> ArenaStats {
        ArenaStats {
            acquired: self.inner.acquired.load(Ordering::Relaxed),
            allocated: self.inner.allocated.load(Ordering::Relaxed),
            recycled: self.inner.recycled.load(Ordering::Relaxed),
            discarded: self.inner.discarded.load(Ordering::Relaxed),
            pooled: self.inner.pool.lock().len(),
        }
    }
}

impl ArenaInner {
    /// Takes a buffer's storage back, resetting its length.
    pub(crate) fn recycle(&self, mut bytes: Vec<u8>) {
        if bytes.capacity() == 0 {
            return;
        }
        if bytes.capacity() > self.config.max_retained_capacity {
            self.discarded.fetch_add(1, Ordering::Relaxed);
            return;
        }
        bytes.clear();
        let mut pool = self.pool.lock();
        if pool.len() >= self.config.max_pooled {
            drop(pool);
            self.discarded.fetch_add(1, Ordering::Relaxed);
            return;
        }
        pool.push(bytes);
        drop(pool);
        self.recycled.fetch_add(1, Ordering::Relaxed);
    }
}

impl fmt::Debug for BufferArena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferArena")
            .field("config", &self.inner.config)
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn acquire_on_empty_pool_allocates_default_capacity() {
        let arena = BufferArena::new();
        let buffer = arena.acquire();
        assert!(buffer.is_empty());
        assert!(buffer.capacity() >= DEFAULT_BUFFER_CAPACITY);
        let stats = arena.stats();
        assert_eq!(stats.acquired, 1);
        assert_eq!(stats.allocated, 1);
    }

    #[test]
    fn configured_default_capacity_is_used_on_miss() {
        let arena = BufferArena::from_config(&ArenaConfig {
            default_capacity: 4096,
            ..ArenaConfig::default()
        });
        assert_eq!(arena.config().default_capacity, 4096);
        assert!(arena.acquire().capacity() >= 4096);
    }

    #[test]
    fn released_buffer_is_reused_with_its_capacity() {
        let arena = BufferArena::new();
        let mut buffer = arena.acquire();
        buffer.write_bytes(&[7; 4096]);
        let grown = buffer.capacity();
        arena.release(buffer);

        let again = arena.acquire();
        assert_eq!(again.len(), 0);
        assert_eq!(again.capacity(), grown);
        assert_eq!(arena.stats().allocated, 1);
        assert_eq!(arena.stats().recycled, 1);
    }

    #[test]
    fn dropping_a_buffer_returns_it() {
        let arena = BufferArena::new();
        drop(arena.acquire());
        assert_eq!(arena.stats().pooled, 1);
    }

    #[test]
    fn pool_respects_max_pooled() {
        let arena = BufferArena::with_config(ArenaConfig {
            max_pooled: 2,
            ..ArenaConfig::default()
        });
        let buffers: Vec<_> = (0..4).map(|_| arena.acquire()).collect();
        drop(buffers);
        let stats = arena.stats();
        assert_eq!(stats.pooled, 2);
        assert_eq!(stats.discarded, 2);
    }

    #[test]
    fn oversized_buffers_are_not_retained() {
        let arena = BufferArena::with_config(ArenaConfig {
            max_retained_capacity: 512,
            ..ArenaConfig::default()
        });
        let mut buffer = arena.acquire();
        buffer.write_bytes(&[0; 2048]);
        drop(buffer);
        assert_eq!(arena.stats().pooled, 0);
        assert_eq!(arena.stats().discarded, 1);
    }

    #[test]
    fn buffer_outliving_its_arena_is_simply_freed() {
        let arena = BufferArena::new();
        let mut buffer = arena.acquire();
        drop(arena);
        buffer.write_str("still usable");
        assert_eq!(buffer.as_str(), Ok("still usable"));
    }

    #[test]
    fn shrink_empties_the_pool() {
        let arena = BufferArena::new();
        let buffers: Vec<_> = (0..3).map(|_| arena.acquire()).collect();
        drop(buffers);
        assert_eq!(arena.shrink(), 3);
        assert_eq!(arena.stats().pooled, 0);
    }

    #[test]
    fn concurrent_acquire_and_release() {
        let arena = BufferArena::new();
        let workers: Vec<_> = (0..8)
            .map(|worker| {
                let arena = arena.clone();
                thread::spawn(move || {
                    for round in 0..200 {
                        let mut buffer = arena.acquire();
                        assert!(buffer.is_empty());
                        buffer.write_u64(worker * 1000 + round);
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().expect("worker thread");
        }
        let stats = arena.stats();
        assert_eq!(stats.acquired, 1600);
        assert!(stats.allocated <= 8);
    }
}
