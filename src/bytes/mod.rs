//! Pooled byte buffers for hot serialization paths.
//!
//! # Example
//!
//! ```
//! use corral::bytes::BufferArena;
//!
//! let arena = BufferArena::new();
//! let mut buffer = arena.acquire();
//! buffer.write_str("hello world");
//! buffer.write_u64(1023);
//! assert_eq!(buffer.as_str(), Ok("hello world1023"));
//! arena.release(buffer);
//!
//! assert!(arena.acquire().is_empty());
//! ```

pub mod arena;
pub mod buffer;

pub use arena::{ArenaConfig, ArenaStats, BufferArena, DEFAULT_BUFFER_CAPACITY};
pub use buffer::Buffer;

/// Acquires a buffer from the process-wide arena.
pub fn acquire() -> Buffer {
    BufferArena::global().acquire()
}
