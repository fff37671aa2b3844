//! Growable byte buffer borrowed from a [`BufferArena`](super::BufferArena).

use crate::bytes::arena::ArenaInner;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use std::fmt::{self, Write as _};
use std::io;
use std::str::Utf8Error;
use std::sync::Weak;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use time::formatting::Formattable;

/// An append-only byte buffer.
///
/// Writes grow the backing storage in place; numbers, booleans and
/// timestamps are rendered straight into it without intermediate strings.
/// Dropping the buffer (or calling [`release`](Self::release)) returns its
/// storage to the owning arena. The arena is held weakly, so a buffer never
/// keeps its arena alive.
pub struct Buffer {
    bytes: Vec<u8>,
    arena: Weak<ArenaInner>,
}

impl Buffer {
    pub(crate) fn pooled(mut bytes: Vec<u8>, arena: Weak<ArenaInner>) -> Self {
        bytes.clear();
        Self { bytes, arena }
    }

    /// Creates a buffer that belongs to no arena.
    #[must_use]
    pub fn detached(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
            arena: Weak::new(),
        }
    }

    /// Returns the number of bytes written.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true if nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns the capacity of the backing storage.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.bytes.capacity()
    }

    /// Returns the written bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the written bytes as text, without copying.
    ///
    /// The view borrows the buffer, so it cannot outlive the next write or
    /// the release.
    pub fn as_str(&self) -> Result<&str, Utf8Error> {
        std::str::from_utf8(&self.bytes)
    }

    /// Returns the written bytes encoded as standard, padded base64.
    #[must_use]
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    /// Discards the contents, keeping the capacity.
    pub fn reset(&mut self) {
        self.bytes.clear();
    }

    /// Takes the bytes out; the storage is not returned to the arena.
    #[must_use]
    pub fn into_vec(mut self) -> Vec<u8> {
        std::mem::take(&mut self.bytes)
    }

    /// Returns the storage to the owning arena.
    pub fn release(self) {
        drop(self);
    }

    /// Appends raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    /// Appends one byte.
    pub fn write_byte(&mut self, byte: u8) {
        self.bytes.push(byte);
    }

    /// Appends UTF-8 text.
    pub fn write_str(&mut self, text: &str) {
        self.bytes.extend_from_slice(text.as_bytes());
    }

    /// Appends `value` in base 10.
    pub fn write_i64(&mut self, value: i64) {
        self.append_display(value);
    }

    /// Appends `value` in base 10.
    pub fn write_int(&mut self, value: isize) {
        self.append_display(value);
    }

    /// Appends `value` in base 10.
    pub fn write_u64(&mut self, value: u64) {
        self.append_display(value);
    }

    /// Appends `value` in base 10.
    pub fn write_uint(&mut self, value: usize) {
        self.append_display(value);
    }

    /// Appends `value` in `radix` using lowercase digits.
    ///
    /// # Panics
    ///
    /// Panics if `radix` is outside `2..=36`.
    pub fn write_u64_radix(&mut self, mut value: u64, radix: u32) {
        assert!((2..=36).contains(&radix), "radix must be in 2..=36");
        let start = self.bytes.len();
        let radix = u64::from(radix);
        loop {
            let digit = (value % radix) as u32;
            // `digit < radix <= 36`, so this always yields a char.
            let ch = char::from_digit(digit, 36).unwrap_or('0');
            self.bytes.push(ch as u8);
            value /= radix;
            if value == 0 {
                break;
            }
        }
        self.bytes[start..].reverse();
    }

    /// Appends `true` or `false`.
    pub fn write_bool(&mut self, value: bool) {
        self.write_str(if value { "true" } else { "false" });
    }

    /// Appends the shortest decimal that round-trips to `value`, without an
    /// exponent.
    ///
    /// Infinities render as `+Inf` and `-Inf`, and NaN as `NaN`.
    pub fn write_f64(&mut self, value: f64) {
        if value.is_nan() {
            self.write_str("NaN");
        } else if value.is_infinite() {
            self.write_str(if value > 0.0 { "+Inf" } else { "-Inf" });
        } else {
            self.append_display(value);
        }
    }

    /// Appends `at` formatted as RFC 3339.
    pub fn write_time(&mut self, at: OffsetDateTime) -> Result<(), time::error::Format> {
        self.write_time_with(at, &Rfc3339)
    }

    /// Appends `at` formatted with `layout`.
    ///
    /// On error nothing is appended.
    pub fn write_time_with<F>(
        &mut self,
        at: OffsetDateTime,
        layout: &F,
    ) -> Result<(), time::error::Format>
    where
        F: Formattable + ?Sized,
    {
        let start = self.bytes.len();
        match at.format_into(&mut self.bytes, layout) {
            Ok(_) => Ok(()),
            Err(err) => {
                self.bytes.truncate(start);
                Err(err)
            }
        }
    }

    fn append_display(&mut self, value: impl fmt::Display) {
        // Appending to a Vec cannot fail.
        let _ = write!(self, "{value}");
    }
}

impl fmt::Write for Buffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.bytes.extend_from_slice(s.as_bytes());
        Ok(())
    }
}

impl io::Write for Buffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl AsRef<[u8]> for Buffer {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        if let Some(arena) = self.arena.upgrade() {
            arena.recycle(std::mem::take(&mut self.bytes));
        }
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("pooled", &(self.arena.strong_count() > 0))
            .finish()
    }
}
