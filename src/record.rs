//! Record contract
//!
//! Every value stored in the table is a fixed-size record identified by a
//! signed integer key. The engine relies on `Record::SIZE` to compute bucket
//! strides before touching any file.

use bytes::{Buf, BufMut};

use crate::error::{HashError, Result};

/// Record key: identifies a record and orders it inside its bucket
pub type Key = i64;

/// A fixed-size, serializable unit of storage
pub trait Record: Sized {
    /// Encoded size in bytes, identical for every instance
    const SIZE: usize;

    /// The key this record is stored under
    fn key(&self) -> Key;

    /// Encode to exactly `SIZE` bytes
    fn to_bytes(&self) -> Vec<u8>;

    /// Decode from the first `SIZE` bytes of `bytes`
    ///
    /// Fails with `HashError::Format` when the buffer is short or unreadable.
    fn from_bytes(bytes: &[u8]) -> Result<Self>;
}

// =============================================================================
// TextRecord
// =============================================================================

/// Demo record: an `i32` key with a short text value
///
/// ```text
/// ┌──────────────┬──────────────────────────────────┐
/// │ Key i32 BE(4)│ Value UTF-8, space padded (20)   │
/// └──────────────┴──────────────────────────────────┘
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRecord {
    pub key: i32,
    pub value: String,
}

impl TextRecord {
    /// Width of the value field in bytes
    pub const VALUE_WIDTH: usize = 20;

    /// Create a record, truncating the value to fit the value field
    ///
    /// Truncation happens on a character boundary so the stored bytes stay
    /// valid UTF-8.
    pub fn new(key: i32, value: impl Into<String>) -> Self {
        let mut value = value.into();
        value.truncate(Self::fitted_len(&value));
        Self { key, value }
    }

    /// Longest prefix of `value` that fits the field and ends on a character
    fn fitted_len(value: &str) -> usize {
        let mut end = value.len().min(Self::VALUE_WIDTH);
        while !value.is_char_boundary(end) {
            end -= 1;
        }
        end
    }
}

impl Record for TextRecord {
    const SIZE: usize = 4 + Self::VALUE_WIDTH;

    fn key(&self) -> Key {
        Key::from(self.key)
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::SIZE);
        buf.put_i32(self.key);

        // Fields are public, so the value may not have gone through `new`
        let len = Self::fitted_len(&self.value);
        buf.put_slice(&self.value.as_bytes()[..len]);
        buf.put_bytes(b' ', Self::VALUE_WIDTH - len);
        buf
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::SIZE {
            return Err(HashError::Format(format!(
                "TextRecord needs {} bytes, got {}",
                Self::SIZE,
                bytes.len()
            )));
        }

        let mut buf = &bytes[..Self::SIZE];
        let key = buf.get_i32();
        let value = std::str::from_utf8(buf)
            .map_err(|e| HashError::Format(format!("TextRecord value is not UTF-8: {}", e)))?;

        // Zero-filled padding slots decode as empty values
        let value = value.trim_end_matches(|c: char| c == ' ' || c == '\0').to_string();

        Ok(Self { key, value })
    }
}

impl std::fmt::Display for TextRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, '{}')", self.key, self.value)
    }
}
