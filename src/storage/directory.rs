//! Directory
//!
//! Maps address indices to bucket offsets. Holds `2^global_depth` entries;
//! a bucket of local depth `d` is referenced by every index sharing its low
//! `d` bits.

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{HashError, Result};
use crate::record::Key;

use super::{DIRECTORY_HEADER_SIZE, MAX_DEPTH, OFFSET_SIZE};

/// Directory slot for `key` at `depth`: `|key| mod 2^depth`
///
/// Works on the key's magnitude, so `k` and `-k` always share a slot.
pub fn address_index(key: Key, depth: u8) -> usize {
    let magnitude = key.unsigned_abs();
    let reduced = match 1u64.checked_shl(u32::from(depth)) {
        Some(modulus) => magnitude % modulus,
        None => magnitude,
    };
    reduced as usize
}

/// In-memory copy of the directory file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directory {
    global_depth: u8,
    addresses: Vec<u64>,
}

impl Default for Directory {
    fn default() -> Self {
        Self::new()
    }
}

impl Directory {
    /// Depth-0 directory with a single entry pointing at offset 0
    pub fn new() -> Self {
        Self {
            global_depth: 0,
            addresses: vec![0],
        }
    }

    pub fn global_depth(&self) -> u8 {
        self.global_depth
    }

    /// Number of entries, `2^global_depth`
    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    /// Bucket offsets, indexed by address
    pub fn addresses(&self) -> &[u64] {
        &self.addresses
    }

    /// Directory slot for `key` at the current global depth
    pub fn index_of(&self, key: Key) -> usize {
        address_index(key, self.global_depth)
    }

    /// Offset of the bucket responsible for `key`
    pub fn locate(&self, key: Key) -> u64 {
        self.addresses[self.index_of(key)]
    }

    /// Point `index` at the bucket stored at `offset`
    pub fn set_address(&mut self, index: usize, offset: u64) -> Result<()> {
        let size = self.addresses.len();
        match self.addresses.get_mut(index) {
            Some(slot) => {
                *slot = offset;
                Ok(())
            }
            None => Err(HashError::AddressOutOfRange { index, size }),
        }
    }

    /// Grow to `global_depth + 1`
    ///
    /// Both halves of the new array start out as copies of the old one, so
    /// every index and its new high-bit twin point at the same bucket.
    pub fn double(&mut self) -> Result<()> {
        if self.global_depth >= MAX_DEPTH {
            return Err(HashError::DepthOverflow(format!(
                "global depth already at ceiling {}",
                MAX_DEPTH
            )));
        }

        self.reserve_depth(self.global_depth + 1)?;
        self.addresses.extend_from_within(..);
        self.global_depth += 1;
        Ok(())
    }

    /// Make room in memory for a directory of `depth`
    ///
    /// Fails with `DepthOverflow` when `2^depth` offsets cannot be addressed
    /// or allocated. Leaves the entries themselves unchanged.
    pub fn reserve_depth(&mut self, depth: u8) -> Result<()> {
        let entries = 1usize
            .checked_shl(u32::from(depth))
            .filter(|&n| {
                n.checked_mul(OFFSET_SIZE)
                    .and_then(|bytes| bytes.checked_add(DIRECTORY_HEADER_SIZE))
                    .is_some()
            })
            .ok_or_else(|| {
                HashError::DepthOverflow(format!(
                    "directory of depth {} is not addressable",
                    depth
                ))
            })?;

        let additional = entries.saturating_sub(self.addresses.len());
        self.addresses.try_reserve_exact(additional).map_err(|e| {
            HashError::DepthOverflow(format!(
                "directory of depth {} cannot be allocated: {}",
                depth, e
            ))
        })
    }

    // =========================================================================
    // Serialization
    // =========================================================================

    /// Bytes the encoded directory occupies
    pub fn encoded_len(&self) -> usize {
        DIRECTORY_HEADER_SIZE + self.addresses.len() * OFFSET_SIZE
    }

    /// Encode: depth byte, then one big-endian signed offset per entry
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        buf.put_u8(self.global_depth);
        for &offset in &self.addresses {
            buf.put_i64(offset as i64);
        }
        buf.to_vec()
    }

    /// Decode a directory written by `to_bytes`
    ///
    /// Trailing bytes past the last entry are ignored.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut buf = bytes;
        if buf.remaining() < DIRECTORY_HEADER_SIZE {
            return Err(HashError::Format("empty directory".to_string()));
        }

        let global_depth = buf.get_u8();
        if global_depth > MAX_DEPTH {
            return Err(HashError::Format(format!(
                "global depth {} exceeds {}",
                global_depth, MAX_DEPTH
            )));
        }

        let count = 1usize
            .checked_shl(u32::from(global_depth))
            .filter(|count| count.checked_mul(OFFSET_SIZE).is_some())
            .ok_or_else(|| {
                HashError::Format(format!("global depth {} is not addressable", global_depth))
            })?;
        if buf.remaining() < count * OFFSET_SIZE {
            return Err(HashError::Format(format!(
                "truncated directory: depth {} needs {} offsets, found {} bytes",
                global_depth,
                count,
                buf.remaining()
            )));
        }

        let mut addresses = Vec::with_capacity(count);
        for index in 0..count {
            let offset = buf.get_i64();
            if offset < 0 {
                return Err(HashError::Format(format!(
                    "negative bucket offset {} at index {}",
                    offset, index
                )));
            }
            addresses.push(offset as u64);
        }

        Ok(Self {
            global_depth,
            addresses,
        })
    }
}
