//! Bucket
//!
//! A fixed-capacity container of records kept in ascending key order,
//! tagged with the number of low address bits its directory referents share.

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{HashError, Result};
use crate::record::{Key, Record};

use super::{slot_size, BUCKET_HEADER_SIZE, MAX_CAPACITY, MAX_DEPTH};

/// In-memory copy of one bucket slot
#[derive(Debug, Clone)]
pub struct Bucket<T> {
    local_depth: u8,
    capacity: usize,
    /// Sorted ascending by `Record::key`
    records: Vec<T>,
}

impl<T: Record> Bucket<T> {
    /// Create an empty bucket
    ///
    /// Fails when `capacity` cannot be described by the 16-bit signed count,
    /// or `local_depth` exceeds the one-byte depth ceiling.
    pub fn new(capacity: usize, local_depth: u8) -> Result<Self> {
        if T::SIZE == 0 {
            return Err(HashError::Validation(
                "record size must be non-zero".to_string(),
            ));
        }
        if capacity == 0 || capacity > MAX_CAPACITY {
            return Err(HashError::Validation(format!(
                "bucket capacity must be between 1 and {}, got {}",
                MAX_CAPACITY, capacity
            )));
        }
        if local_depth > MAX_DEPTH {
            return Err(HashError::Validation(format!(
                "local depth must be at most {}, got {}",
                MAX_DEPTH, local_depth
            )));
        }

        Ok(Self {
            local_depth,
            capacity,
            records: Vec::with_capacity(capacity),
        })
    }

    /// Insert keeping keys ascending
    ///
    /// Hands the record back when the bucket is full or already holds its key.
    pub fn insert(&mut self, record: T) -> std::result::Result<(), T> {
        if self.is_full() {
            return Err(record);
        }
        match self.position(record.key()) {
            Ok(_) => Err(record),
            Err(pos) => {
                self.records.insert(pos, record);
                Ok(())
            }
        }
    }

    /// Find the record stored under `key`
    pub fn find(&self, key: Key) -> Option<&T> {
        self.position(key).ok().map(|pos| &self.records[pos])
    }

    /// Replace the record with the same key; false if there is none
    pub fn update(&mut self, record: T) -> bool {
        match self.position(record.key()) {
            Ok(pos) => {
                self.records[pos] = record;
                true
            }
            Err(_) => false,
        }
    }

    /// Remove and return the record stored under `key`
    pub fn remove(&mut self, key: Key) -> Option<T> {
        self.position(key).ok().map(|pos| self.records.remove(pos))
    }

    pub fn is_full(&self) -> bool {
        self.records.len() >= self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn local_depth(&self) -> u8 {
        self.local_depth
    }

    /// Records in ascending key order
    pub fn records(&self) -> &[T] {
        &self.records
    }

    /// Take ownership of the records, ascending by key
    pub fn into_records(self) -> Vec<T> {
        self.records
    }

    /// Bytes one encoded bucket occupies on disk
    pub fn slot_size(&self) -> usize {
        slot_size(T::SIZE, self.capacity)
    }

    // =========================================================================
    // Serialization
    // =========================================================================

    /// Encode to one full slot: header, live records, zero padding
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = BytesMut::with_capacity(self.slot_size());
        buf.put_u8(self.local_depth);
        // capacity <= i16::MAX is checked at construction
        buf.put_i16(self.records.len() as i16);

        for record in &self.records {
            let bytes = record.to_bytes();
            if bytes.len() != T::SIZE {
                return Err(HashError::Format(format!(
                    "record {} encoded to {} bytes, expected {}",
                    record.key(),
                    bytes.len(),
                    T::SIZE
                )));
            }
            buf.put_slice(&bytes);
        }

        buf.put_bytes(0, (self.capacity - self.records.len()) * T::SIZE);
        Ok(buf.to_vec())
    }

    /// Decode one slot written by `to_bytes`
    ///
    /// The whole slot must be present; only the first `count` record slots
    /// are decoded.
    pub fn from_bytes(capacity: usize, bytes: &[u8]) -> Result<Self> {
        let mut bucket = Self::new(capacity, 0)?;

        let expected = bucket.slot_size();
        if bytes.len() < expected {
            return Err(HashError::Format(format!(
                "truncated bucket: expected {} bytes, got {}",
                expected,
                bytes.len()
            )));
        }

        let mut header = &bytes[..BUCKET_HEADER_SIZE];
        let local_depth = header.get_u8();
        let count = header.get_i16();

        if local_depth > MAX_DEPTH {
            return Err(HashError::Format(format!(
                "bucket local depth {} exceeds {}",
                local_depth, MAX_DEPTH
            )));
        }
        if count < 0 || count as usize > capacity {
            return Err(HashError::Format(format!(
                "bucket count {} outside 0..={}",
                count, capacity
            )));
        }

        bucket.local_depth = local_depth;
        for slot in bytes[BUCKET_HEADER_SIZE..expected]
            .chunks_exact(T::SIZE)
            .take(count as usize)
        {
            bucket.records.push(T::from_bytes(slot)?);
        }

        Ok(bucket)
    }

    fn position(&self, key: Key) -> std::result::Result<usize, usize> {
        self.records.binary_search_by_key(&key, |r| r.key())
    }
}
