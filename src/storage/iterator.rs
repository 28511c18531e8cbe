//! Bucket Iterator
//!
//! Sequential scan of every slot in the bucket file, for inspection and
//! debugging. Slots are visited in file order, including slots left empty by
//! deletes.

use std::marker::PhantomData;

use crate::error::Result;
use crate::record::Record;

use super::{Bucket, FileStore};

/// Snapshot of one bucket slot
#[derive(Debug, Clone)]
pub struct BucketInfo<T> {
    /// Byte offset of the slot in the bucket file
    pub offset: u64,
    pub local_depth: u8,
    /// Live records in the slot
    pub count: usize,
    pub capacity: usize,
    /// Live records, ascending by key
    pub records: Vec<T>,
}

/// Iterator over bucket slots from offset 0 to end of file
pub struct BucketIter<'a, T> {
    store: &'a FileStore,
    capacity: usize,
    slot_size: u64,
    /// Stop reading when we reach this offset (file length at creation)
    end_offset: u64,
    current_offset: u64,
    _record: PhantomData<T>,
}

impl<'a, T: Record> BucketIter<'a, T> {
    pub(crate) fn new(store: &'a FileStore, capacity: usize, slot_size: usize) -> Result<Self> {
        Ok(Self {
            store,
            capacity,
            slot_size: slot_size as u64,
            end_offset: store.len()?,
            current_offset: 0,
            _record: PhantomData,
        })
    }
}

impl<'a, T: Record> Iterator for BucketIter<'a, T> {
    type Item = Result<BucketInfo<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_offset + self.slot_size > self.end_offset {
            return None;
        }

        let offset = self.current_offset;
        self.current_offset += self.slot_size;

        let bucket = self
            .store
            .read_at(offset, self.slot_size as usize)
            .and_then(|bytes| Bucket::<T>::from_bytes(self.capacity, &bytes));

        Some(bucket.map(|bucket| BucketInfo {
            offset,
            local_depth: bucket.local_depth(),
            count: bucket.len(),
            capacity: bucket.capacity(),
            records: bucket.into_records(),
        }))
    }
}
