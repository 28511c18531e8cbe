//! Engine Module
//!
//! The extensible hash table: coordinates the directory file and the bucket
//! file.
//!
//! ## Responsibilities
//! - Initialise a fresh file pair, or adopt an existing one
//! - Create/read/update/delete records by key
//! - Split overflowing buckets, doubling the directory when needed
//! - Expose the directory and bucket slots for inspection

use std::collections::HashMap;
use std::marker::PhantomData;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{HashError, Result};
use crate::record::{Key, Record};
use crate::storage::{
    address_index, slot_size, Bucket, BucketIter, Directory, FileStore, MAX_DEPTH,
};

/// Persistent extensible hash table over records of type `T`
///
/// ## Access Model
/// - Single owner, single thread: the engine holds both file handles
///   exclusively until it is closed or dropped
/// - Nothing is cached: every operation re-reads the directory file
/// - Multi-step mutations (split, doubling, reinsertion) are not atomic
pub struct Engine<T: Record> {
    /// Engine configuration
    config: Config,

    /// Directory file: one snapshot, rewritten in place
    directory: FileStore,

    /// Bucket file: fixed-size slots, append-only allocation
    buckets: FileStore,

    _record: PhantomData<T>,
}

impl<T: Record> Engine<T> {
    /// Open or create a table with the given config
    ///
    /// On startup:
    /// 1. Validate capacity and record size
    /// 2. Open/create both files
    /// 3. If either file is empty, reinitialise both to a single empty bucket
    /// 4. Otherwise cross-check the existing pair (when `verify_on_open` is set)
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        if T::SIZE == 0 {
            return Err(HashError::Validation(
                "record size must be non-zero".to_string(),
            ));
        }

        let directory = FileStore::open(&config.directory_path)?;
        let buckets = FileStore::open(&config.bucket_path)?;

        let mut engine = Self {
            config,
            directory,
            buckets,
            _record: PhantomData,
        };

        if engine.directory.is_empty()? || engine.buckets.is_empty()? {
            engine.initialize()?;
        } else if engine.config.verify_on_open {
            engine.verify()?;
        }

        info!(
            directory = %engine.directory.path().display(),
            buckets = %engine.buckets.path().display(),
            capacity = engine.config.bucket_capacity,
            record_size = T::SIZE,
            "hash table opened"
        );

        Ok(engine)
    }

    /// Open with both files inside `path` (convenience method)
    ///
    /// Uses default config with the given data directory and capacity.
    pub fn open_path(path: &Path, bucket_capacity: usize) -> Result<Self> {
        let config = Config::builder()
            .data_dir(path)
            .bucket_capacity(bucket_capacity)
            .build();
        Self::open(config)
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Look up the record stored under `key`
    pub fn read(&self, key: Key) -> Result<Option<T>> {
        let directory = self.load_directory()?;
        let mut bucket = self.load_bucket(directory.locate(key))?;
        // The bucket is a private copy; taking the record out avoids a clone
        Ok(bucket.remove(key))
    }

    /// Insert a new record
    ///
    /// Fails with `DuplicateKey` if the key is already stored. A full bucket
    /// is split, doubling the directory first when its local depth has caught
    /// up with the global depth; the displaced records and `record` are then
    /// reinserted through the same path.
    pub fn create(&mut self, record: T) -> Result<()> {
        let mut pending = vec![record];
        while let Some(record) = pending.pop() {
            self.insert(record, &mut pending)?;
        }
        Ok(())
    }

    /// Replace the record stored under `record.key()`
    ///
    /// Returns false when no record has that key.
    pub fn update(&mut self, record: T) -> Result<bool> {
        let key = record.key();
        let directory = self.load_directory()?;
        let offset = directory.locate(key);
        let mut bucket = self.load_bucket(offset)?;

        if !bucket.update(record) {
            return Ok(false);
        }
        self.write_bucket(offset, &bucket)?;
        debug!(key, offset, "record updated");
        Ok(true)
    }

    /// Remove the record stored under `key`
    ///
    /// Returns false when no record has that key. The bucket slot stays
    /// allocated even if it becomes empty.
    pub fn delete(&mut self, key: Key) -> Result<bool> {
        let directory = self.load_directory()?;
        let offset = directory.locate(key);
        let mut bucket = self.load_bucket(offset)?;

        if bucket.remove(key).is_none() {
            return Ok(false);
        }
        self.write_bucket(offset, &bucket)?;
        debug!(key, offset, "record deleted");
        Ok(true)
    }

    /// Sync both files to disk and release them
    pub fn close(self) -> Result<()> {
        self.directory.sync()?;
        self.buckets.sync()?;
        Ok(())
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Current global depth of the directory
    pub fn global_depth(&self) -> Result<u8> {
        Ok(self.load_directory()?.global_depth())
    }

    /// Every directory entry as `(address index, bucket offset)`
    pub fn directory_snapshot(&self) -> Result<Vec<(usize, u64)>> {
        let directory = self.load_directory()?;
        Ok(directory.addresses().iter().copied().enumerate().collect())
    }

    /// Scan every bucket slot in file order
    ///
    /// Each call starts a fresh scan from offset 0.
    pub fn buckets(&self) -> Result<BucketIter<'_, T>> {
        BucketIter::new(&self.buckets, self.config.bucket_capacity, self.slot_size())
    }

    /// Total number of stored records
    pub fn record_count(&self) -> Result<usize> {
        let mut total = 0;
        for bucket in self.buckets()? {
            total += bucket?.count;
        }
        Ok(total)
    }

    /// Records per bucket
    pub fn capacity(&self) -> usize {
        self.config.bucket_capacity
    }

    /// Bytes per bucket slot in the bucket file
    pub fn slot_size(&self) -> usize {
        slot_size(T::SIZE, self.config.bucket_capacity)
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    // =========================================================================
    // Insert Path
    // =========================================================================

    /// Insert one record, queueing records displaced by a split on `pending`
    fn insert(&mut self, record: T, pending: &mut Vec<T>) -> Result<()> {
        let key = record.key();
        let mut directory = self.load_directory()?;
        let offset = directory.locate(key);
        let mut bucket = self.load_bucket(offset)?;

        if bucket.find(key).is_some() {
            return Err(HashError::DuplicateKey(key));
        }

        let record = match bucket.insert(record) {
            Ok(()) => {
                self.write_bucket(offset, &bucket)?;
                debug!(key, offset, "record inserted");
                return Ok(());
            }
            Err(record) => record,
        };

        let displaced = self.split(&mut directory, offset, bucket, &record)?;

        // Reinsert the old bucket's records in key order, then the new record
        pending.push(record);
        pending.extend(displaced.into_iter().rev());
        Ok(())
    }

    /// Replace the full bucket at `offset` with two buckets one level deeper
    ///
    /// 1. Double the directory if the bucket's local depth equals the global depth
    /// 2. Overwrite the old slot with an empty bucket, append a second one
    /// 3. Repoint every other directory entry that referenced the old slot
    /// 4. Persist the directory
    ///
    /// Returns the records the old bucket held.
    fn split(
        &mut self,
        directory: &mut Directory,
        offset: u64,
        bucket: Bucket<T>,
        record: &T,
    ) -> Result<Vec<T>> {
        let local_depth = bucket.local_depth();
        if local_depth > directory.global_depth() {
            return Err(HashError::Format(format!(
                "bucket at offset {} has local depth {} above global depth {}",
                offset,
                local_depth,
                directory.global_depth()
            )));
        }

        self.check_separable(directory, &bucket, record)?;

        if local_depth == directory.global_depth() {
            directory.double()?;
            info!(global_depth = directory.global_depth(), "directory doubled");
        }

        let empty = Bucket::<T>::new(self.config.bucket_capacity, local_depth + 1)?.to_bytes()?;
        self.buckets.write_at(offset, &empty)?;
        let new_offset = self.buckets.append(&empty)?;

        // Entries that referenced the old slot: start, start + stride, ...
        // Every second one moves to the appended slot.
        let start = address_index(record.key(), local_depth);
        let stride = 1usize << local_depth;
        for index in (start..directory.len()).step_by(stride).skip(1).step_by(2) {
            directory.set_address(index, new_offset)?;
        }
        self.write_directory(directory)?;

        debug!(
            offset,
            new_offset,
            local_depth = local_depth + 1,
            global_depth = directory.global_depth(),
            "bucket split"
        );

        Ok(bucket.into_records())
    }

    /// Fail before any write if a split can never make room for `record`
    ///
    /// The split chain ends at the shallowest depth where no more than
    /// `capacity` of the bucket's keys plus the new key share their low bits.
    /// That depth must lie within the ceiling, and a directory of that depth
    /// must be addressable and allocatable.
    fn check_separable(
        &self,
        directory: &mut Directory,
        bucket: &Bucket<T>,
        record: &T,
    ) -> Result<()> {
        let ceiling = self
            .config
            .depth_ceiling()
            .max(directory.global_depth())
            .min(MAX_DEPTH);
        let keys: Vec<Key> = bucket
            .records()
            .iter()
            .map(T::key)
            .chain(Some(record.key()))
            .collect();

        let needed = (bucket.local_depth() + 1..=ceiling)
            .find(|&depth| fits_at(&keys, depth, bucket.capacity()))
            .ok_or_else(|| {
                HashError::DepthOverflow(format!(
                    "inserting key {} needs more than {} records to share an address at depth ceiling {}",
                    record.key(),
                    bucket.capacity(),
                    ceiling
                ))
            })?;

        if needed > directory.global_depth() {
            directory.reserve_depth(needed)?;
        }
        Ok(())
    }

    // =========================================================================
    // Setup
    // =========================================================================

    /// Reset both files to a depth-0 directory and one empty bucket
    fn initialize(&mut self) -> Result<()> {
        if !self.directory.is_empty()? || !self.buckets.is_empty()? {
            warn!(
                directory = %self.directory.path().display(),
                buckets = %self.buckets.path().display(),
                "one file of the pair is empty, reinitialising both"
            );
        }

        self.directory.clear()?;
        self.buckets.clear()?;

        let bucket = Bucket::<T>::new(self.config.bucket_capacity, 0)?;
        let offset = self.buckets.append(&bucket.to_bytes()?)?;

        let mut directory = Directory::new();
        directory.set_address(0, offset)?;
        self.write_directory(&directory)?;

        info!("initialised empty hash table");
        Ok(())
    }

    /// Cross-check an existing directory file against the bucket file
    ///
    /// - Directory length matches its global depth
    /// - Bucket file length is a whole number of slots
    /// - Every offset is slot aligned and inside the bucket file
    /// - Every referenced bucket is readable, no deeper than the directory,
    ///   and referenced by exactly the `2^(global - local)` entries sharing
    ///   its low `local` bits
    fn verify(&self) -> Result<()> {
        let directory = self.load_directory()?;
        let directory_len = self.directory.len()?;
        if directory_len != directory.encoded_len() as u64 {
            return Err(HashError::Format(format!(
                "directory file is {} bytes, depth {} needs {}",
                directory_len,
                directory.global_depth(),
                directory.encoded_len()
            )));
        }

        let slot = self.slot_size() as u64;
        let bucket_len = self.buckets.len()?;
        if bucket_len % slot != 0 {
            return Err(HashError::Format(format!(
                "bucket file is {} bytes, not a multiple of the {}-byte slot",
                bucket_len, slot
            )));
        }

        // offset -> (first index seen, number of referents)
        let mut referents: HashMap<u64, (usize, usize)> = HashMap::new();
        for (index, &offset) in directory.addresses().iter().enumerate() {
            if offset % slot != 0 || offset >= bucket_len {
                return Err(HashError::Format(format!(
                    "directory index {} points at invalid bucket offset {}",
                    index, offset
                )));
            }
            referents.entry(offset).or_insert((index, 0)).1 += 1;
        }

        let global_depth = directory.global_depth();
        for (offset, (first, count)) in referents {
            let local_depth = self.load_bucket(offset)?.local_depth();
            if local_depth > global_depth {
                return Err(HashError::Format(format!(
                    "bucket at offset {} has local depth {} above global depth {}",
                    offset, local_depth, global_depth
                )));
            }

            let expected = 1usize << (global_depth - local_depth);
            let mask = (1usize << local_depth) - 1;
            let aligned = directory
                .addresses()
                .iter()
                .enumerate()
                .filter(|&(_, &o)| o == offset)
                .all(|(index, _)| index & mask == first & mask);
            if count != expected || !aligned {
                return Err(HashError::Format(format!(
                    "bucket at offset {} (local depth {}) has {} directory referents, expected {}",
                    offset, local_depth, count, expected
                )));
            }
        }

        debug!(global_depth, buckets = bucket_len / slot, "file pair verified");
        Ok(())
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn load_directory(&self) -> Result<Directory> {
        Directory::from_bytes(&self.directory.read_all()?)
    }

    fn write_directory(&mut self, directory: &Directory) -> Result<()> {
        self.directory.write_at(0, &directory.to_bytes())
    }

    fn load_bucket(&self, offset: u64) -> Result<Bucket<T>> {
        let bytes = self.buckets.read_at(offset, self.slot_size())?;
        Bucket::from_bytes(self.config.bucket_capacity, &bytes)
    }

    fn write_bucket(&mut self, offset: u64, bucket: &Bucket<T>) -> Result<()> {
        self.buckets.write_at(offset, &bucket.to_bytes()?)
    }
}

/// True if no more than `capacity` of `keys` share an address at `depth`
fn fits_at(keys: &[Key], depth: u8, capacity: usize) -> bool {
    let mut groups: HashMap<usize, usize> = HashMap::new();
    keys.iter().all(|&key| {
        let members = groups.entry(address_index(key, depth)).or_insert(0);
        *members += 1;
        *members <= capacity
    })
}
