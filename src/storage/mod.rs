//! Storage Module
//!
//! On-disk structures of the extensible hash table.
//!
//! ## Responsibilities
//! - Fixed-capacity, key-sorted buckets with a local depth
//! - The directory: `2^global_depth` bucket offsets
//! - Seek-addressable byte stores for both files
//! - Sequential scan of every bucket slot
//!
//! ## File Formats
//! ```text
//! Directory file (rewritten in place)
//! ┌──────────────┬───────────────────────────────────────────┐
//! │ Depth u8 (1) │ 2^depth × Offset i64 BE (8)               │
//! └──────────────┴───────────────────────────────────────────┘
//!
//! Bucket file (slots appended, never reclaimed)
//! ┌──────────────┬───────────────┬──────────────────┬──────────────┐
//! │ Depth u8 (1) │ Count i16 BE  │ Count × Record   │ Zero padding │
//! │              │ (2)           │                  │ to capacity  │
//! └──────────────┴───────────────┴──────────────────┴──────────────┘
//! ... repeated, one slot per bucket ...
//! ```

mod bucket;
mod directory;
mod iterator;
mod store;

pub use bucket::Bucket;
pub use directory::{address_index, Directory};
pub use iterator::{BucketInfo, BucketIter};
pub use store::FileStore;

// =============================================================================
// Shared Constants
// =============================================================================

/// Deepest local or global depth the one-byte depth fields may hold
pub const MAX_DEPTH: u8 = 127;

/// Largest bucket capacity the two-byte signed count can describe
pub const MAX_CAPACITY: usize = i16::MAX as usize;

/// Bucket header: LocalDepth (1) + Count (2) = 3 bytes
pub(crate) const BUCKET_HEADER_SIZE: usize = 3;

/// Directory header: GlobalDepth (1) byte
pub(crate) const DIRECTORY_HEADER_SIZE: usize = 1;

/// Size of one encoded directory offset
pub(crate) const OFFSET_SIZE: usize = 8;

/// Size in bytes of one bucket slot for the given record size and capacity
pub fn slot_size(record_size: usize, capacity: usize) -> usize {
    BUCKET_HEADER_SIZE + record_size * capacity
}
