//! # exthash
//!
//! A persistent extensible hash table for fixed-size records:
//! - Integer keys, records of one fixed encoded size per table
//! - Directory doubling + bucket splitting instead of rehashing
//! - Two binary files: a directory file and a bucket file
//! - Introspection of the directory and every bucket slot
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Engine<T>                           │
//! │           create / read / update / delete / inspect         │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  Directory  │ offsets  │   Buckets   │
//!   │ 2^depth → ──┼─────────▶│ fixed slots │
//!   └──────┬──────┘          └──────┬──────┘
//!          │                        │
//!          ▼                        ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │ directory.db│          │ buckets.db  │
//!   │ (in place)  │          │  (append)   │
//!   └─────────────┘          └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod record;
pub mod storage;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{HashError, Result};
pub use config::Config;
pub use engine::Engine;
pub use record::{Key, Record, TextRecord};
pub use storage::{BucketInfo, BucketIter};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of exthash
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
