//! Configuration for exthash
//!
//! Centralized configuration with sensible defaults.

use std::path::{Path, PathBuf};

use crate::error::{HashError, Result};
use crate::storage::{MAX_CAPACITY, MAX_DEPTH};

/// Main configuration for a hash table instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Directory file: one snapshot of the address array, rewritten in place
    pub directory_path: PathBuf,

    /// Bucket file: fixed-size bucket slots, append-only allocation
    pub bucket_path: PathBuf,

    // -------------------------------------------------------------------------
    // Table Configuration
    // -------------------------------------------------------------------------
    /// Records per bucket, shared by every bucket of the table
    pub bucket_capacity: usize,

    /// Highest global depth a split may reach
    ///
    /// The directory holds `2^depth` offsets, so this bounds its memory and
    /// file size. Defaults to 24 (128 MiB of offsets). Values above the
    /// on-disk ceiling of 127 are clamped.
    pub max_global_depth: u8,

    // -------------------------------------------------------------------------
    // Open Behavior
    // -------------------------------------------------------------------------
    /// Cross-check an existing directory/bucket file pair when opening
    pub verify_on_open: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            directory_path: PathBuf::from("./exthash_data/directory.db"),
            bucket_path: PathBuf::from("./exthash_data/buckets.db"),
            bucket_capacity: 3,
            max_global_depth: Self::DEFAULT_MAX_GLOBAL_DEPTH,
            verify_on_open: true,
        }
    }
}

impl Config {
    /// File name of the directory store inside a data directory
    pub const DIRECTORY_FILENAME: &'static str = "directory.db";

    /// File name of the bucket store inside a data directory
    pub const BUCKET_FILENAME: &'static str = "buckets.db";

    /// Default ceiling on the global depth
    pub const DEFAULT_MAX_GLOBAL_DEPTH: u8 = 24;

    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check limits that must hold before any file is opened
    pub fn validate(&self) -> Result<()> {
        if self.bucket_capacity == 0 || self.bucket_capacity > MAX_CAPACITY {
            return Err(HashError::Validation(format!(
                "bucket capacity must be between 1 and {}, got {}",
                MAX_CAPACITY, self.bucket_capacity
            )));
        }
        Ok(())
    }

    /// Global depth ceiling actually enforced by the engine
    pub fn depth_ceiling(&self) -> u8 {
        self.max_global_depth.min(MAX_DEPTH)
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Place both files inside `dir` using the default file names
    pub fn data_dir(mut self, dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        self.config.directory_path = dir.join(Config::DIRECTORY_FILENAME);
        self.config.bucket_path = dir.join(Config::BUCKET_FILENAME);
        self
    }

    /// Set the directory file path
    pub fn directory_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.directory_path = path.into();
        self
    }

    /// Set the bucket file path
    pub fn bucket_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.bucket_path = path.into();
        self
    }

    /// Set the number of records per bucket
    pub fn bucket_capacity(mut self, capacity: usize) -> Self {
        self.config.bucket_capacity = capacity;
        self
    }

    /// Set the global depth ceiling
    pub fn max_global_depth(mut self, depth: u8) -> Self {
        self.config.max_global_depth = depth;
        self
    }

    /// Enable or disable the file pair cross-check at open
    pub fn verify_on_open(mut self, verify: bool) -> Self {
        self.config.verify_on_open = verify;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
