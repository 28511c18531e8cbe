//! Error types for exthash
//!
//! Provides a unified error type for all table operations.

use thiserror::Error;

use crate::record::Key;

/// Result type alias using HashError
pub type Result<T> = std::result::Result<T, HashError>;

/// Unified error type for exthash operations
#[derive(Debug, Error)]
pub enum HashError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Construction Errors
    // -------------------------------------------------------------------------
    #[error("Validation error: {0}")]
    Validation(String),

    // -------------------------------------------------------------------------
    // Operation Errors
    // -------------------------------------------------------------------------
    #[error("Duplicate key: {0}")]
    DuplicateKey(Key),

    #[error("Depth overflow: {0}")]
    DepthOverflow(String),

    #[error("Address index {index} out of range for directory of size {size}")]
    AddressOutOfRange { index: usize, size: usize },

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Format error: {0}")]
    Format(String),
}
