//! Error types for blockrec
//!
//! Provides a unified error type for all storage operations.

use thiserror::Error;

/// Result type alias using BlockError
pub type Result<T> = std::result::Result<T, BlockError>;

/// Unified error type for blockrec operations
#[derive(Debug, Error)]
pub enum BlockError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    /// Block size too small for the layout, or a record no block can hold
    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Codec Errors
    // -------------------------------------------------------------------------
    /// Truncated bytes, a length prefix past the buffer, or a decoded
    /// record that fails validation
    #[error("Decode error: {0}")]
    Decode(String),

    /// A record handed to the encoder still violates field constraints
    /// after normalization
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    // -------------------------------------------------------------------------
    // Lookup Errors
    // -------------------------------------------------------------------------
    #[error("Key not found: {0}")]
    KeyNotFound(u32),
}
