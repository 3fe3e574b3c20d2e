//! # blockrec
//!
//! Block-structured record files with three interchangeable packing layouts:
//! - Fixed-width records with a whole number of slots per block
//! - Variable-width records kept contiguous inside one block
//! - Variable-width records fragmented into chunks across blocks
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       RecordFile                             │
//! │        write_all / append / find_by_key / read_all / stats   │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                  StorageStrategy                             │
//! │           Fixed │ Contiguous │ Fragmented                    │
//! └──────┬──────────────────────┬─────────────────────┬─────────┘
//!        │                      │                     │
//!        ▼                      ▼                     ▼
//!  ┌─────────────┐       ┌─────────────┐       ┌─────────────┐
//!  │ RecordCodec │       │ BlockStore  │       │   Stats     │
//!  │ (validated) │       │ (flat file) │       │ Collector   │
//!  └─────────────┘       └─────────────┘       └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod record;
pub mod codec;
pub mod storage;
pub mod stats;
pub mod record_file;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{BlockError, Result};
pub use config::{Config, DanglingChunkPolicy, Layout};
pub use record::{FieldLimits, Record};
pub use record_file::RecordFile;
pub use stats::StorageStats;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of blockrec
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
