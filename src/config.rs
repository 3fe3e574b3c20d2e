//! Configuration for blockrec
//!
//! Centralized configuration with sensible defaults.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{BlockError, Result};

/// Main configuration for a record file
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Path of the flat data file
    pub data_file: PathBuf,

    /// Size of every block in bytes. There is no file header, so the same
    /// value must be supplied every time the file is opened.
    pub block_size: usize,

    /// Block-packing strategy
    pub layout: Layout,

    // -------------------------------------------------------------------------
    // Scan Configuration
    // -------------------------------------------------------------------------
    /// How a fragmented chain cut off by end-of-file is accounted for
    pub dangling_chunks: DanglingChunkPolicy,
}

/// Block-packing strategy of a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Fixed-width records, whole records per block
    Fixed,

    /// Variable-width records, a record never crosses a block boundary
    Contiguous,

    /// Variable-width records split into chunks across consecutive blocks
    Fragmented,
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Layout::Fixed => "fixed",
            Layout::Contiguous => "contiguous",
            Layout::Fragmented => "fragmented",
        };
        f.write_str(name)
    }
}

impl FromStr for Layout {
    type Err = BlockError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "fixed" => Ok(Layout::Fixed),
            "contiguous" | "variable" => Ok(Layout::Contiguous),
            "fragmented" => Ok(Layout::Fragmented),
            other => Err(BlockError::Config(format!("Unknown layout: {}", other))),
        }
    }
}

/// Accounting of a fragmented chain whose last chunk still carries the
/// continuation flag when the file ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DanglingChunkPolicy {
    /// Treat the chain as corruption: its bytes are not counted as used
    #[default]
    Strict,

    /// Count the chain's raw bytes as used
    Lenient,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("records.dat"),
            block_size: 4096,
            layout: Layout::Contiguous,
            dangling_chunks: DanglingChunkPolicy::Strict,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Layout-independent sanity checks; each layout also checks its own
    /// minimum block size on construction.
    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            return Err(BlockError::Config(
                "Block size must be a positive number of bytes".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data file path
    pub fn data_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_file = path.into();
        self
    }

    /// Set the block size (in bytes)
    pub fn block_size(mut self, size: usize) -> Self {
        self.config.block_size = size;
        self
    }

    /// Set the block-packing layout
    pub fn layout(mut self, layout: Layout) -> Self {
        self.config.layout = layout;
        self
    }

    /// Set the dangling-chain policy used by fragmented scans
    pub fn dangling_chunks(mut self, policy: DanglingChunkPolicy) -> Self {
        self.config.dangling_chunks = policy;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = Config::builder().build();
        assert_eq!(config.data_file, PathBuf::from("records.dat"));
        assert_eq!(config.block_size, 4096);
        assert_eq!(config.layout, Layout::Contiguous);
        assert_eq!(config.dangling_chunks, DanglingChunkPolicy::Strict);
    }

    #[test]
    fn test_layout_parsing() {
        assert_eq!("fixed".parse::<Layout>().unwrap(), Layout::Fixed);
        assert_eq!("Fragmented".parse::<Layout>().unwrap(), Layout::Fragmented);
        assert_eq!("variable".parse::<Layout>().unwrap(), Layout::Contiguous);
        assert!(matches!("striped".parse::<Layout>(), Err(BlockError::Config(_))));
        assert_eq!(Layout::Fragmented.to_string(), "fragmented");
    }

    #[test]
    fn test_layout_serializes_like_display() {
        for layout in [Layout::Fixed, Layout::Contiguous, Layout::Fragmented] {
            let json = serde_json::to_string(&layout).unwrap();
            assert_eq!(json, format!("\"{}\"", layout));
        }
    }

    #[test]
    fn test_zero_block_size_rejected() {
        let config = Config::builder().block_size(0).build();
        assert!(matches!(config.validate(), Err(BlockError::Config(_))));
    }
}
