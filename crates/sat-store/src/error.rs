//! Error types for satellite store access.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading, writing or copying a satellite store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No store exists at the given path.
    #[error("satellite store not found: {0}")]
    NotFound(PathBuf),

    /// Zipped stores must be unpacked before use.
    #[error("zipped satellite stores are not supported, unzip {} first", .0.display())]
    ZippedStore(PathBuf),

    /// Zarr format error.
    #[error("Zarr format error: {0}")]
    Zarr(String),

    /// Filesystem error.
    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),

    /// The store or dataset does not have the expected shape.
    #[error("invalid store layout: {0}")]
    InvalidLayout(String),

    /// The consolidated summary could not be (de)serialized.
    #[error("invalid store metadata: {0}")]
    Metadata(#[from] serde_json::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// Create a Zarr error.
    pub fn zarr(msg: impl ToString) -> Self {
        Self::Zarr(msg.to_string())
    }

    /// Create an InvalidLayout error.
    pub fn invalid_layout(msg: impl Into<String>) -> Self {
        Self::InvalidLayout(msg.into())
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
