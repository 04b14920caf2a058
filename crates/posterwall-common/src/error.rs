//! Common error types used throughout posterwall.
//!
//! This module provides a unified error type for the failure cases that cross
//! crate boundaries: an unreachable share, an unreadable persisted index,
//! invalid configuration, and I/O or serialization failures.

/// Common error type for posterwall.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested entry was not found.
    #[error("Entry not found: {0}")]
    NotFound(String),

    /// The media share could not be listed. Fatal to the current scan cycle.
    #[error("Share unavailable: {0}")]
    ShareUnavailable(String),

    /// A persisted index record could not be read.
    #[error("Index corruption: {0}")]
    IndexCorruption(String),

    /// Configuration failed validation.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A value could not be serialized or deserialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a new NotFound error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new ShareUnavailable error.
    pub fn share_unavailable<S: Into<String>>(msg: S) -> Self {
        Self::ShareUnavailable(msg.into())
    }

    /// Create a new IndexCorruption error.
    pub fn index_corruption<S: Into<String>>(msg: S) -> Self {
        Self::IndexCorruption(msg.into())
    }

    /// Create a new InvalidConfig error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
