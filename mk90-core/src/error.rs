//! Error types for volume operations.

use thiserror::Error;

/// Errors that can occur while reading or editing a volume image.
#[derive(Error, Debug)]
pub enum VolumeError {
    #[error("Malformed image: {0}")]
    MalformedImage(String),

    #[error("Invalid volume parameters: {0}")]
    InvalidParams(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("File already exists: {0}")]
    FileAlreadyExists(String),

    #[error("Directory table is full")]
    DirectoryFull,

    #[error("No free slot large enough for {needed} cluster(s)")]
    InsufficientFreeSpace { needed: u16 },

    #[error("Volume size can't exceed {} clusters", crate::N_CLUSTERS_MAX)]
    CapacityExceeded,

    #[error("Invalid trim: {0}")]
    InvalidTrim(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for volume operations.
pub type VolumeResult<T> = Result<T, VolumeError>;
