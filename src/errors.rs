//! Error types for chunkpost

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for chunkpost
#[derive(Error, Debug)]
pub enum ChunkpostError {
    /// The resource to scan could not be opened; the scan never started.
    #[error("Cannot open {}: {source}", .path.display())]
    ResourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A read failed part-way through a scan; the scan was halted.
    #[error("Read failed at byte offset {position}: {source}")]
    ReadFailure {
        position: u64,
        #[source]
        source: std::io::Error,
    },

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error("Lock error: {0}")]
    Lock(String),

    #[error("Cannot bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Job request failed: {0}")]
    Job(String),
}

pub type Result<T> = std::result::Result<T, ChunkpostError>;
