//! Error types for the track-list crate.

use thiserror::Error;

/// Errors produced while locating inputs or writing the track list.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// More than one candidate archive was found during discovery.
    #[error("multiple .dat archives found: {0}; specify one explicitly")]
    MultipleDatFiles(String),
}

/// Result type for track-list operations.
pub type Result<T> = std::result::Result<T, Error>;
