//! Error types for the archive crate.

use thiserror::Error;

use crate::dispatch::Format;

/// Errors that can occur when opening or extracting a .dat archive.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common reading error.
    #[error("{0}")]
    Common(#[from] moonarc_common::Error),

    /// Magic bytes did not match the expected container signature.
    #[error("invalid magic: expected {expected:#010x}, got {actual:#010x}")]
    InvalidMagic { expected: u32, actual: u32 },

    /// Header fields were internally inconsistent or impossible.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// The decrypted directory did not parse into valid entries.
    #[error("invalid directory: {0}")]
    InvalidDirectory(String),

    /// A single directory entry failed validation.
    #[error("invalid entry {index}: {reason}")]
    InvalidEntry { index: usize, reason: String },

    /// An entry's payload range lies outside the file.
    #[error("entry {name}: payload {offset:#x}+{len:#x} exceeds file size {file_len:#x}")]
    PayloadOutOfBounds {
        name: String,
        offset: u32,
        len: u32,
        file_len: usize,
    },

    /// A decompressed member was missing its inner signature.
    #[error("entry {name}: missing 'edz' signature after decompression")]
    MissingInnerMagic { name: String },

    /// No crypt parameter row matched the member's data-type tag.
    #[error("entry {name}: unknown data type {tag:#04x}")]
    UnknownDataType { name: String, tag: u8 },

    /// Bit count outside the supported 1..=32 range.
    #[error("bit count {0} out of range (1..=32)")]
    InvalidBitCount(u32),

    /// A compressed stream ended before its terminator.
    #[error("compressed data ended before the terminator")]
    TruncatedStream,

    /// A run-length count byte was missing at end of stream.
    #[error("run-length count missing at end of stream")]
    MissingRunCount,

    /// No candidate format accepted the file.
    #[error("no supported archive format accepted {0}")]
    FormatNotRecognized(String),

    /// Several formats accepted the file and the name did not disambiguate.
    #[error("multiple formats accepted {path} ({candidates}); pass an explicit archive type")]
    AmbiguousFormat { path: String, candidates: String },

    /// The explicit archive type code is not selectable.
    #[error("archive type {0} is unknown or needs no type selection")]
    UnknownTypeCode(u32),

    /// The chosen format needs a sub-type that could not be inferred.
    #[error("{0} archives need a sub-type that could not be inferred from the file name")]
    SubTypeRequired(Format),

    /// The archive opened but contains no entries.
    #[error("archive contains no entries")]
    EmptyArchive,

    /// A named member was not present in the archive.
    #[error("entry not found: {0}")]
    EntryNotFound(String),

    /// Cooperative cancellation fired.
    #[error("operation cancelled")]
    Cancelled,
}

/// Result type for archive operations.
pub type Result<T> = std::result::Result<T, Error>;
