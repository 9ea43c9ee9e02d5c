//! Common utilities for the moonarc crates.
//!
//! - [`BinaryReader`] - cursor-style little-endian reading from byte slices
//! - [`Error`] / [`Result`] - the shared reading error type

mod error;
mod reader;

pub use error::{Error, Result};
pub use reader::BinaryReader;

/// Re-export zerocopy traits for fixed-layout directory records.
pub use zerocopy::{FromBytes, Immutable, KnownLayout, Unaligned};
