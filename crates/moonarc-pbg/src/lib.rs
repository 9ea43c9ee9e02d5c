//! Readers for the `.dat` resource containers used across the Touhou
//! series.
//!
//! Six incompatible container variants span the numbered generations, and
//! a seventh (`PBG4`) is recognised by probing. All share the
//! open/enumerate/extract shape but differ in header layout, directory
//! encoding, and per-member decode pipelines built from a small set of
//! codecs (an LZSS variant, XOR keystreams, an interleaved block
//! transform, MT19937).
//!
//! # Example
//!
//! ```no_run
//! use moonarc_pbg::DatArchive;
//!
//! let archive = DatArchive::open("th13.dat", None)?;
//! for entry in archive.iter() {
//!     println!("{}: {} bytes", entry.name(), entry.original_size());
//! }
//! let bytes = archive.read_by_name("thbgm.fmt")?;
//! # Ok::<(), moonarc_pbg::Error>(())
//! ```

mod archive;
mod cancel;
pub mod crypto;
pub mod decompress;
mod dispatch;
mod entry;
mod error;
mod formats;
mod memory;
#[cfg(test)]
mod testutil;

pub use archive::DatArchive;
pub use cancel::CancelToken;
pub use dispatch::{
    game_number, guess_from_filename, is_trial, open, open_auto, open_explicit, Format, Guess,
};
pub use entry::Entry;
pub use error::{Error, Result};
pub use memory::{extract_to_memory, MemoryExtraction};
