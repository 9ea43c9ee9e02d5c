//! Moonarc - Touhou .dat archive reading and BGM track-list tooling.
//!
//! This crate provides a unified interface to the moonarc ecosystem:
//!
//! - [`moonarc_common`] - binary reading utilities
//! - [`moonarc_pbg`] - the container variant readers, dispatch, and
//!   in-memory extraction
//! - [`moonarc_titles`] - track-list derivation from extracted members
//!
//! # Example
//!
//! ```no_run
//! use moonarc::prelude::*;
//!
//! let archive = DatArchive::open("th13.dat", None)?;
//! let extracted = extract_to_memory(
//!     &archive,
//!     &["thbgm.fmt", "musiccmt.txt"],
//!     &CancelToken::new(),
//! )?;
//! if let Some(fmt) = extracted.get("thbgm.fmt") {
//!     let records = parse_fmt(fmt);
//!     println!("{} tracks", records.len());
//! }
//! # Ok::<(), moonarc::pbg::Error>(())
//! ```

// Re-export all sub-crates
pub use moonarc_common as common;
pub use moonarc_pbg as pbg;
pub use moonarc_titles as titles;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use moonarc_common::BinaryReader;
    pub use moonarc_pbg::{
        extract_to_memory, game_number, guess_from_filename, is_trial, CancelToken, DatArchive,
        Entry, Format, MemoryExtraction,
    };
    pub use moonarc_titles::{
        check_additional_info, find_dat_file, output_file_name, parse_comment, parse_fmt, render,
        write_with_bom, GameInfo, PcmRecord, Track,
    };
}

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
