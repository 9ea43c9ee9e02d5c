//! Track-list derivation for the streaming BGM format.
//!
//! Two member files drive the output: the PCM format table (`thbgm.fmt`)
//! holding per-track positions, and the Shift-JIS comment file
//! (`musiccmt.txt`) holding display titles. This crate parses both, pairs
//! them, and renders the canonical `start,intro,loop,title` listing with
//! an optional readme-derived product header.

mod comment;
mod error;
mod info;
mod locate;
mod output;
mod records;

pub use comment::{parse_comment, Track};
pub use error::{Error, Result};
pub use info::{check_additional_info, GameInfo};
pub use locate::{find_dat_file, find_dat_in_dir, is_dat_candidate};
pub use output::{output_file_name, render, write_with_bom};
pub use records::{parse_fmt, PcmRecord};
