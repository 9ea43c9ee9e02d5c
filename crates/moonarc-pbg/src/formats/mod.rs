//! The six container layouts.
//!
//! Each module exposes `parse` (header + directory to an entry table) and
//! `extract` (one member payload to its decoded bytes). The front type in
//! [`crate::archive`] owns the mapped file and routes calls here.

pub(crate) mod hinanawi;
pub(crate) mod kaguya;
pub(crate) mod kanako;
pub(crate) mod marisa;
pub(crate) mod suica;
pub(crate) mod yukari;
pub(crate) mod yumemi;

use crate::entry::Entry;
use crate::{Error, Result};

/// Slice the stored payload window of an entry out of the mapped file.
pub(crate) fn payload<'a>(data: &'a [u8], entry: &Entry) -> Result<&'a [u8]> {
    let start = entry.offset() as usize;
    let len = entry.compressed_size() as usize;
    let end = start
        .checked_add(len)
        .filter(|&end| end <= data.len())
        .ok_or_else(|| Error::PayloadOutOfBounds {
            name: entry.name().to_string(),
            offset: entry.offset(),
            len: entry.compressed_size(),
            file_len: data.len(),
        })?;
    Ok(&data[start..end])
}

/// Decode a directory name that may contain non-UTF-8 bytes.
pub(crate) fn name_from_bytes(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
