//! The `PBG4` container of the seventh game's era: a plain header, a
//! compressed directory at the end of the file, and members stored as
//! bare LZSS streams. Only reachable through probing; the numbered main
//! games use the other layouts.

use moonarc_common::BinaryReader;

use crate::decompress::{unlzss, unlzss_sized};
use crate::entry::Entry;
use crate::formats::{name_from_bytes, payload};
use crate::{Error, Result};

/// Container signature, "PBG4" read as a little-endian u32.
pub(crate) const MAGIC: u32 = 0x3447_4250;

const HEADER_SIZE: usize = 16;

/// Parse the header and decode the directory.
///
/// Header: `u32 magic, u32 entry_count, u32 list_offset, u32 list_size`.
/// The directory runs from `list_offset` to end of file and decompresses
/// to records of c-string name, `u32 offset, u32 size, u32 extra`.
pub(crate) fn parse(data: &[u8]) -> Result<Vec<Entry>> {
    if data.len() < HEADER_SIZE {
        return Err(Error::InvalidHeader(format!(
            "file too small: {} bytes",
            data.len()
        )));
    }

    let mut reader = BinaryReader::new(data);
    let magic = reader.read_u32()?;
    if magic != MAGIC {
        return Err(Error::InvalidMagic {
            expected: MAGIC,
            actual: magic,
        });
    }

    let entry_count = reader.read_u32()? as usize;
    let list_offset = reader.read_u32()?;
    let _list_size = reader.read_u32()?;

    if list_offset as usize > data.len() {
        return Err(Error::InvalidHeader(format!(
            "directory offset {list_offset:#x} past end of file"
        )));
    }

    let list = unlzss(&data[list_offset as usize..])
        .map_err(|e| Error::InvalidDirectory(format!("decompress: {e}")))?;

    let mut reader = BinaryReader::new(&list);
    let mut entries = Vec::new();
    for index in 0..entry_count {
        let name = name_from_bytes(
            reader
                .read_cstring_bytes()
                .map_err(|e| Error::InvalidDirectory(format!("entry {index} name: {e}")))?,
        );
        let offset = reader.read_u32()?;
        let orig_size = reader.read_u32()?;
        let _extra = reader.read_u32()?;

        if offset > list_offset {
            return Err(Error::InvalidEntry {
                index,
                reason: format!("offset {offset:#x} inside the directory"),
            });
        }

        entries.push(Entry::new(name, offset, orig_size, 0, 0));
    }

    derive_comp_sizes(&mut entries, list_offset)?;

    if entries.is_empty() && entry_count > 0 {
        return Err(Error::InvalidDirectory("no valid entries".into()));
    }
    Ok(entries)
}

fn derive_comp_sizes(entries: &mut [Entry], list_offset: u32) -> Result<()> {
    for index in 0..entries.len() {
        let end = if index + 1 < entries.len() {
            entries[index + 1].offset()
        } else {
            list_offset
        };
        let start = entries[index].offset();
        if end < start {
            return Err(Error::InvalidDirectory(format!(
                "entry offsets not increasing at {index}"
            )));
        }
        entries[index].set_comp_size(end - start);
    }
    Ok(())
}

/// Members are bare LZSS streams.
pub(crate) fn extract(data: &[u8], entry: &Entry) -> Result<Vec<u8>> {
    let comp = payload(data, entry)?;
    unlzss_sized(comp, entry.original_size() as usize)
}
