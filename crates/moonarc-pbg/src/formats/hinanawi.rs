//! The earliest container generation: a plain directory right after the
//! header and verbatim member payloads. No crypto, no compression.

use moonarc_common::BinaryReader;

use crate::entry::Entry;
use crate::formats::{name_from_bytes, payload};
use crate::{Error, Result};

const HEADER_SIZE: usize = 6;

/// Parse the header and directory.
///
/// Layout: `u16 list_count, u32 list_size`, then `list_size` bytes of
/// records `u32 offset, u32 size, u8 name_len, name`.
pub(crate) fn parse(data: &[u8]) -> Result<Vec<Entry>> {
    if data.len() < HEADER_SIZE {
        return Err(Error::InvalidHeader(format!(
            "file too small: {} bytes",
            data.len()
        )));
    }

    let mut reader = BinaryReader::new(data);
    let list_count = reader.read_u16()? as usize;
    let list_size = reader.read_u32()? as usize;

    if list_count == 0 || list_size == 0 {
        return Err(Error::InvalidHeader(
            "zero entry count or directory size".into(),
        ));
    }
    if data.len() < HEADER_SIZE + list_size {
        return Err(Error::InvalidHeader(format!(
            "directory of {list_size} bytes does not fit in a {} byte file",
            data.len()
        )));
    }

    let list = &data[HEADER_SIZE..HEADER_SIZE + list_size];
    let mut reader = BinaryReader::new(list);
    let mut entries = Vec::new();

    for index in 0..list_count {
        let offset = reader.read_u32()?;
        let size = reader.read_u32()?;
        let name_len = reader.read_u8()? as usize;
        let name = name_from_bytes(reader.read_bytes(name_len)?);

        if name.is_empty() {
            return Err(Error::InvalidEntry {
                index,
                reason: "empty name".into(),
            });
        }
        let data_start = (HEADER_SIZE + list_size) as u32;
        if offset < data_start || offset as usize > data.len() {
            return Err(Error::InvalidEntry {
                index,
                reason: format!("offset {offset:#x} outside the data region"),
            });
        }
        if u64::from(offset) + u64::from(size) > data.len() as u64 {
            return Err(Error::InvalidEntry {
                index,
                reason: format!("payload {offset:#x}+{size:#x} past end of file"),
            });
        }

        entries.push(Entry::new(name, offset, size, size, 0));
    }

    Ok(entries)
}

/// Members are stored as-is.
pub(crate) fn extract(data: &[u8], entry: &Entry) -> Result<Vec<u8>> {
    Ok(payload(data, entry)?.to_vec())
}
