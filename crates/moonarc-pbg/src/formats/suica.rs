//! The alternate layout of the tenth-generation era: fixed 108-byte
//! directory records behind an accelerating keystream, verbatim payloads.

use zerocopy::little_endian::U32;
use zerocopy::{FromBytes, Immutable, KnownLayout, Unaligned};

use crate::crypto::xor_accel_keystream;
use crate::entry::Entry;
use crate::formats::{name_from_bytes, payload};
use crate::{Error, Result};

const HEADER_SIZE: usize = 2;
const RECORD_SIZE: usize = 0x6C;
const NAME_FIELD: usize = 0x64;

const LIST_KEY: u8 = 0x64;
const LIST_STEP: u8 = 0x64;
const LIST_ACCEL: u8 = 0x4D;

/// On-disk directory record, after keystream removal.
#[derive(FromBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
struct RawEntry {
    name: [u8; NAME_FIELD],
    size: U32,
    offset: U32,
}

/// Parse the header and decode the directory.
pub(crate) fn parse(data: &[u8]) -> Result<Vec<Entry>> {
    if data.len() < HEADER_SIZE {
        return Err(Error::InvalidHeader(format!(
            "file too small: {} bytes",
            data.len()
        )));
    }

    let entry_count = u16::from_le_bytes([data[0], data[1]]) as usize;
    let list_size = entry_count * RECORD_SIZE;

    if entry_count == 0 || HEADER_SIZE + list_size > data.len() {
        return Err(Error::InvalidHeader(format!(
            "{entry_count} records do not fit in a {} byte file",
            data.len()
        )));
    }

    let mut list = data[HEADER_SIZE..HEADER_SIZE + list_size].to_vec();
    xor_accel_keystream(&mut list, LIST_KEY, LIST_STEP, LIST_ACCEL);

    let mut entries = Vec::with_capacity(entry_count);
    for (index, raw) in list.chunks_exact(RECORD_SIZE).enumerate() {
        let record = RawEntry::read_from_bytes(raw)
            .map_err(|_| Error::InvalidDirectory(format!("short record {index}")))?;

        let nul = record
            .name
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(NAME_FIELD);
        if nul == 0 {
            return Err(Error::InvalidEntry {
                index,
                reason: "empty name".into(),
            });
        }
        let name = name_from_bytes(&record.name[..nul]);

        let offset = record.offset.get();
        let size = record.size.get();
        if (offset as usize) < HEADER_SIZE + list_size || offset as usize > data.len() {
            return Err(Error::InvalidEntry {
                index,
                reason: format!("offset {offset:#x} outside the data region"),
            });
        }
        if size as usize > data.len() - offset as usize {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::build_suica;

    #[test]
    fn test_round_trip() {
        let data = build_suica(&[("bgm/th10_01.wav", b"wav data"), ("enemy.anm", &[7u8; 64])]);

        let entries = parse(&data).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name(), "bgm/th10_01.wav");
        assert_eq!(entries[1].name(), "enemy.anm");
        assert_eq!(extract(&data, &entries[0]).unwrap(), b"wav data");
        assert_eq!(extract(&data, &entries[1]).unwrap(), vec![7u8; 64]);
    }

    #[test]
    fn test_empty_file_and_zero_count() {
        assert!(parse(&[]).is_err());
        assert!(matches!(parse(&[0, 0]), Err(Error::InvalidHeader(_))));
    }

    #[test]
    fn test_count_larger_than_file() {
        assert!(matches!(
            parse(&[0xFF, 0xFF, 1, 2, 3]),
            Err(Error::InvalidHeader(_))
        ));
    }
}
