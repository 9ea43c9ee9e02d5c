//! The photography-game container: a PRNG-masked directory with an
//! arithmetic-keystream fallback, and members XORed with an offset-derived
//! key.

use moonarc_common::BinaryReader;

use crate::crypto::{xor_accel_keystream, xor_with, Mt19937};
use crate::entry::Entry;
use crate::formats::{name_from_bytes, payload};
use crate::{Error, Result};

const HEADER_SIZE: usize = 6;

const FALLBACK_KEY: u8 = 0xC5;
const FALLBACK_STEP: u8 = 0x89;
const FALLBACK_ACCEL: u8 = 0x49;

/// Parse the header and decode the directory.
///
/// The directory is decrypted with MT19937 seeded by `list_size + 6`,
/// XORing each byte with the low byte of the next output. When the result
/// fails validation, the raw bytes are retried with the arithmetic
/// keystream. Trying MT first is part of the contract.
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

    let raw = &data[HEADER_SIZE..HEADER_SIZE + list_size];

    let mut masked = raw.to_vec();
    let mut mt = Mt19937::new(list_size as u32 + HEADER_SIZE as u32);
    for b in masked.iter_mut() {
        *b ^= mt.next_u32() as u8;
    }
    if let Ok(entries) = deserialize(&masked, list_count, list_size, data.len()) {
        return Ok(entries);
    }

    let mut masked = raw.to_vec();
    xor_accel_keystream(&mut masked, FALLBACK_KEY, FALLBACK_STEP, FALLBACK_ACCEL);
    deserialize(&masked, list_count, list_size, data.len())
        .map_err(|e| Error::InvalidDirectory(format!("both directory decryptions failed: {e}")))
}

fn deserialize(
    list: &[u8],
    list_count: usize,
    list_size: usize,
    file_len: usize,
) -> Result<Vec<Entry>> {
    let mut reader = BinaryReader::new(list);
    let mut entries = Vec::with_capacity(list_count);

    for index in 0..list_count {
        let offset = reader.read_u32()?;
        let size = reader.read_u32()?;
        let name_len = reader.read_u8()? as usize;
        let name = name_from_bytes(reader.read_bytes(name_len)?);

        if (offset as usize) < HEADER_SIZE + list_size || offset as usize > file_len {
            return Err(Error::InvalidEntry {
                index,
                reason: format!("offset {offset:#x} outside the data region"),
            });
        }
        if u64::from(offset) + u64::from(size) > file_len as u64 {
            return Err(Error::InvalidEntry {
                index,
                reason: format!("payload {offset:#x}+{size:#x} past end of file"),
            });
        }
        if name.is_empty() {
            return Err(Error::InvalidEntry {
                index,
                reason: "empty name".into(),
            });
        }

        entries.push(Entry::new(name, offset, size, size, 0));
    }

    Ok(entries)
}

/// Members are XORed with a key derived from their own offset.
pub(crate) fn extract(data: &[u8], entry: &Entry) -> Result<Vec<u8>> {
    let mut out = payload(data, entry)?.to_vec();
    let key = ((entry.offset() >> 1) | 0x23) as u8;
    xor_with(&mut out, key);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{build_marisa, MarisaMask};

    #[test]
    fn test_round_trip_mt_path() {
        let data = build_marisa(&[("card0.jpg", b"jpeg bytes")], MarisaMask::Mt);

        let entries = parse(&data).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name(), "card0.jpg");
        assert_eq!(extract(&data, &entries[0]).unwrap(), b"jpeg bytes");
    }

    #[test]
    fn test_round_trip_fallback_path() {
        // Directory masked with the arithmetic keystream; the MT attempt
        // must fail validation and the fallback must recover it.
        let data = build_marisa(&[("card1.jpg", b"other bytes")], MarisaMask::Arithmetic);

        let entries = parse(&data).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name(), "card1.jpg");
        assert_eq!(extract(&data, &entries[0]).unwrap(), b"other bytes");
    }

    #[test]
    fn test_unmasked_directory_rejected() {
        // A directory masked with neither scheme fails both paths.
        let data = build_marisa(&[("card2.jpg", b"x")], MarisaMask::None);
        assert!(matches!(parse(&data), Err(Error::InvalidDirectory(_))));
    }

    #[test]
    fn test_extract_key_derivation() {
        let data = build_marisa(&[("a.bin", &[0u8; 16])], MarisaMask::Mt);
        let entries = parse(&data).unwrap();
        let key = ((entries[0].offset() >> 1) | 0x23) as u8;
        assert_eq!(extract(&data, &entries[0]).unwrap(), vec![0u8; 16]);
        // Stored bytes are the member XORed with the offset-derived key.
        let stored = &data[entries[0].offset() as usize..][..16];
        assert!(stored.iter().all(|&b| b == key));
    }
}
