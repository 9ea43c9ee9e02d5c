//! The `THA1` container generation used from the tenth game onward. Three
//! sub-types share the layout and differ only in their crypt tables.

use moonarc_common::BinaryReader;

use crate::crypto::{thcrypt, CryptParams};
use crate::decompress::unlzss_sized;
use crate::entry::Entry;
use crate::formats::{name_from_bytes, payload};
use crate::{Error, Result};

/// Container signature, "THA1" read as a little-endian u32 after header
/// decryption.
pub(crate) const MAGIC: u32 = 0x3141_4854;

const HEADER_SIZE: usize = 0x10;
const HEADER_KEY: u8 = 0x1B;
const HEADER_STEP: u8 = 0x37;
const HEADER_BLOCK: usize = 0x10;
const HEADER_LIMIT: usize = 0x10;

const LIST_SIZE_BIAS: u32 = 123_456_789;
const LIST_COMP_SIZE_BIAS: u32 = 987_654_321;
const FILE_COUNT_BIAS: u32 = 135_792_468;

const LIST_KEY: u8 = 0x3E;
const LIST_STEP: u8 = 0x9B;
const LIST_BLOCK: usize = 0x80;

/// Crypt rows for sub-type 0 (generations 10-11 and the 95 spin-off).
pub(crate) const CRYPT_TABLE_0: [CryptParams; 8] = [
    CryptParams { key: 0x1B, step: 0x37, block: 0x40, limit: 0x2800 },
    CryptParams { key: 0x51, step: 0xE9, block: 0x40, limit: 0x3000 },
    CryptParams { key: 0xC1, step: 0x51, block: 0x80, limit: 0x3200 },
    CryptParams { key: 0x03, step: 0x19, block: 0x400, limit: 0x7800 },
    CryptParams { key: 0xAB, step: 0xCD, block: 0x200, limit: 0x2800 },
    CryptParams { key: 0x12, step: 0x34, block: 0x80, limit: 0x3200 },
    CryptParams { key: 0x35, step: 0x97, block: 0x80, limit: 0x2800 },
    CryptParams { key: 0x99, step: 0x37, block: 0x400, limit: 0x2000 },
];

/// Crypt rows for sub-type 1 (generation 12 and its derivatives).
pub(crate) const CRYPT_TABLE_1: [CryptParams; 8] = [
    CryptParams { key: 0x1B, step: 0x73, block: 0x40, limit: 0x3800 },
    CryptParams { key: 0x51, step: 0x9E, block: 0x40, limit: 0x4000 },
    CryptParams { key: 0xC1, step: 0x15, block: 0x400, limit: 0x2C00 },
    CryptParams { key: 0x03, step: 0x91, block: 0x80, limit: 0x6400 },
    CryptParams { key: 0xAB, step: 0xDC, block: 0x80, limit: 0x6E00 },
    CryptParams { key: 0x12, step: 0x43, block: 0x200, limit: 0x3C00 },
    CryptParams { key: 0x35, step: 0x79, block: 0x400, limit: 0x3C00 },
    CryptParams { key: 0x99, step: 0x7D, block: 0x80, limit: 0x2800 },
];

/// Crypt rows for sub-type 2 (generation 13 onward).
pub(crate) const CRYPT_TABLE_2: [CryptParams; 8] = [
    CryptParams { key: 0x1B, step: 0x73, block: 0x0100, limit: 0x3800 },
    CryptParams { key: 0x12, step: 0x43, block: 0x0200, limit: 0x3E00 },
    CryptParams { key: 0x35, step: 0x79, block: 0x0400, limit: 0x3C00 },
    CryptParams { key: 0x03, step: 0x91, block: 0x0080, limit: 0x6400 },
    CryptParams { key: 0xAB, step: 0xDC, block: 0x0080, limit: 0x6E00 },
    CryptParams { key: 0x51, step: 0x9E, block: 0x0100, limit: 0x4000 },
    CryptParams { key: 0xC1, step: 0x15, block: 0x0400, limit: 0x2C00 },
    CryptParams { key: 0x99, step: 0x7D, block: 0x0080, limit: 0x4400 },
];

/// Select the crypt table for a sub-type.
pub(crate) fn table(sub_type: u8) -> &'static [CryptParams; 8] {
    match sub_type {
        1 => &CRYPT_TABLE_1,
        2 => &CRYPT_TABLE_2,
        _ => &CRYPT_TABLE_0,
    }
}

/// Crypt row index for a member: the byte sum of its name, modulo 8.
pub(crate) fn crypt_index(name: &str) -> usize {
    usize::from(name.bytes().fold(0u8, |acc, b| acc.wrapping_add(b)) & 7)
}

/// Parse the header and decode the directory.
pub(crate) fn parse(data: &[u8]) -> Result<Vec<Entry>> {
    if data.len() < HEADER_SIZE {
        return Err(Error::InvalidHeader(format!(
            "file too small: {} bytes",
            data.len()
        )));
    }

    let head = thcrypt(
        &data[..HEADER_SIZE],
        HEADER_KEY,
        HEADER_STEP,
        HEADER_BLOCK,
        HEADER_LIMIT,
    );
    let mut reader = BinaryReader::new(&head);

    let magic = reader.read_u32()?;
    if magic != MAGIC {
        return Err(Error::InvalidMagic {
            expected: MAGIC,
            actual: magic,
        });
    }

    let list_size = reader.read_u32()?.wrapping_sub(LIST_SIZE_BIAS);
    let list_comp_size = reader.read_u32()?.wrapping_sub(LIST_COMP_SIZE_BIAS);
    let file_count = reader.read_u32()?.wrapping_sub(FILE_COUNT_BIAS);

    if list_comp_size as usize > data.len() {
        return Err(Error::InvalidHeader(format!(
            "directory of {list_comp_size} bytes does not fit in a {} byte file",
            data.len()
        )));
    }

    let list_offset = data.len() - list_comp_size as usize;
    let crypted = &data[list_offset..];
    let decrypted = thcrypt(crypted, LIST_KEY, LIST_STEP, LIST_BLOCK, list_comp_size as usize);
    let list = unlzss_sized(&decrypted, list_size as usize)
        .map_err(|e| Error::InvalidDirectory(format!("decompress: {e}")))?;

    let mut reader = BinaryReader::new(&list);
    let mut entries = Vec::new();
    for index in 0..file_count as usize {
        let name = read_aligned_name(&mut reader)
            .map_err(|e| Error::InvalidDirectory(format!("entry {index} name: {e}")))?;
        let offset = reader.read_u32()?;
        let orig_size = reader.read_u32()?;
        let _padding = reader.read_u32()?;

        if offset as usize > list_offset {
            return Err(Error::InvalidEntry {
                index,
                reason: format!("offset {offset:#x} inside the directory"),
            });
        }

        entries.push(Entry::new(name, offset, orig_size, 0, 0));
    }

    derive_comp_sizes(&mut entries, list_offset as u32)?;
    Ok(entries)
}

/// Names are stored in 4-byte chunks; the chunk containing the null
/// terminator ends the name.
fn read_aligned_name(reader: &mut BinaryReader<'_>) -> moonarc_common::Result<String> {
    let mut bytes = Vec::new();
    loop {
        let chunk = reader.read_bytes(4)?;
        match chunk.iter().position(|&b| b == 0) {
            Some(nul) => {
                bytes.extend_from_slice(&chunk[..nul]);
                return Ok(name_from_bytes(&bytes));
            }
            None => bytes.extend_from_slice(chunk),
        }
    }
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

/// Decrypt with the name-hashed crypt row, then decompress unless the
/// member was stored uncompressed (equal sizes).
pub(crate) fn extract(data: &[u8], entry: &Entry, table: &[CryptParams; 8]) -> Result<Vec<u8>> {
    let comp = payload(data, entry)?;
    let params = table[crypt_index(entry.name())];
    let decrypted = thcrypt(comp, params.key, params.step, params.block, params.limit);

    if entry.compressed_size() == entry.original_size() {
        Ok(decrypted)
    } else {
        unlzss_sized(&decrypted, entry.original_size() as usize)
    }
}
