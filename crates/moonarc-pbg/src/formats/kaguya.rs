//! The `PBGZ` container generation: biased encrypted header, an encrypted
//! and compressed directory, and members that decompress to an `edz`-tagged
//! buffer whose tag selects a crypt parameter row.

use moonarc_common::BinaryReader;

use crate::crypto::{thcrypt, CryptParams};
use crate::decompress::{unlzss, unlzss_sized};
use crate::entry::Entry;
use crate::formats::{name_from_bytes, payload};
use crate::{Error, Result};

/// Container signature, "PBGZ" read as a little-endian u32.
pub(crate) const MAGIC: u32 = 0x5A47_4250;

const HEADER_SIZE: usize = 12;
const HEADER_KEY: u8 = 0x1B;
const HEADER_STEP: u8 = 0x37;
const HEADER_BLOCK: usize = 0x0C;
const HEADER_LIMIT: usize = 0x400;

const FILE_COUNT_BIAS: u32 = 123_456;
const LIST_OFFSET_BIAS: u32 = 345_678;
const LIST_SIZE_BIAS: u32 = 567_891;

const LIST_KEY: u8 = 0x3E;
const LIST_STEP: u8 = 0x9B;
const LIST_BLOCK: usize = 0x80;
const LIST_LIMIT: usize = 0x400;

/// Members decompress to this signature plus a data-type tag byte.
pub(crate) const INNER_MAGIC: &[u8; 3] = b"edz";

/// Stored original sizes include the inner signature.
const ORIG_SIZE_ADJUST: u32 = 4;

/// Crypt rows for sub-type 0, indexed by data-type tag.
pub(crate) const CRYPT_TABLE_0: [(u8, CryptParams); 8] = [
    (0x4D, CryptParams { key: 0x1B, step: 0x37, block: 0x40, limit: 0x2000 }),
    (0x54, CryptParams { key: 0x51, step: 0xE9, block: 0x40, limit: 0x3000 }),
    (0x41, CryptParams { key: 0xC1, step: 0x51, block: 0x1400, limit: 0x2000 }),
    (0x4A, CryptParams { key: 0x03, step: 0x19, block: 0x1400, limit: 0x7800 }),
    (0x45, CryptParams { key: 0xAB, step: 0xCD, block: 0x200, limit: 0x1000 }),
    (0x57, CryptParams { key: 0x12, step: 0x34, block: 0x400, limit: 0x2800 }),
    (0x2D, CryptParams { key: 0x35, step: 0x97, block: 0x80, limit: 0x2800 }),
    (0x2A, CryptParams { key: 0x99, step: 0x37, block: 0x400, limit: 0x1000 }),
];

/// Crypt rows for sub-type 1 (the photography spin-off).
pub(crate) const CRYPT_TABLE_1: [(u8, CryptParams); 8] = [
    (0x4D, CryptParams { key: 0x1B, step: 0x37, block: 0x40, limit: 0x2800 }),
    (0x54, CryptParams { key: 0x51, step: 0xE9, block: 0x40, limit: 0x3000 }),
    (0x41, CryptParams { key: 0xC1, step: 0x51, block: 0x400, limit: 0x400 }),
    (0x4A, CryptParams { key: 0x03, step: 0x19, block: 0x400, limit: 0x400 }),
    (0x45, CryptParams { key: 0xAB, step: 0xCD, block: 0x200, limit: 0x1000 }),
    (0x57, CryptParams { key: 0x12, step: 0x34, block: 0x400, limit: 0x400 }),
    (0x2D, CryptParams { key: 0x35, step: 0x97, block: 0x80, limit: 0x2800 }),
    (0x2A, CryptParams { key: 0x99, step: 0x37, block: 0x400, limit: 0x1000 }),
];

/// Select the crypt table for a sub-type.
pub(crate) fn table(sub_type: u8) -> &'static [(u8, CryptParams); 8] {
    if sub_type == 0 {
        &CRYPT_TABLE_0
    } else {
        &CRYPT_TABLE_1
    }
}

/// Parse the header and decode the directory.
pub(crate) fn parse(data: &[u8]) -> Result<Vec<Entry>> {
    if data.len() < 4 + HEADER_SIZE {
        return Err(Error::InvalidHeader(format!(
            "file too small: {} bytes",
            data.len()
        )));
    }

    let magic = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
    if magic != MAGIC {
        return Err(Error::InvalidMagic {
            expected: MAGIC,
            actual: magic,
        });
    }

    let head = thcrypt(
        &data[4..4 + HEADER_SIZE],
        HEADER_KEY,
        HEADER_STEP,
        HEADER_BLOCK,
        HEADER_LIMIT,
    );
    let mut reader = BinaryReader::new(&head);
    let file_count = reader.read_u32()?.wrapping_sub(FILE_COUNT_BIAS);
    let list_offset = reader.read_u32()?.wrapping_sub(LIST_OFFSET_BIAS);
    let _list_size = reader.read_u32()?.wrapping_sub(LIST_SIZE_BIAS);

    if list_offset as usize >= data.len() {
        return Err(Error::InvalidHeader(format!(
            "directory offset {list_offset:#x} past end of file"
        )));
    }

    let crypted = &data[list_offset as usize..];
    let decrypted = thcrypt(crypted, LIST_KEY, LIST_STEP, LIST_BLOCK, LIST_LIMIT);
    let list =
        unlzss(&decrypted).map_err(|e| Error::InvalidDirectory(format!("decompress: {e}")))?;

    let mut reader = BinaryReader::new(&list);
    let mut entries = Vec::new();
    for index in 0..file_count as usize {
        let name = name_from_bytes(
            reader
                .read_cstring_bytes()
                .map_err(|e| Error::InvalidDirectory(format!("entry {index} name: {e}")))?,
        );
        let offset = reader.read_u32()?;
        let orig_size = reader.read_u32()?.wrapping_sub(ORIG_SIZE_ADJUST);
        let _dummy = reader.read_u32()?;

        if offset as usize >= data.len() {
            return Err(Error::InvalidEntry {
                index,
                reason: format!("offset {offset:#x} past end of file"),
            });
        }

        entries.push(Entry::new(name, offset, orig_size, 0, 0));
    }

    derive_comp_sizes(&mut entries, list_offset)?;
    Ok(entries)
}

/// Stored sizes are implicit: each member runs to the next member's offset,
/// the last to the directory.
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

/// Decompress the member, check the inner signature, and decrypt with the
/// row matching its data-type tag.
pub(crate) fn extract(
    data: &[u8],
    entry: &Entry,
    table: &[(u8, CryptParams); 8],
) -> Result<Vec<u8>> {
    let comp = payload(data, entry)?;
    let buf = unlzss_sized(comp, entry.original_size() as usize + ORIG_SIZE_ADJUST as usize)?;

    if buf.len() < 4 || &buf[..3] != INNER_MAGIC {
        return Err(Error::MissingInnerMagic {
            name: entry.name().to_string(),
        });
    }

    let tag = buf[3];
    let params = table
        .iter()
        .find(|(t, _)| *t == tag)
        .map(|(_, p)| p)
        .ok_or_else(|| Error::UnknownDataType {
            name: entry.name().to_string(),
            tag,
        })?;

    Ok(params.apply(&buf[4..]))
}
