//! The second container generation: a keystream-masked directory of fixed
//! 32-byte records with 8.3 names and per-entry XOR keys.

use moonarc_common::BinaryReader;
use zerocopy::little_endian::{U16, U32};
use zerocopy::{FromBytes, Immutable, KnownLayout, Unaligned};

use crate::crypto::{xor_keystream, xor_with};
use crate::entry::Entry;
use crate::formats::payload;
use crate::{Error, Result};

const HEADER_SIZE: usize = 16;
const RECORD_SIZE: usize = 32;

const MAGIC_A: u16 = 0x9595;
const MAGIC_B: u16 = 0xF388;

/// On-disk directory record, after keystream removal.
#[derive(FromBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
struct RawEntry {
    magic: U16,
    key: u8,
    name: [u8; 13],
    comp_size: U16,
    orig_size: U16,
    offset: U32,
    padding: [u8; 8],
}

/// Characters permitted in an 8.3 name component.
fn is_name_char(c: u8) -> bool {
    c >= b' ' && !matches!(c, b'+' | b',' | b';' | b'=' | b'[' | b']' | b'.')
}

/// Validate a raw 13-byte name field against the classic 8.3 policy and
/// return the trimmed name: up to 8 base characters, an optional dot with
/// 1..=3 extension characters, null terminated.
fn validate_name(name: &[u8; 13]) -> Option<String> {
    let mut base = 0;
    while base < 8 && base < name.len() && is_name_char(name[base]) {
        base += 1;
    }

    let mut ext = 0;
    if base < name.len() && name[base] == b'.' {
        ext = 1;
        while ext < 4 && base + ext < name.len() && is_name_char(name[base + ext]) {
            ext += 1;
        }
    } else {
        // Without a dot the rest of the field must be null padding.
        if name[base..].iter().any(|&c| c != 0) {
            return None;
        }
    }

    if base + ext >= name.len() || name[base + ext] != 0 {
        return None;
    }
    if base == 0 || (ext == 1 && name[base] == b'.') {
        return None;
    }

    Some(String::from_utf8_lossy(&name[..base + ext]).into_owned())
}

/// Parse the header and decode the directory.
pub(crate) fn parse(data: &[u8]) -> Result<Vec<Entry>> {
    if data.len() < HEADER_SIZE {
        return Err(Error::InvalidHeader(format!(
            "file too small: {} bytes",
            data.len()
        )));
    }

    let mut reader = BinaryReader::new(data);
    let list_total = reader.read_u16()? as usize;
    reader.advance(2);
    let entry_count = reader.read_u16()? as usize;
    let list_key = reader.read_u8()?;

    if list_total > data.len() {
        return Err(Error::InvalidHeader(format!(
            "directory size {list_total} exceeds file size {}",
            data.len()
        )));
    }
    if list_total & 0x1F != 0 || list_total / RECORD_SIZE < entry_count {
        return Err(Error::InvalidHeader(format!(
            "directory size {list_total} inconsistent with {entry_count} entries"
        )));
    }
    if list_total < HEADER_SIZE {
        return Err(Error::InvalidHeader(format!(
            "directory size {list_total} smaller than the header"
        )));
    }

    let mut list = data[HEADER_SIZE..list_total].to_vec();
    xor_keystream(&mut list, list_key);

    let mut entries = Vec::with_capacity(entry_count);
    for index in 0..entry_count {
        let start = index * RECORD_SIZE;
        if start >= list.len() && index > 0 {
            break;
        }
        let record = list
            .get(start..start + RECORD_SIZE)
            .and_then(|raw| RawEntry::read_from_bytes(raw).ok())
            .ok_or_else(|| Error::InvalidDirectory(format!("short record {index}")))?;

        let magic = record.magic.get();
        if magic == 0 {
            break;
        }
        if magic != MAGIC_A && magic != MAGIC_B {
            return Err(Error::InvalidDirectory(format!(
                "record {index} has magic {magic:#06x}"
            )));
        }

        let name = validate_name(&record.name).ok_or_else(|| Error::InvalidEntry {
            index,
            reason: "name violates the 8.3 policy".into(),
        })?;

        let offset = record.offset.get();
        let comp_size = record.comp_size.get();
        if offset as usize >= data.len() {
            return Err(Error::InvalidEntry {
                index,
                reason: format!("offset {offset:#x} past end of file"),
            });
        }
        if data.len() - (offset as usize) < comp_size as usize {
            return Err(Error::InvalidEntry {
                index,
                reason: format!("payload {offset:#x}+{comp_size:#x} past end of file"),
            });
        }

        entries.push(Entry::new(
            name,
            offset,
            u32::from(record.orig_size.get()),
            u32::from(comp_size),
            record.key,
        ));
    }

    if entries.is_empty() && entry_count > 0 {
        return Err(Error::InvalidDirectory("no valid entries".into()));
    }
    Ok(entries)
}

/// Members are stored XORed with their per-entry key.
pub(crate) fn extract(data: &[u8], entry: &Entry) -> Result<Vec<u8>> {
    let mut out = payload(data, entry)?.to_vec();
    xor_with(&mut out, entry.key());
    Ok(out)
}
