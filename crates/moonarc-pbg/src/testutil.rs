//! Test-only builders: a bit writer, an all-literal LZSS encoder, the
//! inverse of the block transform, and synthetic archives for every
//! container variant.

use std::path::PathBuf;

use crate::crypto::{xor_accel_keystream, xor_keystream, xor_with, CryptParams, Mt19937};
use crate::formats::{kaguya, kanako};

/// MSB-first bit writer, the mirror of `decompress::BitReader`.
pub(crate) struct BitWriter {
    bytes: Vec<u8>,
    bit: u32,
}

impl BitWriter {
    pub(crate) fn new() -> Self {
        Self {
            bytes: Vec::new(),
            bit: 0,
        }
    }

    pub(crate) fn push(&mut self, value: u32, count: u32) {
        for i in (0..count).rev() {
            if self.bit == 0 {
                self.bytes.push(0);
            }
            let bit = ((value >> i) & 1) as u8;
            *self.bytes.last_mut().unwrap() |= bit << (7 - self.bit);
            self.bit = (self.bit + 1) % 8;
        }
    }

    /// The zero-offset pattern marker that ends an LZSS stream.
    pub(crate) fn terminate_lzss(&mut self) {
        self.push(0, 1);
        self.push(0, 13);
    }

    pub(crate) fn finish(self) -> Vec<u8> {
        self.bytes
    }
}

/// Encode bytes as an all-literal LZSS stream. Always longer than its
/// input, which conveniently keeps stored and original sizes distinct.
pub(crate) fn lzss_encode(data: &[u8]) -> Vec<u8> {
    let mut w = BitWriter::new();
    for &b in data {
        w.push(1, 1);
        w.push(u32::from(b), 8);
    }
    w.terminate_lzss();
    w.finish()
}

/// Inverse of `crypto::thcrypt`: produce input whose decode equals `plain`.
pub(crate) fn thcrypt_encode(
    plain: &[u8],
    key: u8,
    step: u8,
    block: usize,
    limit: usize,
) -> Vec<u8> {
    let size = plain.len();
    let mut tail = size % block;
    if tail >= block / 4 {
        tail = 0;
    }
    tail += size % 2;

    let mut remaining = size.saturating_sub(tail);
    let mut limit = limit;
    let mut key = key;
    let mut out = Vec::with_capacity(size);
    let mut pos = 0usize;

    while remaining > 0 && limit > 0 {
        let b = block.min(remaining).min(limit);
        let mut chunk = vec![0u8; b];
        let mut pin = 0usize;
        for j in 0..2 {
            for i in 0..(b - j + 1) / 2 {
                chunk[pin] = plain[pos + (b - j - 1 - 2 * i)] ^ key;
                pin += 1;
                key = key.wrapping_add(step);
            }
        }
        out.extend_from_slice(&chunk);
        pos += b;
        remaining -= b;
        limit -= b;
    }

    out.extend_from_slice(&plain[pos..]);
    out
}

pub(crate) fn build_hinanawi(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let list_size: usize = entries.iter().map(|(name, _)| 9 + name.len()).sum();
    let mut offset = 6 + list_size;
    let mut list = Vec::new();
    let mut payloads = Vec::new();

    for (name, content) in entries {
        list.extend_from_slice(&(offset as u32).to_le_bytes());
        list.extend_from_slice(&(content.len() as u32).to_le_bytes());
        list.push(name.len() as u8);
        list.extend_from_slice(name.as_bytes());
        payloads.extend_from_slice(content);
        offset += content.len();
    }

    let mut data = Vec::new();
    data.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    data.extend_from_slice(&(list_size as u32).to_le_bytes());
    data.extend_from_slice(&list);
    data.extend_from_slice(&payloads);
    data
}

pub(crate) fn build_yukari(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let base = 16usize;
    let mut payloads = Vec::new();
    let mut metas = Vec::new();
    for (_, content) in entries {
        let blob = lzss_encode(content);
        metas.push((base + payloads.len(), content.len()));
        payloads.extend_from_slice(&blob);
    }

    let list_offset = base + payloads.len();
    let mut list = Vec::new();
    for ((name, _), (offset, orig_len)) in entries.iter().zip(&metas) {
        list.extend_from_slice(name.as_bytes());
        list.push(0);
        list.extend_from_slice(&(*offset as u32).to_le_bytes());
        list.extend_from_slice(&(*orig_len as u32).to_le_bytes());
        list.extend_from_slice(&0u32.to_le_bytes());
    }
    let comp_list = lzss_encode(&list);

    let mut data = Vec::new();
    data.extend_from_slice(&0x3447_4250u32.to_le_bytes());
    data.extend_from_slice(&(entries.len() as u32).to_le_bytes());
    data.extend_from_slice(&(list_offset as u32).to_le_bytes());
    data.extend_from_slice(&(comp_list.len() as u32).to_le_bytes());
    data.extend_from_slice(&payloads);
    data.extend_from_slice(&comp_list);
    data
}

/// One plaintext Yumemi directory record.
pub(crate) fn yumemi_record(name: &str, key: u8, comp: u16, orig: u16, offset: u32) -> [u8; 32] {
    let mut rec = [0u8; 32];
    rec[0..2].copy_from_slice(&0x9595u16.to_le_bytes());
    rec[2] = key;
    rec[3..3 + name.len()].copy_from_slice(name.as_bytes());
    rec[16..18].copy_from_slice(&comp.to_le_bytes());
    rec[18..20].copy_from_slice(&orig.to_le_bytes());
    rec[20..24].copy_from_slice(&offset.to_le_bytes());
    rec
}

pub(crate) fn build_yumemi(entries: &[(&str, u8, &[u8])]) -> Vec<u8> {
    let list_key = 0x34u8;
    let count = entries.len();
    // Record slots plus header-sized padding keeps the total a multiple
    // of 32 with room for every record.
    let list_total = 16 + 32 * count + 16;

    let mut offset = list_total;
    let mut list = Vec::new();
    let mut payloads = Vec::new();
    for (name, key, content) in entries {
        list.extend_from_slice(&yumemi_record(
            name,
            *key,
            content.len() as u16,
            content.len() as u16,
            offset as u32,
        ));
        payloads.extend_from_slice(content);
        offset += content.len();
    }
    list.resize(list_total - 16, 0);
    xor_keystream(&mut list, list_key);

    let mut data = Vec::new();
    data.extend_from_slice(&(list_total as u16).to_le_bytes());
    data.extend_from_slice(&[0; 2]);
    data.extend_from_slice(&(count as u16).to_le_bytes());
    data.push(list_key);
    data.extend_from_slice(&[0; 9]);
    data.extend_from_slice(&list);
    data.extend_from_slice(&payloads);
    data
}

pub(crate) fn build_kaguya(entries: &[(&str, &[u8])], sub_type: u8, tag: u8) -> Vec<u8> {
    // Members with a tag outside the table still need some stored form;
    // extraction fails at the tag lookup before decryption matters.
    let params = kaguya::table(sub_type)
        .iter()
        .find(|(t, _)| *t == tag)
        .map(|(_, p)| *p)
        .unwrap_or(CryptParams {
            key: 0,
            step: 0,
            block: 0x40,
            limit: 0x10000,
        });

    let base = 16usize;
    let mut payloads = Vec::new();
    let mut metas = Vec::new();
    for (_, content) in entries {
        let body = thcrypt_encode(content, params.key, params.step, params.block, params.limit);
        let mut inner = Vec::with_capacity(body.len() + 4);
        inner.extend_from_slice(kaguya::INNER_MAGIC);
        inner.push(tag);
        inner.extend_from_slice(&body);
        let blob = lzss_encode(&inner);
        metas.push((base + payloads.len(), content.len()));
        payloads.extend_from_slice(&blob);
    }

    let list_offset = base + payloads.len();
    let mut list = Vec::new();
    for ((name, _), (offset, orig_len)) in entries.iter().zip(&metas) {
        list.extend_from_slice(name.as_bytes());
        list.push(0);
        list.extend_from_slice(&(*offset as u32).to_le_bytes());
        list.extend_from_slice(&(*orig_len as u32 + 4).to_le_bytes());
        list.extend_from_slice(&0u32.to_le_bytes());
    }
    let enc_list = thcrypt_encode(&lzss_encode(&list), 0x3E, 0x9B, 0x80, 0x400);

    let mut header = Vec::new();
    header.extend_from_slice(&(entries.len() as u32).wrapping_add(123_456).to_le_bytes());
    header.extend_from_slice(&(list_offset as u32).wrapping_add(345_678).to_le_bytes());
    header.extend_from_slice(&(enc_list.len() as u32).wrapping_add(567_891).to_le_bytes());
    let enc_header = thcrypt_encode(&header, 0x1B, 0x37, 0x0C, 0x400);

    let mut data = Vec::new();
    data.extend_from_slice(&0x5A47_4250u32.to_le_bytes());
    data.extend_from_slice(&enc_header);
    data.extend_from_slice(&payloads);
    data.extend_from_slice(&enc_list);
    data
}

pub(crate) fn build_kanako(entries: &[(&str, &[u8])], sub_type: u8) -> Vec<u8> {
    let table = kanako::table(sub_type);
    let base = 16usize;
    let mut payloads = Vec::new();
    let mut metas = Vec::new();
    for (name, content) in entries {
        let params = table[kanako::crypt_index(name)];
        let blob = lzss_encode(content);
        let enc = thcrypt_encode(&blob, params.key, params.step, params.block, params.limit);
        metas.push((base + payloads.len(), content.len()));
        payloads.extend_from_slice(&enc);
    }

    let mut list = Vec::new();
    for ((name, _), (offset, orig_len)) in entries.iter().zip(&metas) {
        let bytes = name.as_bytes();
        list.extend_from_slice(bytes);
        // 1..=4 null bytes so the terminating 4-byte chunk contains a null.
        list.extend(std::iter::repeat(0u8).take(4 - bytes.len() % 4));
        list.extend_from_slice(&(*offset as u32).to_le_bytes());
        list.extend_from_slice(&(*orig_len as u32).to_le_bytes());
        list.extend_from_slice(&0u32.to_le_bytes());
    }
    let comp_list = lzss_encode(&list);
    let enc_list = thcrypt_encode(&comp_list, 0x3E, 0x9B, 0x80, comp_list.len());

    let mut head = Vec::new();
    head.extend_from_slice(&0x3141_4854u32.to_le_bytes());
    head.extend_from_slice(&(list.len() as u32).wrapping_add(123_456_789).to_le_bytes());
    head.extend_from_slice(&(enc_list.len() as u32).wrapping_add(987_654_321).to_le_bytes());
    head.extend_from_slice(&(entries.len() as u32).wrapping_add(135_792_468).to_le_bytes());
    let enc_head = thcrypt_encode(&head, 0x1B, 0x37, 0x10, 0x10);

    let mut data = Vec::new();
    data.extend_from_slice(&enc_head);
    data.extend_from_slice(&payloads);
    data.extend_from_slice(&enc_list);
    data
}

/// Which mask a synthetic Marisa directory is written with.
pub(crate) enum MarisaMask {
    Mt,
    Arithmetic,
    None,
}

pub(crate) fn build_marisa(entries: &[(&str, &[u8])], mask: MarisaMask) -> Vec<u8> {
    let list_size: usize = entries.iter().map(|(name, _)| 9 + name.len()).sum();
    let mut offset = 6 + list_size;
    let mut list = Vec::new();
    let mut payloads = Vec::new();

    for (name, content) in entries {
        list.extend_from_slice(&(offset as u32).to_le_bytes());
        list.extend_from_slice(&(content.len() as u32).to_le_bytes());
        list.push(name.len() as u8);
        list.extend_from_slice(name.as_bytes());

        let key = (((offset as u32) >> 1) | 0x23) as u8;
        let mut stored = content.to_vec();
        xor_with(&mut stored, key);
        payloads.extend_from_slice(&stored);
        offset += content.len();
    }

    match mask {
        MarisaMask::Mt => {
            let mut mt = Mt19937::new(list_size as u32 + 6);
            for b in list.iter_mut() {
                *b ^= mt.next_u32() as u8;
            }
        }
        MarisaMask::Arithmetic => xor_accel_keystream(&mut list, 0xC5, 0x89, 0x49),
        MarisaMask::None => {}
    }

    let mut data = Vec::new();
    data.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    data.extend_from_slice(&(list_size as u32).to_le_bytes());
    data.extend_from_slice(&list);
    data.extend_from_slice(&payloads);
    data
}

pub(crate) fn build_suica(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let list_size = entries.len() * 0x6C;
    let mut offset = 2 + list_size;
    let mut list = Vec::new();
    let mut payloads = Vec::new();

    for (name, content) in entries {
        let mut rec = [0u8; 0x6C];
        rec[..name.len()].copy_from_slice(name.as_bytes());
        rec[0x64..0x68].copy_from_slice(&(content.len() as u32).to_le_bytes());
        rec[0x68..0x6C].copy_from_slice(&(offset as u32).to_le_bytes());
        list.extend_from_slice(&rec);
        payloads.extend_from_slice(content);
        offset += content.len();
    }
    xor_accel_keystream(&mut list, 0x64, 0x64, 0x4D);

    let mut data = Vec::new();
    data.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    data.extend_from_slice(&list);
    data.extend_from_slice(&payloads);
    data
}

/// A byte sequence accepted by both the Suica and Hinanawi readers.
///
/// Starts from a well-formed single-entry Suica archive, then rewrites the
/// leading bytes of its encrypted record so the same region also reads as
/// a Hinanawi directory. The Suica size and offset fields live past the
/// rewritten window and survive; the record's name merely changes.
pub(crate) fn build_dual_accept() -> Vec<u8> {
    let mut data = build_suica(&[("seed.bin", &[0u8; 4])]);
    let file_len = data.len() as u32;

    let mut window = [0u8; 14];
    window[0..4].copy_from_slice(&12u32.to_le_bytes()); // directory size
    window[4..8].copy_from_slice(&(file_len - 4).to_le_bytes()); // entry offset
    window[8..12].copy_from_slice(&4u32.to_le_bytes()); // entry size
    window[12] = 1; // name length
    window[13] = b'x';
    data[2..16].copy_from_slice(&window);
    data
}

/// Write archive bytes under a chosen file name inside a temp directory.
pub(crate) fn write_dat(dir: &tempfile::TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}
