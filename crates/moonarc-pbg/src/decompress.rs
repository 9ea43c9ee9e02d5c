//! Bit-level reading and the compression schemes used inside the containers.
//!
//! Directories and members use a 13-bit-offset / 4-bit-length LZSS variant
//! over an 8 KiB circular dictionary. The RLE scheme is part of the same
//! codec family; no current container variant stores RLE data.

use crate::{Error, Result};

/// Dictionary size of the LZSS variant.
pub const DICT_SIZE: usize = 0x2000;

/// Result of a single [`BitReader::read`] call.
///
/// `eof` is set when the stream ended before the requested number of bits
/// accumulated; `value` then holds the bits that were available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitRead {
    pub value: u32,
    pub eof: bool,
}

/// MSB-first bit reader over a byte slice.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    byte: usize,
    bit: u32,
}

impl<'a> BitReader<'a> {
    /// Create a reader positioned at the first bit of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            byte: 0,
            bit: 0,
        }
    }

    /// Read `count` bits (1..=32), most significant first.
    ///
    /// Crossing a byte boundary pulls the next byte. Running out of input
    /// returns the partial value with `eof` set rather than an error; the
    /// caller decides whether that is fatal.
    pub fn read(&mut self, count: u32) -> Result<BitRead> {
        if count == 0 || count > 32 {
            return Err(Error::InvalidBitCount(count));
        }

        let mut value = 0u32;
        for _ in 0..count {
            if self.byte >= self.data.len() {
                return Ok(BitRead { value, eof: true });
            }
            let bit = (self.data[self.byte] >> (7 - self.bit)) & 1;
            value = (value << 1) | u32::from(bit);
            self.bit += 1;
            if self.bit == 8 {
                self.bit = 0;
                self.byte += 1;
            }
        }

        Ok(BitRead { value, eof: false })
    }

    /// Number of whole bytes consumed so far (a partially read byte counts).
    pub fn bytes_consumed(&self) -> usize {
        self.byte + usize::from(self.bit != 0)
    }
}

/// Decompress an LZSS stream.
///
/// Control loop: a set flag bit introduces an 8-bit literal; a clear flag
/// bit introduces a 13-bit dictionary offset (zero terminates the stream)
/// and a 4-bit length, copying `length + 3` bytes. Every emitted byte is
/// also written back at the advancing dictionary position, which starts at
/// index 1.
pub fn unlzss(input: &[u8]) -> Result<Vec<u8>> {
    unlzss_sized(input, 0)
}

/// Decompress an LZSS stream into a buffer pre-sized for `expected` bytes.
pub fn unlzss_sized(input: &[u8], expected: usize) -> Result<Vec<u8>> {
    let mut dict = [0u8; DICT_SIZE];
    let mut dict_pos = 1usize;
    let mut out = Vec::with_capacity(expected);
    let mut bits = BitReader::new(input);

    loop {
        let flag = bits.read(1)?;
        if flag.eof {
            return Err(Error::TruncatedStream);
        }

        if flag.value == 1 {
            let literal = bits.read(8)?;
            if literal.eof {
                return Err(Error::TruncatedStream);
            }
            let b = literal.value as u8;
            out.push(b);
            dict[dict_pos] = b;
            dict_pos = (dict_pos + 1) % DICT_SIZE;
        } else {
            let pat_ofs = bits.read(13)?;
            // A zero offset is the terminator and wins over a same-read EOF.
            if pat_ofs.value == 0 {
                return Ok(out);
            }
            if pat_ofs.eof {
                return Err(Error::TruncatedStream);
            }

            let pat_len = bits.read(4)?;
            if pat_len.eof {
                return Err(Error::TruncatedStream);
            }

            for i in 0..pat_len.value as usize + 3 {
                let b = dict[(pat_ofs.value as usize + i) % DICT_SIZE];
                out.push(b);
                dict[dict_pos] = b;
                dict_pos = (dict_pos + 1) % DICT_SIZE;
            }
        }
    }
}

/// Expand a run-length-encoded stream.
///
/// Every input byte is emitted as-is. Whenever the two most recently
/// emitted bytes are equal, the next input byte is a repeat count for that
/// byte; the pair tracking resets after a run so an expansion does not
/// immediately retrigger itself.
pub fn unrle(input: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(input.len());
    let mut prev: Option<u8> = None;
    let mut pos = 0usize;

    while pos < input.len() {
        let b = input[pos];
        pos += 1;
        out.push(b);

        if prev == Some(b) {
            let count = *input.get(pos).ok_or(Error::MissingRunCount)?;
            pos += 1;
            for _ in 0..count {
                out.push(b);
            }
            prev = None;
        } else {
            prev = Some(b);
        }
    }

    Ok(out)
}
