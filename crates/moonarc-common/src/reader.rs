//! Cursor-style reading of little-endian binary data from byte slices.

use zerocopy::FromBytes;

use crate::{Error, Result};

/// A position-tracking reader over a borrowed byte slice.
///
/// All integer reads are little-endian, matching every container format in
/// this workspace.
///
/// # Example
///
/// ```
/// use moonarc_common::BinaryReader;
///
/// let data = [0x02, 0x00, 0x40, 0x00, 0x00, 0x00];
/// let mut reader = BinaryReader::new(&data);
///
/// assert_eq!(reader.read_u16().unwrap(), 2);
/// assert_eq!(reader.read_u32().unwrap(), 0x40);
/// assert!(reader.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct BinaryReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> BinaryReader<'a> {
    /// Create a reader positioned at the start of `data`.
    #[inline]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Current position in the buffer.
    #[inline]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Number of bytes left to read.
    #[inline]
    pub const fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Whether the reader has been exhausted.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.position >= self.data.len()
    }

    /// Skip `count` bytes without reading them.
    #[inline]
    pub fn advance(&mut self, count: usize) {
        self.position = self.position.saturating_add(count);
    }

    /// The unread tail of the buffer.
    #[inline]
    pub fn remaining_bytes(&self) -> &'a [u8] {
        &self.data[self.position.min(self.data.len())..]
    }

    /// Read `count` raw bytes.
    #[inline]
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        if self.remaining() < count {
            return Err(Error::UnexpectedEof {
                needed: count,
                available: self.remaining(),
            });
        }
        let bytes = &self.data[self.position..self.position + count];
        self.position += count;
        Ok(bytes)
    }

    /// Read a single byte.
    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        self.read_bytes(1).map(|b| b[0])
    }

    /// Read a little-endian u16.
    #[inline]
    pub fn read_u16(&mut self) -> Result<u16> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    /// Read a little-endian u32.
    #[inline]
    pub fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Read the raw bytes of a null-terminated string, consuming the
    /// terminator.
    pub fn read_cstring_bytes(&mut self) -> Result<&'a [u8]> {
        let rest = self.remaining_bytes();
        let nul = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or(Error::MissingNullTerminator)?;
        let bytes = &rest[..nul];
        self.position += nul + 1;
        Ok(bytes)
    }

    /// Read a null-terminated ASCII/UTF-8 string, consuming the terminator.
    pub fn read_cstring(&mut self) -> Result<&'a str> {
        let bytes = self.read_cstring_bytes()?;
        std::str::from_utf8(bytes).map_err(Error::Utf8)
    }

    /// Read a fixed-size buffer and return the string up to its first null.
    pub fn read_string_in_buffer(&mut self, buffer_size: usize) -> Result<&'a str> {
        let bytes = self.read_bytes(buffer_size)?;
        let nul = bytes.iter().position(|&b| b == 0).unwrap_or(buffer_size);
        std::str::from_utf8(&bytes[..nul]).map_err(Error::Utf8)
    }

    /// Read a fixed-layout struct using zerocopy.
    #[inline]
    pub fn read_struct<T: FromBytes>(&mut self) -> Result<T> {
        let size = std::mem::size_of::<T>();
        let bytes = self.read_bytes(size)?;
        T::read_from_bytes(bytes).map_err(|_| Error::UnexpectedEof {
            needed: size,
            available: bytes.len(),
        })
    }
}
