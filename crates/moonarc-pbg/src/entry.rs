//! A directory entry of an opened archive.

/// One member of a .dat archive.
///
/// This is metadata only; use [`DatArchive::read`] to obtain the decoded
/// bytes.
///
/// [`DatArchive::read`]: crate::DatArchive::read
#[derive(Debug, Clone)]
pub struct Entry {
    /// Member name as stored in the directory.
    name: String,
    /// Absolute byte offset of the member payload.
    offset: u32,
    /// Decoded size.
    orig_size: u32,
    /// Stored size. Equal to `orig_size` for variants without compression.
    comp_size: u32,
    /// Per-entry key byte. Only meaningful for the Yumemi variant.
    key: u8,
}

impl Entry {
    pub(crate) fn new(name: String, offset: u32, orig_size: u32, comp_size: u32, key: u8) -> Self {
        Self {
            name,
            offset,
            orig_size,
            comp_size,
            key,
        }
    }

    /// Member name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Absolute payload offset within the container.
    #[inline]
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Size of the member after decoding.
    #[inline]
    pub fn original_size(&self) -> u32 {
        self.orig_size
    }

    /// Size of the member as stored.
    #[inline]
    pub fn compressed_size(&self) -> u32 {
        self.comp_size
    }

    #[inline]
    pub(crate) fn key(&self) -> u8 {
        self.key
    }

    pub(crate) fn set_comp_size(&mut self, comp_size: u32) {
        self.comp_size = comp_size;
    }
}
