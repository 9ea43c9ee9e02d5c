//! The archive front: one type over all supported container variants.
//!
//! An open archive owns a memory map of the file plus the fully parsed
//! directory. Extraction takes `&self` and touches no shared cursor, so
//! extracting two entries concurrently behaves exactly like extracting
//! them in sequence.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use memmap2::Mmap;

use crate::dispatch::{self, Format};
use crate::entry::Entry;
use crate::formats::{hinanawi, kaguya, kanako, marisa, suica, yukari, yumemi};
use crate::{Error, Result};

/// An opened .dat archive of any supported variant.
pub struct DatArchive {
    mmap: Mmap,
    name: String,
    format: Format,
    sub_type: u8,
    entries: Vec<Entry>,
}

impl DatArchive {
    /// Open an archive, picking the variant automatically or honoring an
    /// explicit type code (see [`crate::dispatch`]).
    pub fn open<P: AsRef<Path>>(path: P, type_code: Option<u32>) -> Result<Self> {
        dispatch::open(path, type_code)
    }

    /// Open an archive as a specific variant and sub-type.
    ///
    /// The file handle is scope-bound: any parse failure drops the map and
    /// leaves nothing half-open.
    pub fn open_as<P: AsRef<Path>>(path: P, format: Format, sub_type: u8) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        let entries = match format {
            Format::Hinanawi => hinanawi::parse(&mmap)?,
            Format::Yukari => yukari::parse(&mmap)?,
            Format::Yumemi => yumemi::parse(&mmap)?,
            Format::Kaguya => kaguya::parse(&mmap)?,
            Format::Marisa => marisa::parse(&mmap)?,
            Format::Kanako => kanako::parse(&mmap)?,
            Format::Suica => suica::parse(&mmap)?,
        };

        Ok(Self {
            mmap,
            name,
            format,
            sub_type,
            entries,
        })
    }

    /// The archive's file name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The detected or requested variant.
    #[inline]
    pub fn format(&self) -> Format {
        self.format
    }

    /// The sub-type in effect (0 for variants without sub-types).
    #[inline]
    pub fn sub_type(&self) -> u8 {
        self.sub_type
    }

    /// Number of directory entries.
    #[inline]
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Whether the directory is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The directory, in stored (= offset) order.
    #[inline]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Iterate over the directory in stored order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Entry> + '_ {
        self.entries.iter()
    }

    /// Find an entry by name, case-insensitively.
    pub fn find(&self, name: &str) -> Option<&Entry> {
        self.entries
            .iter()
            .find(|e| e.name().eq_ignore_ascii_case(name))
    }

    /// Decode one member into a fresh buffer.
    pub fn read(&self, entry: &Entry) -> Result<Vec<u8>> {
        match self.format {
            Format::Hinanawi => hinanawi::extract(&self.mmap, entry),
            Format::Yukari => yukari::extract(&self.mmap, entry),
            Format::Yumemi => yumemi::extract(&self.mmap, entry),
            Format::Kaguya => kaguya::extract(&self.mmap, entry, kaguya::table(self.sub_type)),
            Format::Marisa => marisa::extract(&self.mmap, entry),
            Format::Kanako => kanako::extract(&self.mmap, entry, kanako::table(self.sub_type)),
            Format::Suica => suica::extract(&self.mmap, entry),
        }
    }

    /// Decode a member by name.
    pub fn read_by_name(&self, name: &str) -> Result<Vec<u8>> {
        let entry = self
            .find(name)
            .ok_or_else(|| Error::EntryNotFound(name.to_string()))?;
        self.read(entry)
    }

    /// Decode one member into a writer.
    pub fn extract_to(&self, entry: &Entry, sink: &mut dyn Write) -> Result<()> {
        let data = self.read(entry)?;
        sink.write_all(&data)?;
        Ok(())
    }
}

impl std::fmt::Debug for DatArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatArchive")
            .field("name", &self.name)
            .field("format", &self.format)
            .field("sub_type", &self.sub_type)
            .field("entries", &self.entries.len())
            .finish()
    }
}
