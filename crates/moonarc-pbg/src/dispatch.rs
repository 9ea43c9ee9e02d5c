//! Variant selection: explicit type codes, filename-guided guessing, and
//! the probe-every-reader fallback.

use std::path::Path;

use crate::archive::DatArchive;
use crate::{Error, Result};

/// The supported container variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Hinanawi,
    Yukari,
    Yumemi,
    Kaguya,
    Marisa,
    Kanako,
    Suica,
}

impl Format {
    /// Probe order. Cheap single-header formats come first.
    pub const ALL: [Format; 7] = [
        Format::Yumemi,
        Format::Suica,
        Format::Hinanawi,
        Format::Yukari,
        Format::Marisa,
        Format::Kaguya,
        Format::Kanako,
    ];

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            Format::Hinanawi => "Hinanawi",
            Format::Yukari => "Yukari",
            Format::Yumemi => "Yumemi",
            Format::Kaguya => "Kaguya",
            Format::Marisa => "Marisa",
            Format::Kanako => "Kanako",
            Format::Suica => "Suica",
        }
    }

    /// Whether the variant carries sub-type crypt tables.
    pub fn has_sub_types(self) -> bool {
        matches!(self, Format::Kaguya | Format::Kanako)
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A filename-derived expectation: the variant and, where applicable, its
/// sub-type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Guess {
    pub format: Format,
    pub sub_type: Option<u8>,
}

/// Extract the game number from a `thNN...` file name.
///
/// `th128.dat` yields 128, `th095.dat` yields 95. Returns `None` when the
/// base name does not start with `th` followed by digits.
pub fn game_number(filename: &str) -> Option<u32> {
    let base = Path::new(filename).file_name()?.to_str()?.to_lowercase();
    let digits: String = base
        .strip_prefix("th")?
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Whether a file name marks a trial distribution.
///
/// The marker is the substring `tr` anywhere in the base name, matching
/// names like `th06tr.dat` and `thbgm_tr.fmt`.
pub fn is_trial(filename: &str) -> bool {
    Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.to_lowercase().contains("tr"))
        .unwrap_or(false)
}

/// Map a game number to the expected variant and sub-type.
pub fn guess_from_filename(filename: &str) -> Option<Guess> {
    let (format, sub_type) = match game_number(filename)? {
        6 => (Format::Hinanawi, None),
        7 => (Format::Yumemi, None),
        8 => (Format::Kaguya, Some(0)),
        9 => (Format::Kaguya, Some(1)),
        10 | 11 | 95 => (Format::Kanako, Some(0)),
        12 | 125 | 128 => (Format::Kanako, Some(1)),
        n if n >= 13 => (Format::Kanako, Some(2)),
        _ => return None,
    };
    Some(Guess { format, sub_type })
}

/// Resolve an explicit type code.
///
/// Only the sub-typed variants are selectable this way: 0 and 1 pick the
/// Kaguya tables, 2 picks the newest Kanako table. The remaining Kanako
/// tables and the type-less variants are reached through the file name.
fn explicit_selection(code: u32) -> Result<(Format, u8)> {
    match code {
        0 => Ok((Format::Kaguya, 0)),
        1 => Ok((Format::Kaguya, 1)),
        2 => Ok((Format::Kanako, 2)),
        other => Err(Error::UnknownTypeCode(other)),
    }
}

/// Open an archive with an optional explicit type code.
pub fn open<P: AsRef<Path>>(path: P, type_code: Option<u32>) -> Result<DatArchive> {
    match type_code {
        Some(code) => open_explicit(path, code),
        None => open_auto(path),
    }
}

/// Open an archive as the variant selected by an explicit type code.
/// Failures propagate; there is no fallback.
pub fn open_explicit<P: AsRef<Path>>(path: P, code: u32) -> Result<DatArchive> {
    let (format, sub_type) = explicit_selection(code)?;
    let archive = DatArchive::open_as(path, format, sub_type)?;
    if archive.is_empty() {
        return Err(Error::EmptyArchive);
    }
    Ok(archive)
}

/// Open an archive, deciding the variant from the file name and, failing
/// that, by probing every reader.
pub fn open_auto<P: AsRef<Path>>(path: P) -> Result<DatArchive> {
    let path = path.as_ref();
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();

    let guess = guess_from_filename(&filename);

    if let Some(g) = guess {
        if let Ok(archive) = DatArchive::open_as(path, g.format, g.sub_type.unwrap_or(0)) {
            if !archive.is_empty() {
                return Ok(archive);
            }
        }
    }

    // Probe every reader and keep those that open with at least one entry.
    let survivors: Vec<Format> = Format::ALL
        .into_iter()
        .filter(|&format| {
            DatArchive::open_as(path, format, 0)
                .map(|archive| !archive.is_empty())
                .unwrap_or(false)
        })
        .collect();

    let chosen = match survivors.as_slice() {
        [] => return Err(Error::FormatNotRecognized(path.display().to_string())),
        [only] => *only,
        several => {
            let by_name = guess.map(|g| g.format);
            match by_name.filter(|f| several.contains(f)) {
                Some(format) => format,
                None => {
                    return Err(Error::AmbiguousFormat {
                        path: path.display().to_string(),
                        candidates: several
                            .iter()
                            .map(|f| f.name())
                            .collect::<Vec<_>>()
                            .join(", "),
                    })
                }
            }
        }
    };

    let sub_type = if chosen.has_sub_types() {
        guess
            .filter(|g| g.format == chosen)
            .and_then(|g| g.sub_type)
            .ok_or(Error::SubTypeRequired(chosen))?
    } else {
        0
    };

    // Reopen the final selection as a fresh instance so no probing state
    // leaks into the archive handed to the caller.
    let archive = DatArchive::open_as(path, chosen, sub_type)?;
    if archive.is_empty() {
        return Err(Error::EmptyArchive);
    }
    Ok(archive)
}
