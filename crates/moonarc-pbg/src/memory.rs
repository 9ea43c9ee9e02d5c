//! Extraction of a set of named members into memory.

use rustc_hash::FxHashMap;

use crate::archive::DatArchive;
use crate::cancel::CancelToken;
use crate::Result;

/// The outcome of [`extract_to_memory`]: decoded members keyed by their
/// entry names, plus the targets that never appeared in the directory.
#[derive(Debug, Default)]
pub struct MemoryExtraction {
    pub files: FxHashMap<String, Vec<u8>>,
    pub missing: Vec<String>,
}

impl MemoryExtraction {
    /// Look up a decoded member by name, case-insensitively.
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.files
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_slice())
    }
}

/// Walk the directory in order and decode every entry whose name matches
/// one of `targets`, case-insensitively.
///
/// Stops as soon as all targets are found. A failed extraction of a found
/// target aborts with that error; targets absent from the directory are
/// reported in `missing` rather than treated as errors.
pub fn extract_to_memory<S: AsRef<str>>(
    archive: &DatArchive,
    targets: &[S],
    cancel: &CancelToken,
) -> Result<MemoryExtraction> {
    let mut pending: Vec<&str> = targets.iter().map(|s| s.as_ref()).collect();
    let mut files = FxHashMap::default();

    for entry in archive.iter() {
        if pending.is_empty() {
            break;
        }
        cancel.check()?;

        if let Some(found) = pending
            .iter()
            .position(|t| entry.name().eq_ignore_ascii_case(t))
        {
            let data = archive.read(entry)?;
            files.insert(entry.name().to_string(), data);
            pending.swap_remove(found);
        }
    }

    Ok(MemoryExtraction {
        files,
        missing: pending.into_iter().map(String::from).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::Format;
    use crate::testutil::{build_hinanawi, write_dat};
    use crate::Error;

    fn sample_archive(dir: &tempfile::TempDir) -> DatArchive {
        let bytes = build_hinanawi(&[
            ("thbgm.fmt", b"fmt contents"),
            ("musiccmt.txt", b"cmt contents"),
            ("extra.bin", b"unrelated"),
        ]);
        let path = write_dat(dir, "th06.dat", &bytes);
        DatArchive::open_as(path, Format::Hinanawi, 0).unwrap()
    }

    #[test]
    fn test_finds_targets_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        let archive = sample_archive(&dir);

        let out =
            extract_to_memory(&archive, &["THBGM.FMT", "musiccmt.txt"], &CancelToken::new())
                .unwrap();

        assert!(out.missing.is_empty());
        assert_eq!(out.files.len(), 2);
        // Keys are the entry names as stored.
        assert_eq!(out.files["thbgm.fmt"], b"fmt contents");
        assert_eq!(out.get("MUSICCMT.TXT").unwrap(), b"cmt contents");
    }

    #[test]
    fn test_missing_targets_are_not_errors() {
        let dir = tempfile::tempdir().unwrap();
        let archive = sample_archive(&dir);

        let out = extract_to_memory(
            &archive,
            &["thbgm.fmt", "not-there.txt"],
            &CancelToken::new(),
        )
        .unwrap();

        assert_eq!(out.files.len(), 1);
        assert_eq!(out.missing, ["not-there.txt"]);
    }

    #[test]
    fn test_cancellation() {
        let dir = tempfile::tempdir().unwrap();
        let archive = sample_archive(&dir);

        let cancel = CancelToken::new();
        cancel.cancel();
        assert!(matches!(
            extract_to_memory(&archive, &["thbgm.fmt"], &cancel),
            Err(Error::Cancelled)
        ));
    }
}
