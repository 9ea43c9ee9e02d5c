//! Discovery of a game archive near the tool.

use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Whether a file name looks like a game archive: `th` + digits +
/// optional `tr` + `.dat`. The streaming BGM container is excluded.
pub fn is_dat_candidate(name: &str) -> bool {
    if name == "thbgm.dat" {
        return false;
    }
    let Some(rest) = name.strip_prefix("th") else {
        return false;
    };
    let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return false;
    }
    let tail = &rest[digits..];
    tail == ".dat" || tail == "tr.dat"
}

/// Find the single candidate archive in a directory.
///
/// Zero candidates is `None`; more than one is an error naming them all.
pub fn find_dat_in_dir(dir: &Path) -> Result<Option<PathBuf>> {
    let mut found = Vec::new();

    for dir_entry in std::fs::read_dir(dir)? {
        let dir_entry = dir_entry?;
        if dir_entry.file_type()?.is_dir() {
            continue;
        }
        if let Some(name) = dir_entry.file_name().to_str() {
            if is_dat_candidate(name) {
                found.push(dir_entry.path());
            }
        }
    }

    found.sort();
    match found.len() {
        0 => Ok(None),
        1 => Ok(found.pop()),
        _ => Err(Error::MultipleDatFiles(
            found
                .iter()
                .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
                .collect::<Vec<_>>()
                .join(", "),
        )),
    }
}

/// Search the working directory first, then the executable's directory.
pub fn find_dat_file() -> Result<Option<PathBuf>> {
    let cwd = std::env::current_dir()?;
    if let Some(path) = find_dat_in_dir(&cwd)? {
        return Ok(Some(path));
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(exe_dir) = exe.parent() {
            if exe_dir != cwd {
                return find_dat_in_dir(exe_dir);
            }
        }
    }

    Ok(None)
}
