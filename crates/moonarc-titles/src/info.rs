//! Product information scraped from a `readme.txt` next to the archive.

use std::path::{Path, PathBuf};

use encoding_rs::SHIFT_JIS;

use crate::Result;

/// The trial marker inside a readme title line.
const TRIAL_MARKER: &str = " 体験版";

/// Readme-derived header data for the emitted track list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameInfo {
    /// The `@<thbgm path>,<title>` line.
    pub title_line: String,
    /// Product title with the trial marker stripped.
    pub display_title: String,
    /// Whether the readme describes a trial build.
    pub is_trial: bool,
}

/// Look for a readme and a companion BGM stream next to the archive.
///
/// Both must exist, and the readme's second line (Shift-JIS) must begin
/// with `○` or `東方`; otherwise there is no header to emit.
pub fn check_additional_info(archive_path: &Path) -> Result<Option<GameInfo>> {
    let dir = match archive_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let readme_path = dir.join("readme.txt");
    if !readme_path.is_file() {
        return Ok(None);
    }

    let thbgm_path = dir.join("thbgm.dat");
    let thbgm_tr_path = dir.join("thbgm_tr.dat");
    if !thbgm_path.is_file() && !thbgm_tr_path.is_file() {
        return Ok(None);
    }

    let readme_data = std::fs::read(&readme_path)?;
    let (text, _, _) = SHIFT_JIS.decode(&readme_data);

    let second_line = match text.lines().nth(1) {
        Some(line) => line.trim(),
        None => return Ok(None),
    };

    let title = if let Some(rest) = second_line.strip_prefix('○') {
        rest.to_string()
    } else if second_line.starts_with("東方") {
        second_line.to_string()
    } else {
        return Ok(None);
    };

    let bgm_path = if thbgm_path.is_file() {
        thbgm_path
    } else {
        thbgm_tr_path
    };

    let is_trial = title.contains(TRIAL_MARKER);
    let display_title = if is_trial {
        title.replacen(TRIAL_MARKER, "", 1)
    } else {
        title.clone()
    };

    Ok(Some(GameInfo {
        title_line: format!("@{},{}", bgm_path.display(), title),
        display_title,
        is_trial,
    }))
}
