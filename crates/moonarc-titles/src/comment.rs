//! The music comment file (`musiccmt.txt`): Shift-JIS text pairing track
//! file names with display titles.

use encoding_rs::SHIFT_JIS;

/// One file-name/title pairing scanned from the comment file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub file_name: String,
    pub title: String,
}

/// Normalise a `@bgm/` name to the `.wav` form the format table uses.
/// The ninth game stores `.mid` names for its sequenced soundtrack.
fn normalize_file_name(raw: &str) -> String {
    if let Some(stem) = raw.strip_suffix(".mid") {
        format!("{stem}.wav")
    } else if raw.ends_with(".wav") {
        raw.to_string()
    } else {
        format!("{raw}.wav")
    }
}

/// Decode and scan a comment file.
///
/// A line starting `@bgm/` sets the current file name; a line starting
/// with the quarter-note character yields a `(file name, title)` pair.
/// When no quarter-note line exists anywhere, `No.X <title>` lines pair
/// with the most recent file name instead.
pub fn parse_comment(data: &[u8]) -> Vec<Track> {
    let (text, _, _) = SHIFT_JIS.decode(data);

    let has_note_lines = text.lines().any(|line| line.starts_with('♪'));

    let mut file_name = String::new();
    let mut tracks = Vec::new();

    for line in text.lines() {
        if let Some(rest) = line.strip_prefix("@bgm/") {
            file_name = normalize_file_name(rest);
        }
        if let Some(title) = line.strip_prefix('♪') {
            tracks.push(Track {
                file_name: file_name.clone(),
                title: title.to_string(),
            });
        }
        if !has_note_lines && line.starts_with("No.") && !file_name.is_empty() {
            if let Some((_, title)) = line.split_once(' ') {
                tracks.push(Track {
                    file_name: file_name.clone(),
                    title: title.trim().to_string(),
                });
            }
        }
    }

    tracks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_lines() {
        let tracks = parse_comment("@bgm/bgm01\n♪Opening Theme\n".as_bytes());
        assert_eq!(
            tracks,
            [Track {
                file_name: "bgm01.wav".to_string(),
                title: "Opening Theme".to_string(),
            }]
        );
    }

    #[test]
    fn test_wav_suffix_kept_and_mid_replaced() {
        let tracks =
            parse_comment("@bgm/a.wav\n♪First\n@bgm/b.mid\n♪Second\n".as_bytes());
        assert_eq!(tracks[0].file_name, "a.wav");
        assert_eq!(tracks[1].file_name, "b.wav");
    }

    #[test]
    fn test_numbered_fallback_without_note_lines() {
        let text = "@bgm/th09_00\nNo.1  Title A\n@bgm/th09_01\nNo.2  Title B\n";
        let tracks = parse_comment(text.as_bytes());
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].file_name, "th09_00.wav");
        assert_eq!(tracks[0].title, "Title A");
        assert_eq!(tracks[1].title, "Title B");
    }

    #[test]
    fn test_numbered_lines_ignored_when_notes_exist() {
        let text = "@bgm/a\nNo.1  Ignored\n♪Kept\n";
        let tracks = parse_comment(text.as_bytes());
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].title, "Kept");
    }

    #[test]
    fn test_shift_jis_titles() {
        // "♪亡き王女の為のセプテット" in Shift-JIS.
        let encoded = SHIFT_JIS.encode("@bgm/th06_13\n♪亡き王女の為のセプテット\n").0;
        let tracks = parse_comment(&encoded);
        assert_eq!(tracks[0].file_name, "th06_13.wav");
        assert_eq!(tracks[0].title, "亡き王女の為のセプテット");
    }
}
