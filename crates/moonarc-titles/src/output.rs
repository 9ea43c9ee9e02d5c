//! Rendering and writing of the track list.

use std::collections::HashSet;
use std::io::Write;
use std::path::Path;

use crate::comment::Track;
use crate::info::GameInfo;
use crate::records::PcmRecord;
use crate::Result;

/// The one track name whose pseudo-title is hard-coded: the score-roll
/// track of the 12.8 generation carries no comment entry.
const PLAYER_SCORE_FILE: &str = "th128_08.wav";
const PLAYER_SCORE_TITLE: &str = "プレイヤーズスコア";

/// Render the track list.
///
/// Tracks emit one `start,intro,loop,title` line (hex fields) per format
/// record sharing their file name; records matched by no track fall back
/// to their file name as the title.
pub fn render(records: &[PcmRecord], tracks: &[Track], info: Option<&GameInfo>) -> String {
    let mut out = String::new();

    if let Some(info) = info {
        if info.is_trial {
            out.push_str(&format!("#「{}」体験版曲データ\n", info.display_title));
        } else {
            out.push_str(&format!("#「{}」製品版曲データ\n", info.display_title));
        }
        out.push_str("#デフォルトのパスと製品名\n");
        out.push_str(&info.title_line);
        out.push('\n');
    }

    out.push_str("#曲データ\n");
    out.push_str("#開始位置[Bytes]、イントロ部の長さ[Bytes]、ループ部の長さ[Bytes]、曲名\n");
    out.push_str("#位置・長さは16進値として記述する\n");

    let mut matched: HashSet<&str> = HashSet::new();
    for track in tracks {
        for record in records {
            if record.file_name == track.file_name {
                push_line(&mut out, record, &track.title);
                matched.insert(record.file_name.as_str());
            }
        }
    }

    for record in records {
        if matched.contains(record.file_name.as_str()) {
            continue;
        }
        let title = if record.file_name == PLAYER_SCORE_FILE {
            PLAYER_SCORE_TITLE
        } else {
            record.file_name.as_str()
        };
        push_line(&mut out, record, title);
    }

    out
}

fn push_line(out: &mut String, record: &PcmRecord, title: &str) {
    out.push_str(&format!(
        "{:08X},{:08X},{:08X},{}\n",
        record.start,
        record.intro,
        record.loop_len(),
        title
    ));
}

/// Output file name for a given input stem, e.g. `th10` → `titles_th10.txt`.
pub fn output_file_name(stem: &str) -> String {
    format!("titles_{stem}.txt")
}

/// Write the rendered list with a UTF-8 byte order mark, creating parent
/// directories as needed.
pub fn write_with_bom(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut file = std::fs::File::create(path)?;
    file.write_all(&[0xEF, 0xBB, 0xBF])?;
    file.write_all(content.as_bytes())?;
    file.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comment::parse_comment;
    use crate::records::{make_record, parse_fmt};

    #[test]
    fn test_matched_track_line() {
        let records = parse_fmt(&make_record("bgm01.wav", 0x10, 0x20, 0x80));
        let tracks = parse_comment("@bgm/bgm01\n♪Opening Theme\n".as_bytes());

        let text = render(&records, &tracks, None);
        assert!(text.contains("00000010,00000020,00000060,Opening Theme\n"));
    }

    #[test]
    fn test_unmatched_record_uses_file_name() {
        let records = parse_fmt(&make_record("th11_05.wav", 1, 2, 5));
        let text = render(&records, &[], None);
        assert!(text.contains("00000001,00000002,00000003,th11_05.wav\n"));
    }

    #[test]
    fn test_player_score_exception() {
        let records = parse_fmt(&make_record("th128_08.wav", 0, 0, 8));
        let text = render(&records, &[], None);
        assert!(text.contains("00000000,00000000,00000008,プレイヤーズスコア\n"));
    }

    #[test]
    fn test_header_lines_with_info() {
        let info = GameInfo {
            title_line: "@thbgm.dat,東方星蓮船　～ Undefined Fantastic Object.".to_string(),
            display_title: "東方星蓮船　～ Undefined Fantastic Object.".to_string(),
            is_trial: false,
        };
        let text = render(&[], &[], Some(&info));
        assert!(text.starts_with(
            "#「東方星蓮船　～ Undefined Fantastic Object.」製品版曲データ\n"
        ));
        assert!(text.contains("@thbgm.dat,"));
        assert!(text.contains("#曲データ\n"));
    }

    #[test]
    fn test_write_with_bom() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("titles_th10.txt");
        write_with_bom(&path, "hello\n").unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..3], &[0xEF, 0xBB, 0xBF]);
        assert_eq!(&bytes[3..], b"hello\n");
    }

    #[test]
    fn test_output_file_name() {
        assert_eq!(output_file_name("th10"), "titles_th10.txt");
        assert_eq!(output_file_name("thbgm_tr"), "titles_thbgm_tr.txt");
    }
}
