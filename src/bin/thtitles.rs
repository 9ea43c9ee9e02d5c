//! thtitles - emit a BGM track listing from a game archive.
//!
//! Reads the PCM format table and the music comment file (from an archive
//! or from loose files next to the tool) and writes
//! `titles_<stem>.txt` with a UTF-8 byte order mark.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;

use moonarc::prelude::*;

/// Derive a BGM track listing from a game archive
#[derive(Parser)]
#[command(name = "thtitles", disable_version_flag = true)]
struct Cli {
    /// Path to a .dat archive (searched for nearby when omitted)
    #[arg(short = 'a', long = "archive", value_name = "PATH")]
    archive: Option<PathBuf>,

    /// Explicit archive type (0-2); auto-detected when omitted
    #[arg(short = 't', value_name = "TYPE")]
    archive_type: Option<u32>,

    /// Output directory for the generated file
    #[arg(short = 'o', value_name = "DIR", default_value = ".")]
    output: PathBuf,

    /// Show extra diagnostics
    #[arg(short = 'd', long)]
    debug: bool,

    /// Render without writing the output file
    #[arg(short = 'n', long = "dry-run")]
    dry_run: bool,

    /// Print version information
    #[arg(short = 'v', long = "version")]
    version: bool,
}

fn main() {
    std::process::exit(run());
}

fn run() -> i32 {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() { 1 } else { 0 };
        }
    };

    if cli.version {
        println!("thtitles version {}", moonarc::VERSION);
        return 0;
    }

    match generate(&cli) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {err:#}");
            1
        }
    }
}

/// The two byte arrays the listing is derived from, plus naming context.
struct Inputs {
    fmt: Vec<u8>,
    cmt: Vec<u8>,
    /// Output file stem, e.g. `th10` or `thbgm_tr`.
    stem: String,
    /// Path whose directory is searched for readme/thbgm companions.
    info_anchor: PathBuf,
}

fn generate(cli: &Cli) -> Result<()> {
    let inputs = match &cli.archive {
        Some(path) => from_archive(path, cli)?,
        None => match find_dat_file()? {
            Some(path) => {
                if cli.debug {
                    eprintln!("found archive {}", path.display());
                }
                from_archive(&path, cli)?
            }
            None => from_local_files(cli)?,
        },
    };

    let records = parse_fmt(&inputs.fmt);
    let tracks = parse_comment(&inputs.cmt);
    if cli.debug {
        eprintln!("{} records, {} comment tracks", records.len(), tracks.len());
    }

    let info = match check_additional_info(&inputs.info_anchor) {
        Ok(info) => info,
        Err(err) => {
            eprintln!("warning: could not read the readme: {err}");
            None
        }
    };

    let text = render(&records, &tracks, info.as_ref());
    print!("{text}");

    if !cli.dry_run {
        let out_path = cli.output.join(output_file_name(&inputs.stem));
        write_with_bom(&out_path, &text)
            .with_context(|| format!("writing {}", out_path.display()))?;
        if cli.debug {
            eprintln!("wrote {}", out_path.display());
        }
    }

    Ok(())
}

fn from_archive(path: &Path, cli: &Cli) -> Result<Inputs> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    // Trial archives only carry the _tr member names.
    let (fmt_name, cmt_name) = if is_trial(file_name) {
        ("thbgm_tr.fmt", "musiccmt_tr.txt")
    } else {
        ("thbgm.fmt", "musiccmt.txt")
    };

    let archive = DatArchive::open(path, cli.archive_type)
        .with_context(|| format!("opening {}", path.display()))?;
    if cli.debug {
        eprintln!(
            "opened {} as {} (sub-type {})",
            archive.name(),
            archive.format(),
            archive.sub_type()
        );
    }

    let extracted = extract_to_memory(&archive, &[fmt_name, cmt_name], &CancelToken::new())?;
    let fmt = extracted
        .get(fmt_name)
        .ok_or_else(|| anyhow!("member {fmt_name} not found in {}", path.display()))?
        .to_vec();
    let cmt = extracted
        .get(cmt_name)
        .ok_or_else(|| anyhow!("member {cmt_name} not found in {}", path.display()))?
        .to_vec();

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("archive")
        .to_string();

    Ok(Inputs {
        fmt,
        cmt,
        stem,
        info_anchor: path.to_path_buf(),
    })
}

/// Loose-file fallback: the format table and comment file sitting in the
/// working directory.
fn from_local_files(cli: &Cli) -> Result<Inputs> {
    const CANDIDATES: [(&str, &str, &str); 2] = [
        ("thbgm.fmt", "musiccmt.txt", "thbgm"),
        ("thbgm_tr.fmt", "musiccmt_tr.txt", "thbgm_tr"),
    ];

    for (fmt_name, cmt_name, stem) in CANDIDATES {
        if Path::new(fmt_name).is_file() && Path::new(cmt_name).is_file() {
            if cli.debug {
                eprintln!("reading {fmt_name} and {cmt_name}");
            }
            return Ok(Inputs {
                fmt: std::fs::read(fmt_name)?,
                cmt: std::fs::read(cmt_name)?,
                stem: stem.to_string(),
                info_anchor: PathBuf::from(fmt_name),
            });
        }
    }

    bail!("no archive found and no thbgm.fmt/musiccmt.txt (or _tr variants) in the current directory")
}
