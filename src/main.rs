//! Moonarc CLI - list and extract Touhou .dat archives.
//!
//! This is the generic extractor: variant detection, member listing, and
//! sequential or worker-pool extraction to an output directory.

use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use crossbeam_channel as channel;
use indicatif::{ProgressBar, ProgressStyle};

use moonarc::prelude::*;

/// List and extract Touhou .dat archives
#[derive(Parser)]
#[command(name = "moonarc", disable_version_flag = true)]
struct Cli {
    /// Extract members
    #[arg(short = 'x')]
    extract: bool,

    /// List members
    #[arg(short = 'l')]
    list: bool,

    /// Output directory
    #[arg(short = 'o', value_name = "DIR", default_value = ".")]
    output: PathBuf,

    /// Explicit archive type (0-2); auto-detected when omitted
    #[arg(short = 't', value_name = "TYPE")]
    archive_type: Option<u32>,

    /// Extract with a worker pool
    #[arg(short = 'p')]
    parallel: bool,

    /// Worker count for parallel extraction
    #[arg(short = 'w', value_name = "N", default_value_t = 4)]
    workers: usize,

    /// Show extra diagnostics
    #[arg(short = 'd')]
    debug: bool,

    /// Print version information
    #[arg(short = 'v', long = "version")]
    version: bool,

    /// Archive path
    archive: Option<PathBuf>,

    /// Member names to extract (all members when none are given)
    members: Vec<String>,
}

/// Exit code for a run interrupted by the cancellation signal.
const EXIT_CANCELLED: i32 = 130;

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
        println!("moonarc version {}", moonarc::VERSION);
        return 0;
    }

    let Some(archive_path) = cli.archive.clone() else {
        eprintln!("usage: moonarc [flags] <archive> [member...]");
        return 1;
    };

    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        let _ = ctrlc::set_handler(move || cancel.cancel());
    }

    if cli.debug {
        print_debug_info(&archive_path);
    }

    let archive = match DatArchive::open(&archive_path, cli.archive_type) {
        Ok(archive) => archive,
        Err(err) => {
            eprintln!("error: {err}");
            return 1;
        }
    };
    println!(
        "opened {} as {} (sub-type {})",
        archive.name(),
        archive.format(),
        archive.sub_type()
    );

    if cli.list {
        list_archive(&archive);
    }

    if cli.extract || !cli.members.is_empty() {
        let outcome = if cli.parallel {
            extract_parallel(
                &archive,
                &cli.output,
                cli.workers,
                &cli.members,
                &cancel,
                cli.debug,
            )
        } else {
            extract_sequential(&archive, &cli.output, &cli.members, &cancel)
        };

        let summary = match outcome {
            Ok(summary) => summary,
            Err(err) => {
                eprintln!("error: {err:#}");
                return if cancel.is_cancelled() { EXIT_CANCELLED } else { 1 };
            }
        };

        if !summary.missing.is_empty() {
            eprintln!("\nwarning: the following members were not found:");
            for name in &summary.missing {
                eprintln!("- {name}");
            }
        }

        println!("\nextracted {} members", summary.extracted);

        if cancel.is_cancelled() {
            return EXIT_CANCELLED;
        }
        if summary.first_error.is_some() && summary.extracted == 0 {
            return 1;
        }
    }

    0
}

struct Summary {
    extracted: usize,
    missing: Vec<String>,
    first_error: Option<anyhow::Error>,
}

/// Resolve the member filter against the directory, in stored order.
/// Matching is case-insensitive; an empty filter selects everything.
fn select_entries<'a>(
    archive: &'a DatArchive,
    members: &[String],
) -> (Vec<&'a Entry>, Vec<String>) {
    if members.is_empty() {
        return (archive.iter().collect(), Vec::new());
    }

    let mut selected = Vec::new();
    let mut matched = vec![false; members.len()];
    for entry in archive.iter() {
        if let Some(i) = members
            .iter()
            .position(|m| entry.name().eq_ignore_ascii_case(m))
        {
            matched[i] = true;
            selected.push(entry);
        }
    }

    let missing = members
        .iter()
        .zip(matched)
        .filter(|(_, hit)| !hit)
        .map(|(name, _)| name.clone())
        .collect();
    (selected, missing)
}

fn extract_sequential(
    archive: &DatArchive,
    out_dir: &Path,
    members: &[String],
    cancel: &CancelToken,
) -> Result<Summary> {
    fs::create_dir_all(out_dir).context("creating the output directory")?;
    let (selected, missing) = select_entries(archive, members);

    let pb = ProgressBar::new(selected.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );

    let mut extracted = 0;
    let mut first_error = None;
    for entry in selected {
        if cancel.is_cancelled() {
            break;
        }
        match write_member(archive, entry, out_dir) {
            Ok(()) => extracted += 1,
            Err(err) => {
                eprintln!("failed to extract {}: {err:#}", entry.name());
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    Ok(Summary {
        extracted,
        missing,
        first_error,
    })
}

fn extract_parallel(
    archive: &DatArchive,
    out_dir: &Path,
    workers: usize,
    members: &[String],
    cancel: &CancelToken,
    debug: bool,
) -> Result<Summary> {
    let workers = workers.max(1);
    fs::create_dir_all(out_dir).context("creating the output directory")?;
    let (selected, missing) = select_entries(archive, members);

    let (job_tx, job_rx) = channel::bounded::<&Entry>(workers * 2);
    let (result_tx, result_rx) = channel::bounded::<(String, Result<()>)>(workers * 2);

    let (extracted, first_error) = std::thread::scope(|scope| {
        for _ in 0..workers {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            let cancel = cancel.clone();
            scope.spawn(move || {
                for entry in job_rx.iter() {
                    let outcome = if cancel.is_cancelled() {
                        Err(anyhow::anyhow!("cancelled"))
                    } else {
                        write_member(archive, entry, out_dir)
                    };
                    let _ = result_tx.send((entry.name().to_string(), outcome));
                }
            });
        }
        drop(result_tx);

        let collector = scope.spawn(move || {
            let mut extracted = 0usize;
            let mut first_error = None;
            for (name, outcome) in result_rx.iter() {
                match outcome {
                    Ok(()) => {
                        extracted += 1;
                        if debug {
                            println!("done: {name}");
                        }
                    }
                    Err(err) => {
                        eprintln!("failed to extract {name}: {err:#}");
                        if first_error.is_none() {
                            first_error = Some(err);
                        }
                    }
                }
            }
            (extracted, first_error)
        });

        for &entry in &selected {
            if cancel.is_cancelled() {
                break;
            }
            if job_tx.send(entry).is_err() {
                break;
            }
        }
        drop(job_tx);

        collector.join().expect("result collector panicked")
    });

    Ok(Summary {
        extracted,
        missing,
        first_error,
    })
}

/// Decode one member to `<out_dir>/<entry name>`, deleting the partial
/// file on any failure.
fn write_member(archive: &DatArchive, entry: &Entry, out_dir: &Path) -> Result<()> {
    let out_path = out_dir.join(entry.name());
    if let Some(parent) = out_path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }

    let result = (|| -> Result<()> {
        let file =
            File::create(&out_path).with_context(|| format!("creating {}", out_path.display()))?;
        let mut writer = BufWriter::new(file);
        archive.extract_to(entry, &mut writer)?;
        writer.flush()?;
        Ok(())
    })();

    if result.is_err() {
        let _ = fs::remove_file(&out_path);
    }
    result
}

fn list_archive(archive: &DatArchive) {
    println!("{:<32} {:>10} {:>10}", "name", "size", "stored");
    println!("{}", "-".repeat(54));
    for entry in archive.iter() {
        println!(
            "{:<32} {:>10} {:>10}",
            entry.name(),
            entry.original_size(),
            entry.compressed_size()
        );
    }
    println!("\nTotal: {} entries", archive.entry_count());
}

fn print_debug_info(path: &Path) {
    match fs::metadata(path) {
        Ok(meta) => {
            println!("file: {}", path.display());
            println!("size: {} bytes", meta.len());
            if let Ok(mut file) = File::open(path) {
                let mut header = [0u8; 16];
                if let Ok(n) = file.read(&mut header) {
                    let hex: Vec<String> = header[..n].iter().map(|b| format!("{b:02x}")).collect();
                    println!("header: {}", hex.join(" "));
                }
            }
            println!();
        }
        Err(err) => eprintln!("cannot stat {}: {err}", path.display()),
    }
}
