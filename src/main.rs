//! Main entry point for the zipup CLI application.
//!
//! This binary provides a command-line interface for building ZIP
//! archives from files and directories, writing either to a file or,
//! in pipe mode, straight to stdout.

use anyhow::{Result, bail};
use clap::Parser;
use std::fs::File;
use std::io::{self, BufWriter, Write};

use zipup::{BuildOptions, Cli, CountingWriter, Entry, ZipBuilder};

/// Application entry point.
///
/// Parses command-line arguments and streams the archive to the chosen
/// sink. The archive is produced forward-only in both modes; the output
/// file is never seeked, so `-p` piping behaves identically.
fn main() -> Result<()> {
    let cli = Cli::parse();

    let inputs = cli.inputs();
    if inputs.is_empty() {
        bail!("no input paths given");
    }
    let entries: Vec<Entry> = inputs.into_iter().map(Entry::from_path).collect();

    let written = if cli.pipe {
        // Stream the archive to stdout
        let stdout = io::stdout();
        build_archive(stdout.lock(), &entries, &cli)?
    } else {
        let Some(output) = cli.output.as_deref() else {
            bail!("output path required");
        };
        let file = File::create(output)?;
        build_archive(BufWriter::new(file), &entries, &cli)?
    };

    if written == 0 && !cli.is_very_quiet() {
        eprintln!("nothing to archive");
    } else if !cli.is_quiet() {
        eprintln!("Archive written: {}", format_size(written));
    }

    Ok(())
}

/// Build the archive onto `sink` and report how many bytes came out.
///
/// The sink is wrapped in a byte counter so the total is known even for
/// sinks with no notion of length, like stdout.
fn build_archive<W: Write>(sink: W, entries: &[Entry], cli: &Cli) -> Result<u64> {
    let options = BuildOptions {
        chunk_size: cli.chunk_size,
        name_encoder: None,
    };
    let mut builder = ZipBuilder::with_options(CountingWriter::new(sink), options)?;
    builder.pack(entries)?;
    let mut out = builder.finish()?;
    out.flush()?;
    Ok(out.position())
}

/// Format a byte size into a human-readable string.
///
/// Automatically selects the appropriate unit (bytes, KB, MB, GB)
/// based on the size magnitude.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(format_size(500), "500 bytes");
/// assert_eq!(format_size(1536), "1.50 KB");
/// assert_eq!(format_size(1048576), "1.00 MB");
/// ```
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
