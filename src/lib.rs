//! # zipup
//!
//! A Rust zip utility that streams archives to unseekable sinks.
//!
//! This library builds valid PKZIP archives in a single forward pass,
//! writing only ahead into any [`std::io::Write`] sink - a file, a pipe,
//! a socket, or an in-memory buffer. It never seeks, which makes it
//! suitable for producing archives directly onto network connections or
//! through process pipelines.
//!
//! ## Features
//!
//! - Forward-only output: headers are never patched after the fact
//! - DEFLATE compression for files, STORED entries for directories and
//!   symbolic links
//! - Breadth-first directory traversal with deterministic entry order
//! - Symbolic links archived only when their target is in the archive
//! - Optional entry-name re-encoding hook with a safe UTF-8 fallback
//!
//! ## Example
//!
//! ```no_run
//! use zipup::{Entry, zip_to_file};
//!
//! fn main() -> anyhow::Result<()> {
//!     // Archive a directory tree and a single file into out.zip
//!     let entries = [
//!         Entry::from_path("photos"),
//!         Entry::from_path("notes.txt"),
//!     ];
//!     zip_to_file("out.zip", &entries)?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod io;
pub mod zip;

pub use cli::Cli;
pub use io::CountingWriter;
pub use zip::{BuildOptions, Entry, EntryKind, ZipBuilder, zip_to_file, zip_to_vec, zip_to_writer};
