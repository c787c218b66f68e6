//! ZIP archive construction.
//!
//! This module builds PKZIP archives in a single forward pass, suitable
//! for sinks that cannot seek (pipes, sockets, append-only files).
//!
//! ## Architecture
//!
//! The module is organized into five components:
//!
//! - [`structures`]: Byte-exact encoders for the four ZIP records (local
//!   header, data descriptor, central directory header, end record)
//! - [`compress`]: Streaming raw-deflate adapter with running CRC/size
//! - [`planner`]: Entry classification, archive-path and name fixing
//! - [`writer`]: The forward-only per-entry write protocol and the
//!   deferred central directory
//! - [`builder`]: Filesystem traversal (eager files, breadth-first
//!   directories, deferred symlinks) and the convenience entry points
//!
//! ## ZIP Format Overview
//!
//! A ZIP file consists of:
//! 1. Local file headers and compressed data for each file
//! 2. Central Directory with metadata for all files
//! 3. End of Central Directory (EOCD) record at the end
//!
//! Because the output is unseekable, a local header can never be patched
//! after the fact, yet an entry's CRC and sizes are only known once its
//! payload has been fully compressed. The writer therefore zeroes those
//! header fields, sets general-purpose flag bit 3, and emits the real
//! values in a data descriptor trailing the payload. Absolute offsets
//! come from counting bytes written, never from asking the sink.
//!
//! ## Supported Features
//!
//! - Standard ZIP format (PKZIP APPNOTE 6.3.x compatible)
//! - DEFLATE compression for files, STORED for directories and symlinks
//! - Unix external attributes (directory / regular file / symlink)
//! - Dangling-symlink suppression: a link is archived only when its
//!   target is also in the archive
//!
//! ## Limitations
//!
//! - No encryption support
//! - No ZIP64 extensions (archives must stay under 4GB / 65535 entries)
//! - No BZIP2, LZMA, or other compression methods
//! - Write-only; see a ZIP reader for extraction

pub mod builder;
pub mod compress;
pub mod planner;
pub mod structures;
pub mod writer;

pub use builder::{BuildOptions, DEFAULT_CHUNK_SIZE, ZipBuilder, zip_to_file, zip_to_vec, zip_to_writer};
pub use planner::{Entry, EntryKind, FixedEntry, NameEncoder};
pub use structures::{CompressionMethod, DosDateTime};
pub use writer::ZipWriter;
