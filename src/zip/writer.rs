use std::collections::HashSet;
use std::io::{Read, Write};

use anyhow::{Result, bail};

use super::compress::Deflater;
use super::planner::{EntryKind, FixedEntry};
use super::structures::{
    CentralDirectoryHeader, CompressionMethod, DataDescriptor, DosDateTime, EndOfCentralDirectory,
    EXTERNAL_ATTR_DIR, EXTERNAL_ATTR_FILE, EXTERNAL_ATTR_SYMLINK, LocalFileHeader,
};
use crate::io::CountingWriter;

/// Everything the central directory will need about an entry, captured
/// the moment its local records hit the sink. The archive bytes are never
/// re-read; this list is the only input to [`ZipWriter::close`].
struct WrittenEntry {
    offset: u64,
    crc32: u32,
    compressed_size: u64,
    uncompressed_size: u64,
    method: CompressionMethod,
    timestamp: DosDateTime,
    kind: EntryKind,
    name_bytes: Vec<u8>,
}

impl WrittenEntry {
    fn external_attributes(&self) -> u32 {
        match self.kind {
            EntryKind::File => EXTERNAL_ATTR_FILE,
            EntryKind::Directory => EXTERNAL_ATTR_DIR,
            EntryKind::Symlink => EXTERNAL_ATTR_SYMLINK,
        }
    }
}

/// Forward-only ZIP writer.
///
/// Writes each entry as local header (sizes and CRC zeroed), name bytes,
/// streamed payload, then a data descriptor with the values that only
/// became known once the payload finished. The sink is strictly
/// append-only; offsets come from the [`CountingWriter`], never from the
/// sink itself. [`close`](ZipWriter::close) consumes the writer and emits
/// the central directory and end record from the recorded entry list.
pub struct ZipWriter<W: Write> {
    out: CountingWriter<W>,
    chunk_size: usize,
    entries: Vec<WrittenEntry>,
    paths: HashSet<String>,
}

impl<W: Write> ZipWriter<W> {
    /// `chunk_size` is the division size for streaming file payloads
    /// through the compressor. It only affects memory use, never the
    /// produced bytes. Zero is refused before anything is written.
    pub fn new(out: W, chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            bail!("chunk size must be a positive number of bytes");
        }
        Ok(Self {
            out: CountingWriter::new(out),
            chunk_size,
            entries: Vec::new(),
            paths: HashSet::new(),
        })
    }

    /// Current absolute offset in the archive.
    pub fn position(&self) -> u64 {
        self.out.position()
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Whether `archive_path` has already been written. Symlink
    /// validation checks its resolved target against this.
    pub fn contains_path(&self, archive_path: &str) -> bool {
        self.paths.contains(archive_path)
    }

    /// Stream one file entry: deflate `source` in `chunk_size` pieces
    /// straight into the sink.
    pub fn write_file_entry(&mut self, entry: &FixedEntry, mut source: impl Read) -> Result<()> {
        let offset = self.begin_entry(entry, CompressionMethod::Deflate)?;

        let mut payload = CountingWriter::new(&mut self.out);
        let mut deflater = Deflater::new(&mut payload);
        let mut buf = vec![0u8; self.chunk_size];
        loop {
            let n = source.read(&mut buf)?;
            if n == 0 {
                break;
            }
            deflater.feed(&buf[..n])?;
        }
        let (_, stats) = deflater.finish()?;
        let compressed_size = payload.position();

        self.end_entry(
            entry,
            CompressionMethod::Deflate,
            offset,
            stats.crc32,
            compressed_size,
            stats.uncompressed_size,
        )
    }

    /// A directory entry has no payload at all; its name (with the
    /// trailing `/`) is the whole record.
    pub fn write_directory_entry(&mut self, entry: &FixedEntry) -> Result<()> {
        self.write_stored_entry(entry, b"")
    }

    /// A symlink entry's payload is its target path, stored uncompressed.
    pub fn write_symlink_entry(&mut self, entry: &FixedEntry, target: &[u8]) -> Result<()> {
        self.write_stored_entry(entry, target)
    }

    fn write_stored_entry(&mut self, entry: &FixedEntry, data: &[u8]) -> Result<()> {
        let offset = self.begin_entry(entry, CompressionMethod::Stored)?;
        self.out.write_all(data)?;
        self.end_entry(
            entry,
            CompressionMethod::Stored,
            offset,
            crc32fast::hash(data),
            data.len() as u64,
            data.len() as u64,
        )
    }

    fn begin_entry(&mut self, entry: &FixedEntry, method: CompressionMethod) -> Result<u64> {
        let offset = self.out.position();
        LocalFileHeader {
            method,
            timestamp: entry.timestamp,
            name: &entry.name_bytes,
        }
        .write_to(&mut self.out)?;
        Ok(offset)
    }

    fn end_entry(
        &mut self,
        entry: &FixedEntry,
        method: CompressionMethod,
        offset: u64,
        crc32: u32,
        compressed_size: u64,
        uncompressed_size: u64,
    ) -> Result<()> {
        DataDescriptor {
            crc32,
            compressed_size: compressed_size as u32,
            uncompressed_size: uncompressed_size as u32,
        }
        .write_to(&mut self.out)?;

        self.entries.push(WrittenEntry {
            offset,
            crc32,
            compressed_size,
            uncompressed_size,
            method,
            timestamp: entry.timestamp,
            kind: entry.kind,
            name_bytes: entry.name_bytes.clone(),
        });
        self.paths.insert(entry.archive_path.clone());
        Ok(())
    }

    /// Emit the central directory and end record, returning the sink.
    ///
    /// A writer that never recorded an entry emits nothing: no bytes in,
    /// no bytes out.
    pub fn close(mut self) -> Result<W> {
        if self.entries.is_empty() && self.out.position() == 0 {
            return Ok(self.out.into_inner());
        }

        let cd_offset = self.out.position();
        for entry in &self.entries {
            CentralDirectoryHeader {
                method: entry.method,
                timestamp: entry.timestamp,
                crc32: entry.crc32,
                compressed_size: entry.compressed_size as u32,
                uncompressed_size: entry.uncompressed_size as u32,
                external_attributes: entry.external_attributes(),
                local_header_offset: entry.offset as u32,
                name: &entry.name_bytes,
            }
            .write_to(&mut self.out)?;
        }
        let cd_size = self.out.position() - cd_offset;

        EndOfCentralDirectory {
            entry_count: self.entries.len() as u16,
            cd_size: cd_size as u32,
            cd_offset: cd_offset as u32,
        }
        .write_to(&mut self.out)?;
        Ok(self.out.into_inner())
    }
}
