use std::io::{self, Write};

/// Byte-counting wrapper around an append-only sink.
///
/// Every byte of the archive flows through one of these, and
/// [`position`](CountingWriter::position) is the single source of truth
/// for absolute offsets: the underlying sink is never asked where it is,
/// so it may be a pipe, a socket, or anything else that cannot seek.
///
/// A second, short-lived counter is stacked on top of the archive-level
/// one while an entry's payload streams through, to measure the
/// compressed span. CRC folding is optional and off by default; the
/// archive records CRCs of raw input, which the compressor tracks.
pub struct CountingWriter<W: Write> {
    inner: W,
    count: u64,
    crc: Option<crc32fast::Hasher>,
}

impl<W: Write> CountingWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            count: 0,
            crc: None,
        }
    }

    /// Counter that also folds everything written into a running CRC-32.
    pub fn with_crc(inner: W) -> Self {
        Self {
            inner,
            count: 0,
            crc: Some(crc32fast::Hasher::new()),
        }
    }

    /// Total bytes written so far; for the archive-level counter this is
    /// the current absolute offset.
    pub fn position(&self) -> u64 {
        self.count
    }

    /// Running CRC-32 of everything written. Zero unless constructed with
    /// [`with_crc`](CountingWriter::with_crc).
    pub fn crc32(&self) -> u32 {
        self.crc.as_ref().map_or(0, |h| h.clone().finalize())
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.count += written as u64;
        if let Some(crc) = &mut self.crc {
            crc.update(&buf[..written]);
        }
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
