use std::io::Write;

use anyhow::Result;
use flate2::Compression;
use flate2::write::DeflateEncoder;

/// Totals a payload stream reports once it has been fully consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadStats {
    /// CRC-32 of the raw (uncompressed) input.
    pub crc32: u32,
    /// Raw input bytes consumed.
    pub uncompressed_size: u64,
}

/// Streaming raw-deflate compressor.
///
/// Wraps the output sink in a [`DeflateEncoder`] (raw stream, no zlib or
/// gzip framing, as ZIP requires) while keeping a running CRC-32 and byte
/// count of the raw input. Compressed bytes go out as the encoder decides
/// to emit them; nothing is force-flushed between chunks, so the output
/// is byte-identical no matter how the input is divided.
pub struct Deflater<W: Write> {
    encoder: DeflateEncoder<W>,
    crc: crc32fast::Hasher,
    size: u64,
}

impl<W: Write> Deflater<W> {
    pub fn new(out: W) -> Self {
        Self {
            encoder: DeflateEncoder::new(out, Compression::default()),
            crc: crc32fast::Hasher::new(),
            size: 0,
        }
    }

    /// Feed one chunk of raw input. Chunks may be any size.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<()> {
        self.encoder.write_all(chunk)?;
        self.crc.update(chunk);
        self.size += chunk.len() as u64;
        Ok(())
    }

    /// Flush the final compressed bytes and return the input totals.
    /// The deflater is consumed; no more input can be fed.
    pub fn finish(self) -> Result<(W, PayloadStats)> {
        let out = self.encoder.finish()?;
        Ok((
            out,
            PayloadStats {
                crc32: self.crc.finalize(),
                uncompressed_size: self.size,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn deflate_in_chunks(data: &[u8], chunk: usize) -> (Vec<u8>, PayloadStats) {
        let mut d = Deflater::new(Vec::new());
        for piece in data.chunks(chunk.max(1)) {
            d.feed(piece).unwrap();
        }
        d.finish().unwrap()
    }

    #[test]
    fn output_is_independent_of_chunk_boundaries() {
        let data: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
        let (one_shot, stats_one) = deflate_in_chunks(&data, data.len());
        let (tiny, stats_tiny) = deflate_in_chunks(&data, 1);
        let (odd, stats_odd) = deflate_in_chunks(&data, 4097);
        assert_eq!(one_shot, tiny);
        assert_eq!(one_shot, odd);
        assert_eq!(stats_one, stats_tiny);
        assert_eq!(stats_one, stats_odd);
        assert_eq!(stats_one.uncompressed_size, data.len() as u64);
        assert_eq!(stats_one.crc32, crc32fast::hash(&data));
    }

    #[test]
    fn compressed_bytes_inflate_back() {
        let data = b"the quick brown fox jumps over the lazy dog".repeat(50);
        let (compressed, stats) = deflate_in_chunks(&data, 7);
        let mut inflated = Vec::new();
        flate2::read::DeflateDecoder::new(&compressed[..])
            .read_to_end(&mut inflated)
            .unwrap();
        assert_eq!(inflated, data);
        assert_eq!(stats.crc32, crc32fast::hash(&data));
    }

    #[test]
    fn empty_input_yields_valid_stream() {
        let (compressed, stats) = deflate_in_chunks(b"", 1);
        assert_eq!(stats.uncompressed_size, 0);
        assert_eq!(stats.crc32, 0);
        let mut inflated = Vec::new();
        flate2::read::DeflateDecoder::new(&compressed[..])
            .read_to_end(&mut inflated)
            .unwrap();
        assert!(inflated.is_empty());
    }
}
