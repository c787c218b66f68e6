use byteorder::{LittleEndian, WriteBytesExt};
use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Datelike, Local, Timelike};

/// ZIP compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Deflate,
}

impl CompressionMethod {
    pub fn as_u16(&self) -> u16 {
        match self {
            CompressionMethod::Stored => 0,
            CompressionMethod::Deflate => 8,
        }
    }

    /// "Version needed to extract" advertised for this method.
    ///
    /// Stored entries only need a 1.0 reader; deflate needs 2.0.
    pub fn version_needed(&self) -> u16 {
        match self {
            CompressionMethod::Stored => 0x000A,
            CompressionMethod::Deflate => 0x0014,
        }
    }
}

/// "Version made by": spec 2.1, host system 3 (Unix).
pub const VERSION_MADE_BY: u16 = 0x0315;

/// General-purpose flag bit 3: sizes and CRC are zero in the local header
/// and follow the payload in a data descriptor. This is what makes writing
/// to an unseekable sink possible at all.
pub const FLAG_DATA_DESCRIPTOR: u16 = 0x0008;

/// Unix external attributes, mode bits in the high word:
/// `drwxr-xr-x` for directories, `-rw-r--r--` for files, `lrwxr-xr-x`
/// for symbolic links.
pub const EXTERNAL_ATTR_DIR: u32 = 0x41ed_4000;
pub const EXTERNAL_ATTR_FILE: u32 = 0x81a4_4000;
pub const EXTERNAL_ATTR_SYMLINK: u32 = 0xa1ed_4000;

/// MS-DOS packed date and time, the only timestamp the classic ZIP
/// format carries.
///
/// Layout: time is `seconds/2 | minutes<<5 | hours<<11`, date is
/// `day | month<<5 | (year-1980)<<9`. Years outside 1980..=2107 are not
/// representable; like the format itself, this codec does not guard them
/// and simply truncates to 16 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DosDateTime {
    pub time: u16,
    pub date: u16,
}

impl DosDateTime {
    pub fn from_datetime(t: DateTime<Local>) -> Self {
        let time = (t.second() >> 1) | (t.minute() << 5) | (t.hour() << 11);
        let date = t.day() | (t.month() << 5) | (((t.year() - 1980) as u32 & 0x7F) << 9);
        Self {
            time: time as u16,
            date: date as u16,
        }
    }

    pub fn from_system_time(t: std::time::SystemTime) -> Self {
        Self::from_datetime(DateTime::<Local>::from(t))
    }

    pub fn now() -> Self {
        Self::from_datetime(Local::now())
    }

    /// Unpack the date to (year, month, day)
    pub fn ymd(&self) -> (u16, u8, u8) {
        let day = (self.date & 0x1F) as u8;
        let month = ((self.date >> 5) & 0x0F) as u8;
        let year = ((self.date >> 9) & 0x7F) + 1980;
        (year, month, day)
    }

    /// Unpack the time to (hour, minute, second)
    pub fn hms(&self) -> (u8, u8, u8) {
        let second = ((self.time & 0x1F) * 2) as u8;
        let minute = ((self.time >> 5) & 0x3F) as u8;
        let hour = ((self.time >> 11) & 0x1F) as u8;
        (hour, minute, second)
    }
}

/// Local File Header (LFH) - 30 bytes before the name
///
/// Emitted before each entry's payload. Because the sink cannot seek,
/// CRC and both sizes are always written as zero here; the real values
/// follow the payload in a [`DataDescriptor`].
pub struct LocalFileHeader<'a> {
    pub method: CompressionMethod,
    pub timestamp: DosDateTime,
    pub name: &'a [u8],
}

impl LocalFileHeader<'_> {
    pub const SIGNATURE: &'static [u8] = b"PK\x03\x04";

    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        out.write_all(Self::SIGNATURE)?;
        out.write_u16::<LittleEndian>(self.method.version_needed())?;
        out.write_u16::<LittleEndian>(FLAG_DATA_DESCRIPTOR)?;
        out.write_u16::<LittleEndian>(self.method.as_u16())?;
        out.write_u16::<LittleEndian>(self.timestamp.time)?;
        out.write_u16::<LittleEndian>(self.timestamp.date)?;
        out.write_u32::<LittleEndian>(0)?; // CRC-32, deferred
        out.write_u32::<LittleEndian>(0)?; // compressed size, deferred
        out.write_u32::<LittleEndian>(0)?; // uncompressed size, deferred
        out.write_u16::<LittleEndian>(self.name.len() as u16)?;
        out.write_u16::<LittleEndian>(0)?; // extra field length
        out.write_all(self.name)?;
        Ok(())
    }
}

/// Data descriptor - 16 bytes
///
/// Trails every entry's payload, carrying the values the local header
/// had to leave zeroed.
pub struct DataDescriptor {
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
}

impl DataDescriptor {
    pub const SIGNATURE: &'static [u8] = b"PK\x07\x08";

    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        out.write_all(Self::SIGNATURE)?;
        out.write_u32::<LittleEndian>(self.crc32)?;
        out.write_u32::<LittleEndian>(self.compressed_size)?;
        out.write_u32::<LittleEndian>(self.uncompressed_size)?;
        Ok(())
    }
}

/// Central Directory File Header (CDFH) - 46 bytes before the name
///
/// One per entry, written at the end of the archive. Self-contained: a
/// reader never has to revisit the local headers, so the name bytes are
/// repeated here and the real CRC/sizes appear even though the local
/// header zeroed them.
pub struct CentralDirectoryHeader<'a> {
    pub method: CompressionMethod,
    pub timestamp: DosDateTime,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub external_attributes: u32,
    pub local_header_offset: u32,
    pub name: &'a [u8],
}

impl CentralDirectoryHeader<'_> {
    pub const SIGNATURE: &'static [u8] = b"PK\x01\x02";

    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        out.write_all(Self::SIGNATURE)?;
        out.write_u16::<LittleEndian>(VERSION_MADE_BY)?;
        out.write_u16::<LittleEndian>(self.method.version_needed())?;
        out.write_u16::<LittleEndian>(FLAG_DATA_DESCRIPTOR)?;
        out.write_u16::<LittleEndian>(self.method.as_u16())?;
        out.write_u16::<LittleEndian>(self.timestamp.time)?;
        out.write_u16::<LittleEndian>(self.timestamp.date)?;
        out.write_u32::<LittleEndian>(self.crc32)?;
        out.write_u32::<LittleEndian>(self.compressed_size)?;
        out.write_u32::<LittleEndian>(self.uncompressed_size)?;
        out.write_u16::<LittleEndian>(self.name.len() as u16)?;
        out.write_u16::<LittleEndian>(0)?; // extra field length
        out.write_u16::<LittleEndian>(0)?; // comment length
        out.write_u16::<LittleEndian>(0)?; // disk number start
        out.write_u16::<LittleEndian>(0)?; // internal attributes
        out.write_u32::<LittleEndian>(self.external_attributes)?;
        out.write_u32::<LittleEndian>(self.local_header_offset)?;
        out.write_all(self.name)?;
        Ok(())
    }
}

/// End of Central Directory (EOCD) - 22 bytes
pub struct EndOfCentralDirectory {
    pub entry_count: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
}

impl EndOfCentralDirectory {
    pub const SIGNATURE: &'static [u8] = b"PK\x05\x06";

    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        out.write_all(Self::SIGNATURE)?;
        out.write_u16::<LittleEndian>(0)?; // this disk
        out.write_u16::<LittleEndian>(0)?; // disk with central directory
        out.write_u16::<LittleEndian>(self.entry_count)?; // entries on this disk
        out.write_u16::<LittleEndian>(self.entry_count)?; // entries total
        out.write_u32::<LittleEndian>(self.cd_size)?;
        out.write_u32::<LittleEndian>(self.cd_offset)?;
        out.write_u16::<LittleEndian>(0)?; // comment length
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn dos_datetime_packs_and_unpacks() {
        let t = Local.with_ymd_and_hms(2024, 6, 15, 13, 37, 58).unwrap();
        let dos = DosDateTime::from_datetime(t);
        assert_eq!(dos.ymd(), (2024, 6, 15));
        // DOS time has 2-second resolution
        assert_eq!(dos.hms(), (13, 37, 58));
    }

    #[test]
    fn dos_datetime_epoch_year() {
        let t = Local.with_ymd_and_hms(1980, 1, 1, 0, 0, 0).unwrap();
        let dos = DosDateTime::from_datetime(t);
        assert_eq!(dos.date, 0x0021); // day 1, month 1, year offset 0
        assert_eq!(dos.time, 0);
    }

    #[test]
    fn local_header_layout() {
        let hdr = LocalFileHeader {
            method: CompressionMethod::Deflate,
            timestamp: DosDateTime { time: 0x6DBD, date: 0x58CF },
            name: b"dir/file1",
        };
        let mut buf = Vec::new();
        hdr.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), 30 + 9);
        assert_eq!(&buf[0..4], b"PK\x03\x04");
        assert_eq!(&buf[4..6], &0x0014u16.to_le_bytes()); // version needed
        assert_eq!(&buf[6..8], &0x0008u16.to_le_bytes()); // descriptor flag
        assert_eq!(&buf[8..10], &8u16.to_le_bytes()); // deflate
        assert_eq!(&buf[14..26], &[0u8; 12]); // crc + both sizes zeroed
        assert_eq!(&buf[26..28], &9u16.to_le_bytes()); // name length
        assert_eq!(&buf[30..], b"dir/file1");
    }

    #[test]
    fn central_header_layout() {
        let hdr = CentralDirectoryHeader {
            method: CompressionMethod::Stored,
            timestamp: DosDateTime { time: 0, date: 0x0021 },
            crc32: 0xDEAD_BEEF,
            compressed_size: 2,
            uncompressed_size: 2,
            external_attributes: EXTERNAL_ATTR_DIR,
            local_header_offset: 0x1234,
            name: b"dir/",
        };
        let mut buf = Vec::new();
        hdr.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), 46 + 4);
        assert_eq!(&buf[0..4], b"PK\x01\x02");
        assert_eq!(&buf[4..6], &VERSION_MADE_BY.to_le_bytes());
        assert_eq!(&buf[6..8], &0x000Au16.to_le_bytes()); // stored needs 1.0
        assert_eq!(&buf[16..20], &0xDEAD_BEEFu32.to_le_bytes());
        assert_eq!(&buf[38..42], &EXTERNAL_ATTR_DIR.to_le_bytes());
        assert_eq!(&buf[42..46], &0x1234u32.to_le_bytes());
        assert_eq!(&buf[46..], b"dir/");
    }

    #[test]
    fn end_record_layout() {
        let eocd = EndOfCentralDirectory {
            entry_count: 2,
            cd_size: 108,
            cd_offset: 0x55,
        };
        let mut buf = Vec::new();
        eocd.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), 22);
        assert_eq!(&buf[0..4], b"PK\x05\x06");
        assert_eq!(&buf[8..10], &2u16.to_le_bytes());
        assert_eq!(&buf[10..12], &2u16.to_le_bytes());
        assert_eq!(&buf[12..16], &108u32.to_le_bytes());
        assert_eq!(&buf[16..20], &0x55u32.to_le_bytes());
        assert_eq!(&buf[20..22], &[0, 0]);
    }
}
