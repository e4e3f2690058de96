//! Fixed-width integer and null-terminated string codecs, plus the entry
//! record encoding built from them.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Seek, SeekFrom, Write};

use super::error::{PboError, PboResult};
use super::structures::{FileEntry, PackingMethod, TableRecord};

pub fn write_cstring<W: Write + ?Sized>(w: &mut W, s: &str) -> io::Result<()> {
    if s.as_bytes().contains(&0) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("string contains a NUL byte: {s:?}"),
        ));
    }
    w.write_all(s.as_bytes())?;
    w.write_u8(0)
}

/// Read bytes up to (not including) the next `0x00`.
pub fn read_cstring<R: Read + ?Sized>(r: &mut R) -> PboResult<String> {
    let mut bytes = Vec::new();
    loop {
        match r.read_u8().map_err(PboError::from_parse_io)? {
            0 => break,
            b => bytes.push(b),
        }
    }
    // Use lossy conversion to handle non-UTF8 names gracefully
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

pub fn write_u32<W: Write + ?Sized>(w: &mut W, v: u32) -> io::Result<()> {
    w.write_u32::<LittleEndian>(v)
}

pub fn read_u32<R: Read + ?Sized>(r: &mut R) -> PboResult<u32> {
    r.read_u32::<LittleEndian>().map_err(PboError::from_parse_io)
}

pub fn read_u8<R: Read + ?Sized>(r: &mut R) -> PboResult<u8> {
    r.read_u8().map_err(PboError::from_parse_io)
}

/// Narrow a size or timestamp to the on-disk field width.
pub fn to_u32(value: u64, what: &'static str) -> PboResult<u32> {
    u32::try_from(value).map_err(|_| PboError::CapacityExceeded { what, value })
}

/// Read up to `n` bytes without moving the cursor.
///
/// Fewer than `n` bytes come back when the stream ends first.
pub fn peek<R: Read + Seek + ?Sized>(r: &mut R, n: usize) -> io::Result<Vec<u8>> {
    let start = r.stream_position()?;
    let mut buf = Vec::with_capacity(n);
    (&mut *r).take(n as u64).read_to_end(&mut buf)?;
    r.seek(SeekFrom::Start(start))?;
    Ok(buf)
}

/// Encode one entry-table record.
///
/// `EndOfTable` becomes the empty-name, all-zero entry.
pub fn write_record<W: Write + ?Sized>(w: &mut W, record: &TableRecord) -> io::Result<()> {
    let terminator = FileEntry::default();
    let entry = match record {
        TableRecord::Entry(entry) => entry,
        TableRecord::EndOfTable => &terminator,
    };
    write_cstring(w, &entry.file_name)?;
    write_u32(w, entry.packing_method.as_u32())?;
    write_u32(w, entry.original_size)?;
    write_u32(w, entry.reserved)?;
    write_u32(w, entry.timestamp)?;
    write_u32(w, entry.data_size)
}

/// Decode one entry-table record. An empty name ends the table.
pub fn read_record<R: Read + ?Sized>(r: &mut R) -> PboResult<TableRecord> {
    let file_name = read_cstring(r)?;
    let packing_method = PackingMethod::from_u32(read_u32(r)?);
    let original_size = read_u32(r)?;
    let reserved = read_u32(r)?;
    let timestamp = read_u32(r)?;
    let data_size = read_u32(r)?;

    if file_name.is_empty() {
        return Ok(TableRecord::EndOfTable);
    }

    Ok(TableRecord::Entry(FileEntry {
        file_name,
        packing_method,
        original_size,
        reserved,
        timestamp,
        data_size,
    }))
}

pub fn hex(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes.iter().copied() {
        out.push(HEX[(b >> 4) as usize] as char);
        out.push(HEX[(b & 0xF) as usize] as char);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn cstring_is_null_terminated_without_length_prefix() {
        let mut buf = Vec::new();
        write_cstring(&mut buf, "data\\a.txt").unwrap();
        assert_eq!(buf, b"data\\a.txt\0");

        let mut cur = Cursor::new(b"first\0second\0".to_vec());
        assert_eq!(read_cstring(&mut cur).unwrap(), "first");
        assert_eq!(read_cstring(&mut cur).unwrap(), "second");
    }

    #[test]
    fn cstring_without_terminator_is_malformed() {
        let mut cur = Cursor::new(b"abc".to_vec());
        assert!(matches!(read_cstring(&mut cur), Err(PboError::Malformed(_))));
    }

    #[test]
    fn cstring_rejects_embedded_nul() {
        let mut buf = Vec::new();
        assert!(write_cstring(&mut buf, "a\0b").is_err());
    }

    #[test]
    fn u32_is_little_endian() {
        let mut buf = Vec::new();
        write_u32(&mut buf, 0x0102_0304).unwrap();
        assert_eq!(buf, [4, 3, 2, 1]);
        assert_eq!(read_u32(&mut Cursor::new(buf)).unwrap(), 0x0102_0304);
        assert!(matches!(
            read_u32(&mut Cursor::new(vec![1, 2])),
            Err(PboError::Malformed(_))
        ));
    }

    #[test]
    fn narrowing_reports_capacity() {
        assert_eq!(to_u32(5, "size").unwrap(), 5);
        match to_u32(u64::from(u32::MAX) + 1, "size") {
            Err(PboError::CapacityExceeded { what, value }) => {
                assert_eq!(what, "size");
                assert_eq!(value, 1 << 32);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn peek_leaves_cursor_in_place() {
        let mut cur = Cursor::new(b"sreV\0rest".to_vec());
        cur.set_position(1);
        assert_eq!(peek(&mut cur, 3).unwrap(), b"reV");
        assert_eq!(cur.position(), 1);
        assert_eq!(peek(&mut cur, 100).unwrap(), b"reV\0rest");
    }

    #[test]
    fn terminator_record_is_twenty_one_zero_bytes() {
        let mut buf = Vec::new();
        write_record(&mut buf, &TableRecord::EndOfTable).unwrap();
        assert_eq!(buf, vec![0u8; 21]);
        assert_eq!(
            read_record(&mut Cursor::new(buf)).unwrap(),
            TableRecord::EndOfTable
        );
    }

    #[test]
    fn entry_record_layout() {
        let entry = FileEntry::new("a", PackingMethod::Packed, 9, 77, 5);
        let mut buf = Vec::new();
        write_record(&mut buf, &TableRecord::Entry(entry.clone())).unwrap();
        let mut expected = b"a\0".to_vec();
        for v in [0x4370_7273u32, 9, 0, 77, 5] {
            expected.extend_from_slice(&v.to_le_bytes());
        }
        assert_eq!(buf, expected);
        assert_eq!(
            read_record(&mut Cursor::new(buf)).unwrap(),
            TableRecord::Entry(entry)
        );
    }

    #[test]
    fn hex_is_lowercase() {
        assert_eq!(hex(&[0x00, 0xab, 0x7f]), "00ab7f");
    }
}
