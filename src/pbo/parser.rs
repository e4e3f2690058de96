//! Low-level PBO archive parser.
//!
//! This module decodes the archive layout from any source that implements
//! [`Read`] + [`Seek`]: the signature byte, the optional product header, the
//! entry table and the trailing checksum.
//!
//! ## Parsing Strategy
//!
//! PBO archives are read front to back:
//! 1. Check the signature byte
//! 2. Peek for the product marker; read the header block if present
//! 3. Read entry records until the empty-name terminator
//! 4. The data region starts right after the terminator
//! 5. Jump past all payloads to read the checksum, then come back
//!
//! Payloads themselves are not touched here.

use std::io::{Read, Seek, SeekFrom};

use super::error::{PboError, PboResult};
use super::primitives::{peek, read_cstring, read_record, read_u8};
use super::structures::*;

/// Everything the parser learns about an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveLayout {
    pub product: ProductEntry,
    /// Entries in table order, terminator excluded
    pub entries: Vec<FileEntry>,
    /// Offset of the first payload byte
    pub data_start: u64,
    pub checksum: [u8; CHECKSUM_LEN],
}

impl ArchiveLayout {
    /// Total size of the data region.
    pub fn data_len(&self) -> u64 {
        data_region_len(&self.entries)
    }

    /// Offset of the byte right after the last payload.
    pub fn data_end(&self) -> u64 {
        self.data_start + self.data_len()
    }
}

/// Sum of all payload sizes.
fn data_region_len(entries: &[FileEntry]) -> u64 {
    entries.iter().map(|e| u64::from(e.data_size)).sum()
}

/// Low-level PBO parser.
///
/// Typically used through [`Archive`](super::Archive) rather than directly.
///
/// ## Example
///
/// ```ignore
/// let mut parser = PboParser::new(BufReader::new(File::open(path)?));
/// let layout = parser.parse()?;
/// for entry in &layout.entries {
///     println!("{}", entry.file_name);
/// }
/// ```
pub struct PboParser<R: Read + Seek> {
    /// The underlying data source
    reader: R,
}

impl<R: Read + Seek> PboParser<R> {
    /// Create a new parser for the given reader.
    ///
    /// The reader must be positioned at the start of the archive.
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Parse the complete archive layout.
    ///
    /// On success the reader is left positioned at the start of the data
    /// region.
    ///
    /// # Errors
    ///
    /// * [`PboError::NotAnArchive`] if the signature byte is not `0x00`
    /// * [`PboError::Malformed`] if the stream ends inside any structure
    pub fn parse(&mut self) -> PboResult<ArchiveLayout> {
        self.read_signature()?;
        let product = self.read_product()?;
        let entries = self.read_entries()?;

        let data_start = self.reader.stream_position()?;
        let checksum = self.read_checksum(data_start, data_region_len(&entries))?;

        Ok(ArchiveLayout {
            product,
            entries,
            data_start,
            checksum,
        })
    }

    fn read_signature(&mut self) -> PboResult<()> {
        let sig = read_u8(&mut self.reader)?;
        if sig != SIGNATURE {
            return Err(PboError::NotAnArchive(sig));
        }
        Ok(())
    }

    /// Read the optional product header and the table-start byte.
    ///
    /// Two layouts follow the signature byte:
    ///
    /// * no header: the table-start `0x00` comes next
    /// * `"sreV\0"`, 15 reserved bytes, then up to three required strings
    ///   (prefix, name, version) and any number of extra strings
    ///
    /// In the second case the header strings run until an empty string, and
    /// the `0x00` of that empty string is the table-start byte. A missing
    /// prefix, name or version ends the header early the same way, leaving
    /// the later fields empty.
    pub fn read_product(&mut self) -> PboResult<ProductEntry> {
        let marker_len = PRODUCT_MARKER.len() + 1;
        let probe = peek(&mut self.reader, marker_len)?;
        let has_header = probe.len() == marker_len
            && &probe[..PRODUCT_MARKER.len()] == PRODUCT_MARKER.as_bytes()
            && probe[PRODUCT_MARKER.len()] == 0;

        if !has_header {
            let start = read_u8(&mut self.reader)?;
            if start != TABLE_START {
                return Err(PboError::Malformed(format!(
                    "expected table start byte, found {start:#04x}"
                )));
            }
            return Ok(ProductEntry::default());
        }

        self.reader
            .seek(SeekFrom::Current((marker_len + PRODUCT_RESERVED_LEN) as i64))?;

        let mut fields = Vec::new();
        loop {
            let s = read_cstring(&mut self.reader)?;
            if s.is_empty() {
                break;
            }
            fields.push(s);
        }

        let mut fields = fields.into_iter();
        Ok(ProductEntry {
            prefix: fields.next().unwrap_or_default(),
            product_name: fields.next().unwrap_or_default(),
            product_version: fields.next().unwrap_or_default(),
            additional: fields.collect(),
        })
    }

    /// Read entry records up to and including the terminator.
    ///
    /// The terminator itself is not returned.
    pub fn read_entries(&mut self) -> PboResult<Vec<FileEntry>> {
        let mut entries = Vec::new();
        loop {
            match read_record(&mut self.reader)? {
                TableRecord::Entry(entry) => entries.push(entry),
                TableRecord::EndOfTable => break,
            }
        }
        Ok(entries)
    }

    /// Read the stored digest and return to the start of the data region.
    ///
    /// The digest sits after all payloads and one `0x00` marker byte.
    fn read_checksum(&mut self, data_start: u64, data_len: u64) -> PboResult<[u8; CHECKSUM_LEN]> {
        self.reader
            .seek(SeekFrom::Start(data_start + data_len + 1))?;
        let mut checksum = [0u8; CHECKSUM_LEN];
        self.reader
            .read_exact(&mut checksum)
            .map_err(PboError::from_parse_io)?;
        self.reader.seek(SeekFrom::Start(data_start))?;
        Ok(checksum)
    }

    /// Get the underlying reader back.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pbo::primitives::{write_cstring, write_record};
    use std::io::Cursor;

    fn archive_bytes(header: &[u8], entries: &[FileEntry], payload: &[u8]) -> Vec<u8> {
        let mut buf = vec![SIGNATURE];
        buf.extend_from_slice(header);
        for e in entries {
            write_record(&mut buf, &TableRecord::Entry(e.clone())).unwrap();
        }
        write_record(&mut buf, &TableRecord::EndOfTable).unwrap();
        buf.extend_from_slice(payload);
        buf.push(CHECKSUM_MARKER);
        buf.extend_from_slice(&[0xAB; CHECKSUM_LEN]);
        buf
    }

    fn header(fields: &[&str]) -> Vec<u8> {
        let mut buf = Vec::new();
        write_cstring(&mut buf, PRODUCT_MARKER).unwrap();
        buf.extend_from_slice(&[0u8; PRODUCT_RESERVED_LEN]);
        for f in fields {
            write_cstring(&mut buf, f).unwrap();
        }
        buf.push(TABLE_START);
        buf
    }

    fn parse(bytes: Vec<u8>) -> PboResult<ArchiveLayout> {
        PboParser::new(Cursor::new(bytes)).parse()
    }

    #[test]
    fn empty_table_parses_to_no_entries() {
        let layout = parse(archive_bytes(&[TABLE_START], &[], &[])).unwrap();
        assert!(layout.entries.is_empty());
        assert!(layout.product.is_empty());
        // signature + table start + terminator
        assert_eq!(layout.data_start, 1 + 1 + 21);
        assert_eq!(layout.checksum, [0xAB; CHECKSUM_LEN]);
    }

    #[test]
    fn full_header_with_extras() {
        let entries = [FileEntry::uncompressed("a.txt", 3, 10)];
        let bytes = archive_bytes(&header(&["pre", "name", "1.0", "x", "y"]), &entries, b"abc");
        let layout = parse(bytes).unwrap();
        assert_eq!(
            layout.product,
            ProductEntry::new("pre", "name", "1.0", vec!["x".into(), "y".into()])
        );
        assert_eq!(layout.entries, entries);
    }

    #[test]
    fn header_stops_at_missing_name() {
        let entries = [FileEntry::uncompressed("b", 1, 0)];
        let layout = parse(archive_bytes(&header(&["pre"]), &entries, b"z")).unwrap();
        assert_eq!(layout.product.prefix, "pre");
        assert!(layout.product.product_name.is_empty());
        assert!(layout.product.product_version.is_empty());
        assert!(layout.product.additional.is_empty());
        assert_eq!(layout.entries, entries);
    }

    #[test]
    fn marker_with_empty_prefix() {
        let entries = [FileEntry::uncompressed("c", 0, 0)];
        let layout = parse(archive_bytes(&header(&[]), &entries, b"")).unwrap();
        assert!(layout.product.is_empty());
        assert_eq!(layout.entries, entries);
    }

    #[test]
    fn bad_signature() {
        let mut bytes = archive_bytes(&[TABLE_START], &[], &[]);
        bytes[0] = 0x50;
        assert!(matches!(parse(bytes), Err(PboError::NotAnArchive(0x50))));
    }

    #[test]
    fn missing_table_start_is_malformed() {
        let bytes = vec![SIGNATURE, b'x', b'\0'];
        assert!(matches!(parse(bytes), Err(PboError::Malformed(_))));
    }

    #[test]
    fn truncated_table_is_malformed() {
        let mut bytes = archive_bytes(&[TABLE_START], &[FileEntry::uncompressed("a", 1, 1)], b"q");
        bytes.truncate(10);
        assert!(matches!(parse(bytes), Err(PboError::Malformed(_))));
    }

    #[test]
    fn truncated_checksum_is_malformed() {
        let mut bytes = archive_bytes(&[TABLE_START], &[FileEntry::uncompressed("a", 4, 1)], b"qqqq");
        bytes.truncate(bytes.len() - 5);
        assert!(matches!(parse(bytes), Err(PboError::Malformed(_))));
    }

    #[test]
    fn reader_is_left_at_data_start() {
        let bytes = archive_bytes(&[TABLE_START], &[FileEntry::uncompressed("a", 2, 1)], b"hi");
        let mut parser = PboParser::new(Cursor::new(bytes));
        let layout = parser.parse().unwrap();
        let mut cur = parser.into_inner();
        assert_eq!(cur.position(), layout.data_start);
        let mut payload = [0u8; 2];
        cur.read_exact(&mut payload).unwrap();
        assert_eq!(&payload, b"hi");
        assert_eq!(layout.data_end(), layout.data_start + 2);
    }
}
