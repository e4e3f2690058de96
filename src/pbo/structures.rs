/// Byte opening every archive.
pub const SIGNATURE: u8 = 0x00;

/// Byte separating the header block from the entry table.
pub const TABLE_START: u8 = 0x00;

/// Marker string (null-terminated on disk) announcing a product header.
pub const PRODUCT_MARKER: &str = "sreV";

/// Zero bytes between the product marker and the prefix string.
pub const PRODUCT_RESERVED_LEN: usize = 15;

/// Byte between the last payload and the stored digest.
pub const CHECKSUM_MARKER: u8 = 0x00;

/// SHA-1 digest length.
pub const CHECKSUM_LEN: usize = 20;

/// Chunk size used when streaming payloads in and out of an archive.
pub const COPY_CHUNK_SIZE: usize = 16 * 1024;

/// Packing methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PackingMethod {
    #[default]
    Uncompressed,
    Packed,
    Unknown(u32),
}

impl PackingMethod {
    /// `"Cprs"` read as a little-endian u32.
    pub const PACKED_MAGIC: u32 = 0x4370_7273;

    pub fn from_u32(value: u32) -> Self {
        match value {
            0 => PackingMethod::Uncompressed,
            Self::PACKED_MAGIC => PackingMethod::Packed,
            _ => PackingMethod::Unknown(value),
        }
    }

    pub fn as_u32(&self) -> u32 {
        match self {
            PackingMethod::Uncompressed => 0,
            PackingMethod::Packed => Self::PACKED_MAGIC,
            PackingMethod::Unknown(v) => *v,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PackingMethod::Uncompressed => "stored",
            PackingMethod::Packed => "packed",
            PackingMethod::Unknown(_) => "unknown",
        }
    }
}

/// One archive member as recorded in the entry table
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FileEntry {
    /// Relative path as stored, separators untouched
    pub file_name: String,
    pub packing_method: PackingMethod,
    /// Size before packing
    pub original_size: u32,
    /// Written as zero, kept as read
    pub reserved: u32,
    /// Seconds since the Unix epoch, UTC
    pub timestamp: u32,
    /// Bytes occupied in the data region
    pub data_size: u32,
}

impl FileEntry {
    pub fn new(
        file_name: impl Into<String>,
        packing_method: PackingMethod,
        original_size: u32,
        timestamp: u32,
        data_size: u32,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            packing_method,
            original_size,
            reserved: 0,
            timestamp,
            data_size,
        }
    }

    /// An uncompressed entry whose logical and stored sizes are both `size`.
    pub fn uncompressed(file_name: impl Into<String>, size: u32, timestamp: u32) -> Self {
        Self::new(file_name, PackingMethod::Uncompressed, size, timestamp, size)
    }

    /// Parse the timestamp to (year, month, day), UTC
    pub fn modified_date(&self) -> (i64, u8, u8) {
        civil_from_days(i64::from(self.timestamp / 86_400))
    }

    /// Parse the timestamp to (hour, minute, second), UTC
    pub fn modified_time(&self) -> (u8, u8, u8) {
        let secs = self.timestamp % 86_400;
        ((secs / 3600) as u8, (secs / 60 % 60) as u8, (secs % 60) as u8)
    }
}

// Days since 1970-01-01 to a proleptic Gregorian date, using Howard Hinnant's
// `civil_from_days` (eras of 400 years, March-based years).
fn civil_from_days(days: i64) -> (i64, u8, u8) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u8;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u8;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

/// Archive-level metadata stored in the optional header block
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProductEntry {
    pub prefix: String,
    pub product_name: String,
    pub product_version: String,
    pub additional: Vec<String>,
}

impl ProductEntry {
    pub fn new(
        prefix: impl Into<String>,
        product_name: impl Into<String>,
        product_version: impl Into<String>,
        additional: Vec<String>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            product_name: product_name.into(),
            product_version: product_version.into(),
            additional,
        }
    }

    /// A header block is only written when all three required fields are set.
    pub fn is_complete(&self) -> bool {
        !self.prefix.is_empty() && !self.product_name.is_empty() && !self.product_version.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.prefix.is_empty()
            && self.product_name.is_empty()
            && self.product_version.is_empty()
            && self.additional.is_empty()
    }
}

/// One record of the entry table.
///
/// On disk the end of the table is an entry with an empty name and all fields
/// zero; in memory it is its own variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableRecord {
    Entry(FileEntry),
    EndOfTable,
}
