use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PboError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("archive not found: {}", .0.display())]
    ArchiveNotFound(PathBuf),

    #[error("not a pbo archive: signature byte is {0:#04x}")]
    NotAnArchive(u8),

    #[error("malformed archive: {0}")]
    Malformed(String),

    #[error("truncated payload for {name}: expected {expected} bytes, got {actual}")]
    TruncatedPayload {
        name: String,
        expected: u64,
        actual: u64,
    },

    #[error("entry is not part of this archive: {0}")]
    UnknownEntry(String),

    #[error("{what} does not fit in 32 bits: {value}")]
    CapacityExceeded { what: &'static str, value: u64 },

    #[error("checksum mismatch: stored {stored}, computed {computed}")]
    ChecksumMismatch { stored: String, computed: String },

    #[error("unsupported packing method {magic:#010x} for {name}")]
    UnsupportedPacking { name: String, magic: u32 },

    #[error("entry path escapes the output directory: {0}")]
    UnsafePath(String),

    #[error("size mismatch for {name}: entry records {expected} bytes, source has {actual}")]
    SizeMismatch {
        name: String,
        expected: u64,
        actual: u64,
    },
}

pub type PboResult<T> = Result<T, PboError>;

impl PboError {
    /// Map an I/O failure hit while decoding archive structure.
    ///
    /// Running out of bytes means the archive is cut short, anything else is
    /// a genuine I/O error.
    pub(crate) fn from_parse_io(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            PboError::Malformed("unexpected end of archive".into())
        } else {
            PboError::Io(err)
        }
    }
}
