mod local;
mod memory;

pub use local::LocalFileReader;
pub use memory::MemoryReader;

use std::io;

/// Trait for random access reading from a data source
pub trait ReadAt: Send + Sync {
    /// Read data at the specified offset into the buffer
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize>;

    /// Get the total size of the data source
    fn size(&self) -> u64;

    /// Read up to `len` bytes starting at `offset` into a fresh buffer.
    ///
    /// The returned buffer is shorter than `len` only when the source ends first.
    fn read_range(&self, offset: u64, len: usize) -> io::Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        let mut filled = 0;
        while filled < len {
            let n = self.read_at(offset + filled as u64, &mut buf[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        buf.truncate(filled);
        Ok(buf)
    }
}

/// Backing store for an opened archive's payloads.
///
/// Streaming archives read straight from the file on disk, preloaded archives
/// serve every request from the data region copied into memory at open time.
/// Both are addressed with absolute archive offsets.
pub enum PayloadSource {
    File(LocalFileReader),
    Memory(MemoryReader),
}

impl PayloadSource {
    pub fn is_preloaded(&self) -> bool {
        matches!(self, PayloadSource::Memory(_))
    }
}

impl ReadAt for PayloadSource {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            PayloadSource::File(r) => r.read_at(offset, buf),
            PayloadSource::Memory(r) => r.read_at(offset, buf),
        }
    }

    fn size(&self) -> u64 {
        match self {
            PayloadSource::File(r) => r.size(),
            PayloadSource::Memory(r) => r.size(),
        }
    }
}
