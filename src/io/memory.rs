use super::ReadAt;
use std::io;

/// In-memory copy of a contiguous region of an archive.
///
/// `base` is the archive offset of the first byte held, so callers keep using
/// absolute offsets. Offsets before `base` are rejected.
pub struct MemoryReader {
    base: u64,
    data: Vec<u8>,
}

impl MemoryReader {
    pub fn new(base: u64, data: Vec<u8>) -> Self {
        Self { base, data }
    }
}

impl ReadAt for MemoryReader {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let rel = offset.checked_sub(self.base).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("offset {offset} precedes preloaded region at {}", self.base),
            )
        })?;
        if rel >= self.data.len() as u64 {
            return Ok(0);
        }
        let start = rel as usize;
        let n = buf.len().min(self.data.len() - start);
        buf[..n].copy_from_slice(&self.data[start..start + n]);
        Ok(n)
    }

    fn size(&self) -> u64 {
        self.base + self.data.len() as u64
    }
}
