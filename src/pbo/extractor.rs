use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::io::ReadAt;

use super::archive::Archive;
use super::error::{PboError, PboResult};
use super::path::host_path;
use super::structures::{COPY_CHUNK_SIZE, FileEntry, PackingMethod};

impl Archive {
    /// Extract an entry's payload to a new buffer.
    ///
    /// The buffer is owned by the caller; repeated calls never share state.
    pub fn extract_to_memory(&self, entry: &FileEntry) -> PboResult<Vec<u8>> {
        let index = self.index_of(entry)?;
        ensure_uncompressed(entry)?;

        let expected = u64::from(entry.data_size);
        let data = self
            .source()
            .read_range(self.offset_at(index), entry.data_size as usize)?;
        if (data.len() as u64) < expected {
            return Err(PboError::TruncatedPayload {
                name: entry.file_name.clone(),
                expected,
                actual: data.len() as u64,
            });
        }
        Ok(data)
    }

    /// Stream an entry's payload into `out` in bounded chunks.
    ///
    /// Returns the number of bytes written, always the entry's `data_size`.
    pub fn extract_to_writer<W: Write + ?Sized>(
        &self,
        entry: &FileEntry,
        out: &mut W,
    ) -> PboResult<u64> {
        let index = self.index_of(entry)?;
        ensure_uncompressed(entry)?;
        copy_payload(self.source(), entry, self.offset_at(index), out)
    }

    /// Extract an entry to `output_path`, creating parent directories.
    ///
    /// An existing file is overwritten.
    pub fn extract_to_file(&self, entry: &FileEntry, output_path: &Path) -> PboResult<()> {
        let index = self.index_of(entry)?;
        ensure_uncompressed(entry)?;
        write_entry_file(self.source(), entry, self.offset_at(index), output_path)
    }

    /// Extract every entry under `output_root`, in table order.
    ///
    /// Entry names are mapped to host paths first, so a name escaping the
    /// output root aborts before anything is written.
    pub fn extract_all(&self, output_root: &Path) -> PboResult<()> {
        let targets = self
            .entries()
            .iter()
            .map(|e| host_path(&e.file_name).map(|p| output_root.join(p)))
            .collect::<PboResult<Vec<PathBuf>>>()?;

        fs::create_dir_all(output_root)?;

        for (index, (entry, target)) in self.entries().iter().zip(&targets).enumerate() {
            ensure_uncompressed(entry)?;
            write_entry_file(self.source(), entry, self.offset_at(index), target)?;
        }
        Ok(())
    }
}

fn ensure_uncompressed(entry: &FileEntry) -> PboResult<()> {
    match entry.packing_method {
        PackingMethod::Uncompressed => Ok(()),
        other => Err(PboError::UnsupportedPacking {
            name: entry.file_name.clone(),
            magic: other.as_u32(),
        }),
    }
}

fn write_entry_file(
    source: &dyn ReadAt,
    entry: &FileEntry,
    offset: u64,
    output_path: &Path,
) -> PboResult<()> {
    // Create parent directories if needed
    if let Some(parent) = output_path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let mut file = fs::File::create(output_path)?;
    copy_payload(source, entry, offset, &mut file)?;
    file.flush()?;
    Ok(())
}

fn copy_payload<W: Write + ?Sized>(
    source: &dyn ReadAt,
    entry: &FileEntry,
    offset: u64,
    out: &mut W,
) -> PboResult<u64> {
    let total = u64::from(entry.data_size);
    let mut buf = vec![0u8; COPY_CHUNK_SIZE.min(entry.data_size as usize)];
    let mut copied = 0u64;

    while copied < total {
        let want = (total - copied).min(buf.len() as u64) as usize;
        let n = source.read_at(offset + copied, &mut buf[..want])?;
        if n == 0 {
            return Err(PboError::TruncatedPayload {
                name: entry.file_name.clone(),
                expected: total,
                actual: copied,
            });
        }
        out.write_all(&buf[..n])?;
        copied += n as u64;
    }

    Ok(copied)
}
