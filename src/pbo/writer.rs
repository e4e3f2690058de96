//! Archive creation.
//!
//! Layout written, in order:
//! - signature `0x00`
//! - product header, only when prefix, name and version are all set:
//!   `"sreV\0"`, 15 zero bytes, the three strings, any extra strings
//! - table start `0x00`
//! - one record per entry, then the all-zero terminator record
//! - every payload back to back, in entry order
//! - `0x00`, then the SHA-1 of everything before it

use byteorder::WriteBytesExt;
use sha1::{Digest, Sha1};
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use walkdir::WalkDir;

use super::error::{PboError, PboResult};
use super::path::entry_name;
use super::primitives::{to_u32, write_cstring, write_record};
use super::structures::*;

/// Builds an archive from entries paired with the files holding their payloads.
#[derive(Debug, Clone, Default)]
pub struct PboWriter {
    product: ProductEntry,
    files: Vec<(FileEntry, PathBuf)>,
    checksum: Option<[u8; CHECKSUM_LEN]>,
}

impl PboWriter {
    pub fn new(product: ProductEntry) -> Self {
        Self {
            product,
            files: Vec::new(),
            checksum: None,
        }
    }

    /// Collect every regular file under `root`, sorted by path.
    ///
    /// Each entry is stored uncompressed, sized from the file on disk and
    /// stamped with the current time.
    pub fn from_directory(root: &Path, product: ProductEntry) -> PboResult<Self> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let timestamp = to_u32(now, "timestamp")?;

        let mut writer = Self::new(product);
        for ent in WalkDir::new(root).follow_links(false).sort_by_file_name() {
            let ent = ent.map_err(|e| {
                let msg = e.to_string();
                PboError::Io(e.into_io_error().unwrap_or_else(|| io::Error::other(msg)))
            })?;
            if !ent.file_type().is_file() {
                continue;
            }

            let name = entry_name(root, ent.path())?;
            let size = to_u32(ent.metadata().map_err(io::Error::from)?.len(), "file size")?;
            writer.push(FileEntry::uncompressed(name, size, timestamp), ent.path());
        }
        Ok(writer)
    }

    /// Append an entry whose payload is read from `source`.
    pub fn push(&mut self, entry: FileEntry, source: impl Into<PathBuf>) -> &mut Self {
        self.files.push((entry, source.into()));
        self
    }

    /// Write `checksum` instead of hashing the output.
    pub fn with_checksum(mut self, checksum: [u8; CHECKSUM_LEN]) -> Self {
        self.checksum = Some(checksum);
        self
    }

    pub fn entries(&self) -> impl Iterator<Item = &FileEntry> {
        self.files.iter().map(|(e, _)| e)
    }

    /// Write the archive to `output`, creating parent directories.
    ///
    /// On failure the partially written file is removed.
    pub fn write(&self, output: &Path) -> PboResult<()> {
        if let Some(parent) = output.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let file = File::create(output)?;
        let result = self.write_to(BufWriter::new(file)).and_then(|w| {
            w.into_inner().map_err(|e| PboError::Io(e.into_error()))?;
            Ok(())
        });

        if result.is_err() {
            let _ = fs::remove_file(output);
        }
        result
    }

    /// Write the archive to any sink and hand the sink back.
    pub fn write_to<W: Write>(&self, out: W) -> PboResult<W> {
        for (entry, _) in &self.files {
            if entry.file_name.is_empty() {
                return Err(invalid_input("entry with an empty name").into());
            }
        }

        let mut out = HashingWriter::new(out, self.checksum.is_none());

        out.write_u8(SIGNATURE)?;
        write_product(&mut out, &self.product)?;
        out.write_u8(TABLE_START)?;

        for (entry, _) in &self.files {
            write_record(&mut out, &TableRecord::Entry(entry.clone()))?;
        }
        write_record(&mut out, &TableRecord::EndOfTable)?;

        for (entry, source) in &self.files {
            copy_source(entry, source, &mut out)?;
        }

        let (mut inner, digest) = out.finish();
        let checksum = match (self.checksum, digest) {
            (Some(supplied), _) => supplied,
            (None, Some(computed)) => computed,
            (None, None) => unreachable!("hashing is enabled when no checksum is supplied"),
        };
        inner.write_all(&[CHECKSUM_MARKER])?;
        inner.write_all(&checksum)?;
        inner.flush()?;
        Ok(inner)
    }
}

/// Pack every file under `directory` into a new archive at `output`.
///
/// Failures are reported on stderr and turned into `false`; use [`PboWriter`]
/// or [`clone_archive`] to see the error itself.
pub fn create(directory: &Path, output: &Path, product: &ProductEntry) -> bool {
    let result =
        PboWriter::from_directory(directory, product.clone()).and_then(|w| w.write(output));
    match result {
        Ok(()) => true,
        Err(e) => {
            eprintln!("rpbo: failed to create {}: {e}", output.display());
            false
        }
    }
}

/// Write an archive from explicit entries, keeping their recorded metadata.
///
/// Entries are written in the given order. A supplied checksum is stored as
/// is instead of hashing the output.
pub fn clone_archive(
    output: &Path,
    product: &ProductEntry,
    files: Vec<(FileEntry, PathBuf)>,
    checksum: Option<[u8; CHECKSUM_LEN]>,
) -> PboResult<()> {
    let writer = PboWriter {
        product: product.clone(),
        files,
        checksum,
    };
    writer.write(output)
}

fn write_product<W: Write + ?Sized>(w: &mut W, product: &ProductEntry) -> io::Result<()> {
    if !product.is_complete() {
        return Ok(());
    }
    // An empty string would end the header early on read
    if product.additional.iter().any(|s| s.is_empty()) {
        return Err(invalid_input("empty extra product string"));
    }

    write_cstring(w, PRODUCT_MARKER)?;
    w.write_all(&[0u8; PRODUCT_RESERVED_LEN])?;
    write_cstring(w, &product.prefix)?;
    write_cstring(w, &product.product_name)?;
    write_cstring(w, &product.product_version)?;
    for s in &product.additional {
        write_cstring(w, s)?;
    }
    Ok(())
}

fn copy_source<W: Write + ?Sized>(entry: &FileEntry, source: &Path, out: &mut W) -> PboResult<()> {
    let mut file = File::open(source)?;
    let mut buf = vec![0u8; COPY_CHUNK_SIZE];
    let mut copied = 0u64;
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        out.write_all(&buf[..n])?;
        copied += n as u64;
    }

    if copied != u64::from(entry.data_size) {
        return Err(PboError::SizeMismatch {
            name: entry.file_name.clone(),
            expected: u64::from(entry.data_size),
            actual: copied,
        });
    }
    Ok(())
}

fn invalid_input(msg: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, msg.to_string())
}

/// Passes writes through, hashing them when enabled.
struct HashingWriter<W: Write> {
    inner: W,
    hasher: Option<Sha1>,
}

impl<W: Write> HashingWriter<W> {
    fn new(inner: W, hash: bool) -> Self {
        Self {
            inner,
            hasher: hash.then(Sha1::new),
        }
    }

    fn finish(self) -> (W, Option<[u8; CHECKSUM_LEN]>) {
        let digest = self.hasher.map(|h| {
            let mut out = [0u8; CHECKSUM_LEN];
            out.copy_from_slice(&h.finalize());
            out
        });
        (self.inner, digest)
    }
}

impl<W: Write> Write for HashingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        if let Some(h) = self.hasher.as_mut() {
            h.update(&buf[..n]);
        }
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
